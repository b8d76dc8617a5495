//! Status enums mirrored from the backend.
//!
//! All statuses travel as lowercase strings on the wire.

use serde::{Deserialize, Serialize};

/// Implements `Display`, `FromStr` and `as_str()` for a lowercase wire enum.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

wire_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Whether the order can still move forward in its lifecycle.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    CreditCard,
    /// Cash on delivery.
    Cod,
}

wire_enum!(PaymentMethod {
    BankTransfer => "bank_transfer",
    CreditCard => "credit_card",
    Cod => "cod",
});

impl PaymentMethod {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BankTransfer => "Bank transfer",
            Self::CreditCard => "Credit card",
            Self::Cod => "Cash on delivery",
        }
    }
}

/// Bank transfer payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BankTransferStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

wire_enum!(BankTransferStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

/// Credit card payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreditCardStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Failed,
}

wire_enum!(CreditCardStatus {
    Pending => "pending",
    Processing => "processing",
    Paid => "paid",
    Failed => "failed",
});

/// User capability level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access to the dashboard and admin-only pages.
    Admin,
    /// Dashboard access without admin-only pages.
    #[default]
    User,
}

wire_enum!(UserRole {
    Admin => "admin",
    User => "user",
});
