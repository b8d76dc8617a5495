//! Payment request/response pairs for bank transfer and credit card flows.
//!
//! These are transient: they live for one page render and are never stored
//! in the session.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, PaymentId};
use super::status::{BankTransferStatus, CreditCardStatus};

/// Body for `POST /payment/bank-transfer/{orderId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransferRequest {
    pub bank_name: String,
    pub account_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub transfer_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_url: Option<String>,
}

/// Bank transfer record returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransferResponse {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub status: BankTransferStatus,
}

/// QR code for a bank transfer, as returned by
/// `GET /payment/bank-transfer/qr/{orderId}?amount=`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    /// Base64-encoded image, optionally already prefixed with a `data:` URI header.
    pub qr_code: String,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl QrCodeResponse {
    /// The base64 payload without any `data:` URI header.
    #[must_use]
    pub fn base64_payload(&self) -> &str {
        self.qr_code
            .split_once(";base64,")
            .map_or(self.qr_code.as_str(), |(_, payload)| payload)
    }
}

/// Body for `POST /payment/credit-card/{orderId}`.
///
/// `Debug` masks the card number and omits the CVV.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardRequest {
    pub card_number: String,
    pub card_holder_name: String,
    /// `MM/YY`.
    pub expiry_date: String,
    pub cvv: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl CreditCardRequest {
    /// Card number with all but the last four digits masked.
    #[must_use]
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let visible = digits.len().saturating_sub(4);
        digits
            .iter()
            .enumerate()
            .map(|(i, c)| if i < visible { '*' } else { *c })
            .collect()
    }
}

impl fmt::Debug for CreditCardRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCardRequest")
            .field("card_number", &self.masked_number())
            .field("card_holder_name", &self.card_holder_name)
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"[REDACTED]")
            .field("amount", &self.amount)
            .finish()
    }
}

/// Credit card payment record returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardResponse {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub status: CreditCardStatus,
}
