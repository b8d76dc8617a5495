//! Order records as returned by the backend `/orders` endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CustomerId, OrderId, OrderItemId, ProductId};
use super::price::Money;
use super::status::{OrderStatus, PaymentMethod};

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    /// Denormalized customer name for list display.
    #[serde(default)]
    pub customer_name: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub billing_address: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of the computed line totals.
    ///
    /// Usually equals `total_amount`; shipping or discounts applied by the
    /// backend make them differ.
    #[must_use]
    pub fn items_subtotal(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    /// Denormalized product name.
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    /// Line total as computed by the backend.
    #[serde(default)]
    pub total_price: Option<Money>,
}

impl OrderItem {
    /// Line total: the backend's figure when present, otherwise
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.total_price
            .unwrap_or_else(|| self.unit_price.times(self.quantity))
    }
}

/// Aggregate order figures for the metrics page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_revenue: Money,
    /// Count of orders per status, keyed by wire status name.
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
}

impl OrderStats {
    /// Count for a given status, zero when the backend omitted it.
    #[must_use]
    pub fn count(&self, status: OrderStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<CustomerId>,
    pub shipping_address: String,
    pub billing_address: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<CreateOrderItem>,
}

/// Body for `PATCH /orders/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "id": 12,
        "orderNumber": "ORD-0012",
        "customerId": "c-9",
        "customerName": "Linh Tran",
        "totalAmount": 4500000,
        "status": "processing",
        "shippingAddress": "12 Hang Bac, Ha Noi",
        "paymentMethod": "bank_transfer",
        "isPaid": false,
        "items": [
            {"id": 1, "productId": "p-1", "productName": "Road Bike", "quantity": 1, "unitPrice": 4000000},
            {"id": 2, "productId": "p-2", "productName": "Bottle Cage", "quantity": 2, "unitPrice": "250000.00", "totalPrice": 500000}
        ],
        "createdAt": "2026-01-05T08:30:00Z",
        "updatedAt": "2026-01-05T09:00:00Z"
    }"#;

    #[test]
    fn test_order_deserializes_backend_shape() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.id.as_str(), "12");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_method, PaymentMethod::BankTransfer);
        assert!(order.billing_address.is_none());
        assert!(order.paid_at.is_none());
        assert_eq!(order.items.len(), 2);
    }

    #[test]
    fn test_order_item_line_total_falls_back_to_computed() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        let first = order.items.first().unwrap();
        assert_eq!(first.line_total(), Money::from_units(4_000_000));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items_subtotal(), Money::from_units(4_500_000));
    }

    #[test]
    fn test_stats_missing_status_is_zero() {
        let stats: OrderStats =
            serde_json::from_str(r#"{"totalOrders": 3, "totalRevenue": 10, "byStatus": {"pending": 3}}"#)
                .unwrap();
        assert_eq!(stats.count(OrderStatus::Pending), 3);
        assert_eq!(stats.count(OrderStatus::Shipped), 0);
    }

    #[test]
    fn test_update_status_body() {
        let body = UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"status":"shipped"}"#
        );
    }
}
