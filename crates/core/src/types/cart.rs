//! Shopping cart held in the visitor's session.
//!
//! The cart is a plain collection of lines keyed by product. It lives for the
//! duration of the browser session and is submitted to the backend in one
//! shot at checkout.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::order::CreateOrderItem;
use super::price::Money;
use super::status::PaymentMethod;

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a line, merging quantities with an existing line for the same product.
    ///
    /// Adding zero units is a no-op.
    pub fn add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.unit_price = line.unit_price;
            }
            None => self.items.push(line),
        }
    }

    /// Set the quantity for a product. Zero removes the line.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        self.items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
            .map(|line| line.quantity = quantity)
            .is_some()
    }

    /// Remove a product line. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| &line.product_id != product_id);
        self.items.len() != before
    }

    /// Sum of quantities across all lines (the header badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in the shape the backend expects for order creation.
    #[must_use]
    pub fn to_checkout_items(&self) -> Vec<CreateOrderItem> {
        self.items
            .iter()
            .map(|line| CreateOrderItem {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Body for `POST /guest/cart/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCheckoutRequest {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<CreateOrderItem>,
}
