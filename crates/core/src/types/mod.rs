//! Core types for PedalHub.
//!
//! This module provides type-safe wrappers and the records exchanged with
//! the backend service.

pub mod auth;
pub mod cart;
pub mod id;
pub mod order;
pub mod payment;
pub mod price;
pub mod product;
pub mod status;

pub use auth::{LoginRequest, LoginResponse, User};
pub use cart::{Cart, CartLine, GuestCheckoutRequest};
pub use id::*;
pub use order::{
    CreateOrderItem, CreateOrderRequest, Order, OrderItem, OrderStats, UpdateOrderStatusRequest,
};
pub use payment::{
    BankTransferRequest, BankTransferResponse, CreditCardRequest, CreditCardResponse,
    QrCodeResponse,
};
pub use price::{Money, format_amount};
pub use product::Product;
pub use status::*;
