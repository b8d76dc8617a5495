//! PedalHub Core - Shared types library.
//!
//! This crate provides the data-transfer types mirrored from the backend
//! REST API, used by:
//! - `web` - Admin dashboard, public storefront and API proxy
//! - `integration-tests` - End-to-end tests against a mock backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure state machines - no I/O, no
//! HTTP clients. The front end never owns authoritative state for any of
//! these types; they are a read/display cache of backend truth.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, statuses and backend request/response records
//! - [`countdown`] - QR-code validity countdown

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod countdown;
pub mod types;

pub use countdown::{QR_VALIDITY_SECS, QrCountdown};
pub use types::*;
