//! Outbound services.
//!
//! # Services
//!
//! - `backend` - Typed client for the backend REST API

pub mod backend;

pub use backend::{BackendClient, BackendError, SESSION_ID_HEADER};
