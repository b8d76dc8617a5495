//! Typed client for the backend REST API.
//!
//! Every public method performs exactly one HTTP call and returns the parsed
//! payload or a [`BackendError`]. There are no retries, no caching and no
//! batching; callers own their loading and error states.
//!
//! # Endpoints
//!
//! ```text
//! POST   /auth/login                                  LoginRequest        -> LoginResponse
//! GET    /orders                                      -                   -> Vec<Order>
//! GET    /orders/{id}                                 -                   -> Order
//! GET    /orders/status/{status}                      -                   -> Vec<Order>
//! GET    /orders/stats                                -                   -> OrderStats
//! POST   /orders                                      CreateOrderRequest  -> Order
//! PATCH  /orders/{id}                                 UpdateOrderStatus   -> Order
//! DELETE /orders/{id}                                 -                   -> ()
//! GET    /payment/bank-transfer/qr/{orderId}?amount=  -                   -> QrCodeResponse
//! POST   /payment/bank-transfer/{orderId}             BankTransferRequest -> BankTransferResponse
//! PATCH  /payment/bank-transfer/verify/{paymentId}    -                   -> BankTransferResponse
//! POST   /payment/credit-card/{orderId}               CreditCardRequest   -> CreditCardResponse
//! POST   /guest/cart/checkout (x-session-id)          GuestCheckout       -> Order
//! GET    /products                                    -                   -> Vec<Product>
//! GET    /products/{id}                               -                   -> Product
//! ```

mod auth;
mod cart;
mod orders;
mod payments;
mod products;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{BackendConfig, BackendUrl};

/// Header carrying the guest session identifier on session-scoped endpoints.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or the connection failed mid-request.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend answered with a body that does not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Status code reported by the backend, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a backend-reported "not found".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Message suitable for showing to the user.
    ///
    /// Backend-reported messages are passed through; transport and parse
    /// failures collapse into one generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Transport(_) | Self::Parse(_) => {
                "We could not reach the service. Please try again.".to_string()
            }
        }
    }
}

/// Backend REST API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: BackendUrl,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: BackendUrl) -> Self {
        Self {
            inner: Arc::new(BackendClientInner { client, base_url }),
        }
    }

    /// The shared HTTP client (also used by the proxy handlers).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// The normalized backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &BackendUrl {
        &self.inner.base_url
    }

    /// Start a request to a backend path, attaching the bearer token when given.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> RequestBuilder {
        let url = self.inner.base_url.join(path);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and parse a JSON success body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes)
                .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(parse_error(response).await)
    }

    /// Send a request whose success body is ignored.
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<(), BackendError> {
        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(());
        }

        Err(parse_error(response).await)
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Turn a non-success response into `BackendError::Api`.
async fn parse_error(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    BackendError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

/// Extract a human-readable message from an error body.
///
/// Reads `message` (a string, or an array of strings from validation
/// failures), then `error`, then falls back to the status reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let from_body = parsed.as_ref().and_then(|value| {
        match value.get("message") {
            Some(serde_json::Value::String(msg)) => return Some(msg.clone()),
            Some(serde_json::Value::Array(parts)) => {
                let joined = parts
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    return Some(joined);
                }
            }
            _ => {}
        }
        value
            .get("error")
            .and_then(serde_json::Value::as_str)
            .map(String::from)
    });

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Order not payable", "error": "Bad Request"}"#,
        );
        assert_eq!(msg, "Order not payable");
    }

    #[test]
    fn test_error_message_joins_validation_array() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message": ["email must be an email", "password too short"]}"#,
        );
        assert_eq!(msg, "email must be an email, password too short");
    }

    #[test]
    fn test_error_message_falls_back_to_error_then_reason() {
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"error": "Invalid token"}"#),
            "Invalid token"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, "<html>"), "Not Found");
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = BackendError::Parse("expected value at line 1".to_string());
        assert!(!err.user_message().contains("line 1"));

        let err = BackendError::Api {
            status: 409,
            message: "Out of stock".to_string(),
        };
        assert_eq!(err.user_message(), "Out of stock");
        assert_eq!(err.status(), Some(409));
    }
}
