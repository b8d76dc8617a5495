//! Same-origin JSON relays to the backend.
//!
//! The browser talks to `/api/...` on this server; each handler forwards
//! the body (and selected headers) to the backend and relays the answer.
//!
//! ```text
//! POST /api/auth/login           -> /auth/login
//! POST /api/cart/checkout        -> /cart/checkout          (forwards authorization)
//! POST /api/guest/cart/checkout  -> /guest/cart/checkout    (requires x-session-id)
//! ```
//!
//! Handlers never fail past this boundary: every outcome is a JSON response.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::middleware::REQUEST_ID_HEADER;
use crate::services::SESSION_ID_HEADER;
use crate::state::AppState;

/// Message used when the backend's error body says nothing useful.
const GENERIC_FAILURE: &str = "Request failed";

/// Message used for our own failures (transport, malformed JSON).
const INTERNAL_ERROR: &str = "Internal server error";

/// One forwarded endpoint.
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    pub backend_path: &'static str,
    pub method: Method,
    /// Headers that must be present; a missing one is a 400 with no outbound call.
    pub required_headers: &'static [&'static str],
    /// Headers copied onto the outbound request when present.
    pub forwarded_headers: &'static [&'static str],
}

pub const LOGIN: ProxyRoute = ProxyRoute {
    backend_path: "/auth/login",
    method: Method::POST,
    required_headers: &[],
    forwarded_headers: &[],
};

pub const CART_CHECKOUT: ProxyRoute = ProxyRoute {
    backend_path: "/cart/checkout",
    method: Method::POST,
    required_headers: &[],
    forwarded_headers: &["authorization"],
};

pub const GUEST_CART_CHECKOUT: ProxyRoute = ProxyRoute {
    backend_path: "/guest/cart/checkout",
    method: Method::POST,
    required_headers: &[SESSION_ID_HEADER],
    forwarded_headers: &[SESSION_ID_HEADER],
};

/// `POST /api/auth/login`
pub async fn login(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    forward(&state, &LOGIN, &headers, &body).await
}

/// `POST /api/cart/checkout`
pub async fn cart_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, &CART_CHECKOUT, &headers, &body).await
}

/// `POST /api/guest/cart/checkout`
pub async fn guest_cart_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, &GUEST_CART_CHECKOUT, &headers, &body).await
}

/// Forward one request to the backend and relay the response.
#[instrument(skip(state, headers, body), fields(backend_path = route.backend_path))]
pub async fn forward(
    state: &AppState,
    route: &ProxyRoute,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    if let Some(missing) = missing_required_header(route, headers) {
        tracing::debug!(header = missing, "proxy request missing required header");
        return error_response(StatusCode::BAD_REQUEST, &format!("{missing} header is required"));
    }

    let payload: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Proxy request body is not JSON: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
        }
    };

    let backend = state.backend();
    let mut outbound = backend
        .http()
        .request(route.method.clone(), backend.base_url().join(route.backend_path))
        .json(&payload);
    for name in route.forwarded_headers.iter().copied().chain([REQUEST_ID_HEADER]) {
        if let Some(value) = headers.get(name) {
            outbound = outbound.header(name, value.clone());
        }
    }

    let response = match outbound.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Proxy call to backend failed: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
        }
    };

    let status = response.status();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Proxy failed reading backend body: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
        }
    };

    relay(status, &bytes)
}

/// First required header that is absent or empty.
fn missing_required_header(route: &ProxyRoute, headers: &HeaderMap) -> Option<&'static str> {
    route.required_headers.iter().copied().find(|name| {
        headers
            .get(*name)
            .is_none_or(|value| value.as_bytes().iter().all(u8::is_ascii_whitespace))
    })
}

/// Turn a backend status and body into the browser-facing response.
fn relay(status: StatusCode, bytes: &[u8]) -> Response {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        if status.is_success() {
            return status.into_response();
        }
        return (status, Json(json!({ "message": GENERIC_FAILURE }))).into_response();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(body) if status.is_success() => (status, Json(body)).into_response(),
        Ok(body) => (status, Json(with_failure_message(body))).into_response(),
        Err(e) => {
            tracing::warn!(%status, "Backend returned malformed JSON: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

/// Ensure an error body has something to show: objects carrying neither
/// `message` nor `error` get the generic message. Other shapes pass through,
/// except `null`, which becomes the generic object.
fn with_failure_message(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            if !map.contains_key("message") && !map.contains_key("error") {
                map.insert("message".to_string(), Value::from(GENERIC_FAILURE));
            }
            Value::Object(map)
        }
        Value::Null => json!({ "message": GENERIC_FAILURE }),
        other => other,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
