//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                     - Health check
//!
//! # Auth
//! GET  /sign-in?redirect=                          - Sign-in page
//! POST /sign-in                                    - Sign-in action
//! POST /sign-out                                   - Sign-out action
//!
//! # Dashboard (requires session)
//! GET  /dashboard                                  - Summary and recent orders
//! GET  /dashboard/orders?status=                   - Order list
//! GET  /dashboard/orders/{id}                      - Order detail
//! POST /dashboard/orders/{id}/status               - Change order status
//! POST /dashboard/orders/{id}/delete               - Delete order
//! GET  /dashboard/profile                          - Signed-in user
//!
//! # Admin (requires admin role)
//! GET  /admin/metrics                              - Order statistics
//! POST /admin/payments/verify                      - Verify a bank transfer
//!
//! # Storefront
//! GET  /store                                      - Product listing
//! GET  /store/products/{id}                        - Product detail
//! GET  /store/cart                                 - Cart page
//! POST /store/cart/add                             - Add to cart
//! POST /store/cart/update                          - Set line quantity
//! POST /store/cart/remove                          - Remove line
//! GET  /store/cart/count                           - Cart badge fragment
//! GET  /store/checkout                             - Checkout form
//! POST /store/checkout                             - Place guest order
//! GET  /store/orders/{id}/confirmation             - Order confirmation
//!
//! # Payment
//! GET  /store/payment/bank-transfer/{id}?amount=   - Bank transfer page
//! POST /store/payment/bank-transfer/{id}/qr        - Request QR code
//! GET  /store/payment/bank-transfer/{id}/countdown - QR countdown (SSE)
//! POST /store/payment/bank-transfer/{id}           - Submit transfer
//! GET  /store/payment/credit-card/{id}?amount=     - Card page
//! POST /store/payment/credit-card/{id}             - Submit card payment
//!
//! # API proxy (JSON)
//! POST /api/auth/login                             - Backend login
//! POST /api/cart/checkout                          - Authenticated checkout
//! POST /api/guest/cart/checkout                    - Guest checkout
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod payment;
pub mod proxy;
pub mod store;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::error::AppError;
use crate::services::BackendError;
use crate::state::AppState;

/// Split a backend failure for a page handler.
///
/// A rejected token becomes the sign-out redirect (see
/// `middleware::end_rejected_session`); anything else becomes a message to
/// render on the page.
pub(crate) fn backend_failure(err: BackendError) -> Result<String, Response> {
    if err.status() == Some(401) {
        return Err(AppError::Backend(err).into_response());
    }
    tracing::warn!("Backend call failed: {err}");
    Ok(err.user_message())
}

/// Append `?key=value` to a path, URL-encoding the value.
pub(crate) fn with_query(path: &str, key: &str, value: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(value))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/orders", get(dashboard::orders))
        .route("/orders/{id}", get(dashboard::order_detail))
        .route("/orders/{id}/status", post(dashboard::update_status))
        .route("/orders/{id}/delete", post(dashboard::delete_order))
        .route("/profile", get(dashboard::profile))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(admin::metrics))
        .route("/payments/verify", post(admin::verify_payment))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bank-transfer/{order_id}",
            get(payment::bank_transfer_page).post(payment::bank_transfer_submit),
        )
        .route("/bank-transfer/{order_id}/qr", post(payment::bank_transfer_qr))
        .route(
            "/bank-transfer/{order_id}/countdown",
            get(payment::bank_transfer_countdown),
        )
        .route(
            "/credit-card/{order_id}",
            get(payment::credit_card_page).post(payment::credit_card_submit),
        )
}

/// Create the storefront routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store::index))
        .route("/products/{id}", get(store::product))
        .route("/cart", get(store::cart))
        .route("/cart/add", post(store::cart_add))
        .route("/cart/update", post(store::cart_update))
        .route("/cart/remove", post(store::cart_remove))
        .route("/cart/count", get(store::cart_count))
        .route("/checkout", get(store::checkout_page).post(store::checkout))
        .route("/orders/{id}/confirmation", get(store::confirmation))
        .nest("/payment", payment_routes())
}

/// Create the API proxy routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(proxy::login))
        .route("/cart/checkout", post(proxy::cart_checkout))
        .route("/guest/cart/checkout", post(proxy::guest_cart_checkout))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/admin", admin_routes())
        .nest("/store", store_routes())
        .nest("/api", api_routes())
}
