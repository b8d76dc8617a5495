//! Integration test harness for PedalHub.
//!
//! Each test starts an in-process mock of the backend REST API and the real
//! application router, both bound to `127.0.0.1:0`, and drives them over HTTP
//! with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pedalhub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `guard` - Route guard redirects and sign-in flow
//! - `proxy` - JSON proxy envelope and header handling
//! - `session` - Sign-out (explicit or on a rejected token) clears session and cookie
//! - `orders` - Typed backend client against the mock
//! - `countdown` - QR countdown stream and event endpoint

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use pedalhub_web::config::WebConfig;
use pedalhub_web::state::AppState;

/// Token the mock backend hands out on login.
pub const MOCK_TOKEN: &str = "mock-token-123";

/// Credentials the mock backend accepts.
pub const ADMIN_EMAIL: &str = "admin@pedalhub.vn";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Account whose login succeeds but whose token every later call rejects.
pub const EXPIRED_EMAIL: &str = "lapsed@pedalhub.vn";
pub const EXPIRED_TOKEN: &str = "expired";

/// A running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Base URL in the form the web app is configured with.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Number of requests the backend has received.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A running web app.
pub struct TestApp {
    pub addr: SocketAddr,
}

impl TestApp {
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

/// Client that keeps cookies and does not follow redirects.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Order records served by the mock backend.
#[must_use]
pub fn mock_orders() -> Value {
    json!([
        {
            "id": "o-1",
            "orderNumber": "PH-0001",
            "customerId": "c-1",
            "customerName": "Nguyen Van A",
            "totalAmount": 12_500_000,
            "status": "pending",
            "shippingAddress": "12 Tran Hung Dao, Ha Noi",
            "paymentMethod": "bank_transfer",
            "isPaid": false,
            "items": [
                { "id": "i-1", "productId": "p-1", "productName": "Road bike", "quantity": 1, "unitPrice": 12_500_000 }
            ],
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-03-01T08:00:00Z"
        },
        {
            "id": "o-2",
            "orderNumber": "PH-0002",
            "customerId": null,
            "customerName": "Tran Thi B",
            "totalAmount": 1_800_000,
            "status": "delivered",
            "shippingAddress": "5 Le Loi, Da Nang",
            "paymentMethod": "cod",
            "isPaid": true,
            "paidAt": "2025-03-04T10:30:00Z",
            "items": [
                { "id": "i-2", "productId": "p-2", "productName": "Helmet", "quantity": 2, "unitPrice": 900_000 }
            ],
            "createdAt": "2025-03-02T09:15:00Z",
            "updatedAt": "2025-03-04T10:30:00Z"
        }
    ])
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {MOCK_TOKEN}"))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == EXPIRED_EMAIL && body["password"] == ADMIN_PASSWORD {
        return Json(json!({
            "accessToken": EXPIRED_TOKEN,
            "user": { "id": "u-2", "email": EXPIRED_EMAIL, "name": "Lapsed", "role": "user" }
        }))
        .into_response();
    }
    if body["email"] == ADMIN_EMAIL && body["password"] == ADMIN_PASSWORD {
        Json(json!({
            "accessToken": MOCK_TOKEN,
            "user": { "id": "u-1", "email": ADMIN_EMAIL, "name": "Admin", "role": "admin" }
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn list_orders(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(mock_orders()).into_response()
}

async fn get_order(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let orders = mock_orders();
    orders
        .as_array()
        .and_then(|all| all.iter().find(|o| o["id"] == id.as_str()))
        .map_or_else(
            || (StatusCode::NOT_FOUND, Json(json!({ "message": "Order not found" }))).into_response(),
            |order| Json(order.clone()).into_response(),
        )
}

async fn create_order(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(items) = body["items"].as_array().filter(|items| !items.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": ["items must not be empty"] })),
        )
            .into_response();
    };
    let items: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            json!({
                "id": format!("i-new-{i}"),
                "productId": item["productId"],
                "productName": "Road bike",
                "quantity": item["quantity"],
                "unitPrice": 12_500_000
            })
        })
        .collect();
    let order = json!({
        "id": "o-3",
        "orderNumber": "PH-0003",
        "customerId": body["customerId"],
        "customerName": "Admin",
        "totalAmount": 12_500_000,
        "status": "pending",
        "shippingAddress": body["shippingAddress"],
        "paymentMethod": body["paymentMethod"],
        "isPaid": false,
        "items": items,
        "createdAt": "2025-03-05T08:00:00Z",
        "updatedAt": "2025-03-05T08:00:00Z"
    });
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn order_stats(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "totalOrders": 2,
        "totalRevenue": 14_300_000,
        "byStatus": { "pending": 1, "delivered": 1 }
    }))
    .into_response()
}

fn mock_products() -> Value {
    json!([
        { "id": "p-1", "name": "Road bike", "price": 12_500_000, "imageUrl": "https://res.cloudinary.com/pedalhub/road.jpg", "stock": 3 },
        { "id": "p-2", "name": "Helmet", "price": 900_000, "stock": 0 }
    ])
}

async fn list_products() -> Json<Value> {
    Json(mock_products())
}

async fn get_product(Path(id): Path<String>) -> Response {
    let products = mock_products();
    products
        .as_array()
        .and_then(|all| all.iter().find(|p| p["id"] == id.as_str()))
        .map_or_else(
            || (StatusCode::NOT_FOUND, Json(json!({ "message": "Product not found" }))).into_response(),
            |product| Json(product.clone()).into_response(),
        )
}

async fn guest_checkout() -> Response {
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn count_hits(State(hits): State<Arc<AtomicUsize>>, request: Request, next: Next) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

/// Start the mock backend.
pub async fn spawn_backend() -> MockBackend {
    let hits = Arc::new(AtomicUsize::new(0));

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/stats", get(order_stats))
        .route("/orders/{id}", get(get_order))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/guest/cart/checkout", post(guest_checkout));
    let router = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockBackend { addr, hits }
}

/// Start the web app against the given backend base URL.
pub async fn spawn_app(backend_url: &str) -> TestApp {
    let config = WebConfig::for_backend(backend_url).unwrap();
    let state = AppState::new(config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, pedalhub_web::app(state)).await.unwrap();
    });

    TestApp { addr }
}

/// Backend plus app wired together.
pub async fn spawn() -> (MockBackend, TestApp) {
    let backend = spawn_backend().await;
    let app = spawn_app(&backend.api_url()).await;
    (backend, app)
}

/// Sign in through the form with the mock admin credentials.
pub async fn sign_in(client: &reqwest::Client, app: &TestApp, redirect: &str) -> reqwest::Response {
    sign_in_as(client, app, ADMIN_EMAIL, redirect).await
}

/// Sign in through the form as `email`.
pub async fn sign_in_as(
    client: &reqwest::Client,
    app: &TestApp,
    email: &str,
    redirect: &str,
) -> reqwest::Response {
    client
        .post(app.url("/sign-in"))
        .form(&[
            ("email", email),
            ("password", ADMIN_PASSWORD),
            ("redirect", redirect),
        ])
        .send()
        .await
        .unwrap()
}

/// `name=value` of the cookie `name` set by `response`, if any.
#[must_use]
pub fn set_cookie_pair(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{name}=")))
        .map(String::from)
}
