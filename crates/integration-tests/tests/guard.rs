//! Route guard behaviour over real HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pedalhub_integration_tests::{client, sign_in, spawn};
use reqwest::StatusCode;
use reqwest::header::LOCATION;

fn location(response: &reqwest::Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn storefront_is_open_without_cookie() {
    let (_backend, app) = spawn().await;
    let client = client();

    for path in ["/store", "/store/cart", "/store/products/p-1"] {
        let response = client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn admin_redirects_to_sign_in_without_cookie() {
    let (_backend, app) = spawn().await;

    let response = client().get(app.url("/admin/metrics")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sign-in?redirect=%2Fadmin%2Fmetrics");
}

#[tokio::test]
async fn sign_in_redirect_keeps_query_and_returns_there() {
    let (_backend, app) = spawn().await;
    let client = client();

    let response = client
        .get(app.url("/dashboard/orders?status=pending"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/sign-in?redirect=%2Fdashboard%2Forders%3Fstatus%3Dpending"
    );

    let response = sign_in(&client, &app, "/dashboard/orders?status=pending").await;
    assert_eq!(location(&response), "/dashboard/orders?status=pending");
}

#[tokio::test]
async fn admin_is_reachable_after_sign_in() {
    let (_backend, app) = spawn().await;
    let client = client();

    let response = sign_in(&client, &app, "/admin/metrics").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/metrics");

    let response = client.get(app.url("/admin/metrics")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Order metrics"));
}

#[tokio::test]
async fn signed_in_visitor_is_sent_from_sign_in_to_dashboard() {
    let (_backend, app) = spawn().await;
    let client = client();
    sign_in(&client, &app, "/dashboard").await;

    let response = client.get(app.url("/sign-in")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn stale_cookie_without_session_is_expired() {
    let (_backend, app) = spawn().await;

    let response = client()
        .get(app.url("/dashboard"))
        .header("cookie", "token=left-over")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/sign-in"));
    let cleared = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("token=;") && v.contains("Max-Age=0"));
    assert!(cleared);
}

#[tokio::test]
async fn wrong_password_re_renders_sign_in() {
    let (_backend, app) = spawn().await;

    let response = client()
        .post(app.url("/sign-in"))
        .form(&[("email", "admin@pedalhub.vn"), ("password", "nope")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains("Invalid credentials"));
}
