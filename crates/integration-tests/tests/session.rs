//! Sign-out, explicit or forced by a rejected token, clears the session and
//! the login cookie.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pedalhub_integration_tests::{
    EXPIRED_EMAIL, EXPIRED_TOKEN, TestApp, client, set_cookie_pair, sign_in, sign_in_as, spawn,
};
use pedalhub_web::middleware::session::SESSION_COOKIE_NAME;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};

fn expires_token(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("token=;") && v.contains("Max-Age=0"))
}

/// Replay the old session cookie with a token cookie: only the session
/// entries stand between this request and the dashboard handler.
async fn replay_session(app: &TestApp, session_cookie: &str) -> reqwest::Response {
    client()
        .get(app.url("/dashboard"))
        .header(COOKIE, format!("{session_cookie}; token={EXPIRED_TOKEN}"))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn sign_in_sets_token_cookie() {
    let (_backend, app) = spawn().await;

    let response = sign_in(&client(), &app, "/dashboard").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let token = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("token="))
        .unwrap();
    assert!(token.contains("HttpOnly"));
    assert!(token.contains("SameSite=Lax"));
}

#[tokio::test]
async fn sign_out_clears_cookie_and_session() {
    let (_backend, app) = spawn().await;
    let client = client();
    sign_in(&client, &app, "/dashboard").await;

    let response = client.get(app.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.post(app.url("/sign-out")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/sign-in");
    assert!(expires_token(&response));

    // The cookie is gone, so the guard turns the visitor away.
    let response = client.get(app.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/sign-in?redirect=%2Fdashboard");
}

#[tokio::test]
async fn session_survives_across_requests() {
    let (_backend, app) = spawn().await;
    let client = client();
    sign_in(&client, &app, "/dashboard").await;

    for path in ["/dashboard", "/dashboard/orders", "/dashboard/profile"] {
        let response = client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn rejected_token_on_storefront_signs_out_and_still_confirms() {
    let (backend, app) = spawn().await;
    let client = client();
    let response = sign_in_as(&client, &app, EXPIRED_EMAIL, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let session_cookie = set_cookie_pair(&response, SESSION_COOKIE_NAME).unwrap();

    let response = client
        .get(app.url("/store/orders/o-1/confirmation"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(expires_token(&response));

    // Signed out now: the page loads without touching the backend.
    let hits = backend.hits();
    for _ in 0..2 {
        let response = client
            .get(app.url("/store/orders/o-1/confirmation"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(backend.hits(), hits);

    let response = client.get(app.url("/store")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(app.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/sign-in?redirect=%2Fdashboard");

    let hits = backend.hits();
    let response = replay_session(&app, &session_cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/sign-in?redirect=%2Fdashboard");
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn rejected_token_on_dashboard_clears_session_entries() {
    let (backend, app) = spawn().await;
    let client = client();
    let response = sign_in_as(&client, &app, EXPIRED_EMAIL, "/dashboard").await;
    let session_cookie = set_cookie_pair(&response, SESSION_COOKIE_NAME).unwrap();

    let response = client.get(app.url("/dashboard/orders")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/sign-in");
    assert!(expires_token(&response));

    // The token and user entries are gone, so the extractor stops the
    // request before any backend call.
    let hits = backend.hits();
    let response = replay_session(&app, &session_cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/sign-in?redirect=%2Fdashboard");
    assert_eq!(backend.hits(), hits);

    let response = client.get(app.url("/sign-in")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
