//! Session middleware configuration.
//!
//! Sessions live in process memory (`tower_sessions::MemoryStore`); the
//! backend owns everything durable. Restarting the server signs everyone
//! out, and the guard's stale-cookie handling sends them back to sign-in.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, cookie::SameSite};

use crate::config::WebConfig;
use crate::error::{TokenRejected, clear_sentry_user};
use crate::session::cookie::{TOKEN_COOKIE_MAX_AGE_SECS, append_set_cookie, logout_cookie};
use crate::session::{SessionManager, TowerSessionStorage};
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "pedalhub_session";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &WebConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(TOKEN_COOKIE_MAX_AGE_SECS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Sign the visitor out when a handler reports a rejected token.
///
/// Must run inside the session layer. Clears the `token` and `user` entries
/// and expires the `token` cookie with the same attributes it was set with.
pub async fn end_rejected_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let mut response = next.run(request).await;

    if response.extensions_mut().remove::<TokenRejected>().is_none() {
        return response;
    }

    match session {
        Some(session) => {
            let manager = SessionManager::new(TowerSessionStorage::new(session));
            if let Err(e) = manager.logout().await {
                tracing::error!("Failed to clear rejected session: {e}");
            }
        }
        None => tracing::warn!("Token rejected outside the session layer"),
    }
    clear_sentry_user();

    append_set_cookie(&mut response, &logout_cookie(state.config().is_secure()));
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::SET_COOKIE},
        middleware::from_fn_with_state,
        response::IntoResponse,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::WebConfig;
    use crate::models::session_keys;
    use crate::session::SessionStorage;

    fn state(base_url: &str) -> AppState {
        let mut config = WebConfig::for_backend("http://127.0.0.1:9/api").unwrap();
        config.base_url = base_url.to_string();
        AppState::new(config).unwrap()
    }

    /// Seeds a signed-in session, then answers as if the backend said 401.
    async fn rejected(session: Session) -> Response {
        let storage = TowerSessionStorage::new(session);
        storage
            .set(session_keys::TOKEN, "stale".to_string())
            .await
            .unwrap();
        storage
            .set(session_keys::USER, "{}".to_string())
            .await
            .unwrap();
        let mut response = StatusCode::SEE_OTHER.into_response();
        response.extensions_mut().insert(TokenRejected);
        response
    }

    async fn accepted() -> StatusCode {
        StatusCode::OK
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/rejected", get(rejected))
            .route("/accepted", get(accepted))
            .layer(from_fn_with_state(state.clone(), end_rejected_session))
            .layer(create_session_layer(state.config()))
            .with_state(state)
    }

    async fn get_set_cookies(app: Router, uri: &str) -> Vec<String> {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_rejected_token_expires_cookie() {
        let cookies = get_set_cookies(app(state("http://localhost:3000")), "/rejected").await;
        let token = cookies.iter().find(|c| c.starts_with("token=")).unwrap();
        assert!(token.contains("Max-Age=0"));
        assert!(!token.contains("Secure"));
    }

    #[tokio::test]
    async fn test_rejected_token_cookie_is_secure_over_https() {
        let cookies = get_set_cookies(app(state("https://pedalhub.example")), "/rejected").await;
        let token = cookies.iter().find(|c| c.starts_with("token=")).unwrap();
        assert!(token.contains("Max-Age=0"));
        assert!(token.contains("Secure"));
    }

    #[tokio::test]
    async fn test_accepted_response_left_alone() {
        let cookies = get_set_cookies(app(state("http://localhost:3000")), "/accepted").await;
        assert!(cookies.iter().all(|c| !c.starts_with("token=")));
    }
}
