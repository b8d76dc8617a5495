//! Session extractors.
//!
//! The route guard only looks at the `token` cookie. These extractors are
//! the second line: they load the token and user from the session and
//! reject the request when they are missing.

use axum::{
    extract::FromRequestParts,
    http::{Method, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::CurrentSession;
use crate::session::cookie::{append_set_cookie, logout_cookie};
use crate::session::{SessionManager, TowerSessionStorage};
use crate::state::AppState;

/// Session manager bound to the current request's session.
pub type WebSession = SessionManager<TowerSessionStorage>;

impl<S> FromRequestParts<S> for SessionManager<TowerSessionStorage>
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))?;

        Ok(Self::new(TowerSessionStorage::new(session)))
    }
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireSession(session): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.display_name())
/// }
/// ```
pub struct RequireSession(pub CurrentSession);

/// Extractor that requires a signed-in admin.
pub struct RequireAdmin(pub CurrentSession);

/// Extractor that reads the session without requiring it.
pub struct OptionalSession(pub Option<CurrentSession>);

/// Why a session extractor refused the request.
#[derive(Debug)]
pub enum SessionRejection {
    /// Page request without a session. Also expires a stale `token` cookie,
    /// otherwise the guard would bounce the visitor back off the sign-in page.
    SignIn { location: String, secure: bool },
    /// API request without a session.
    Unauthorized,
    /// Signed in, but not an admin.
    Forbidden,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::SignIn { location, secure } => {
                let mut response = Redirect::to(&location).into_response();
                append_set_cookie(&mut response, &logout_cookie(secure));
                response
            }
            Self::Unauthorized => {
                AppError::Unauthorized("Sign in required".to_string()).into_response()
            }
            Self::Forbidden => {
                AppError::Forbidden("Admin access required".to_string()).into_response()
            }
        }
    }
}

/// Load the current session, treating unreadable state as signed out.
async fn load_session(parts: &mut Parts, state: &AppState) -> Option<CurrentSession> {
    let manager = WebSession::from_request_parts(parts, state).await.ok()?;
    match manager.current().await {
        Ok(current) => current,
        Err(e) => {
            tracing::warn!("Ignoring unreadable session: {e}");
            None
        }
    }
}

fn rejection_for(parts: &Parts, state: &AppState) -> SessionRejection {
    if parts.uri.path().starts_with("/api/") {
        return SessionRejection::Unauthorized;
    }

    let guard = state.guard();
    let return_to = if parts.method == Method::GET {
        parts
            .uri
            .path_and_query()
            .map_or(guard.dashboard_root, |pq| pq.as_str())
    } else {
        guard.dashboard_root
    };

    SessionRejection::SignIn {
        location: format!(
            "{}?redirect={}",
            guard.sign_in_path,
            urlencoding::encode(return_to)
        ),
        secure: state.config().is_secure(),
    }
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match load_session(parts, state).await {
            Some(current) => Ok(Self(current)),
            None => Err(rejection_for(parts, state)),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireSession(current) = RequireSession::from_request_parts(parts, state).await?;
        if !current.user.is_admin() {
            tracing::warn!(user_id = %current.user.id, path = %parts.uri.path(), "admin route refused");
            return Err(SessionRejection::Forbidden);
        }
        Ok(Self(current))
    }
}

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(load_session(parts, state).await))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::SET_COOKIE},
    };

    use super::*;
    use crate::config::WebConfig;

    fn state() -> AppState {
        AppState::new(WebConfig::for_backend("http://127.0.0.1:9/api").unwrap()).unwrap()
    }

    fn parts(method: Method, uri: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_page_rejection_keeps_return_path() {
        let rejection = rejection_for(&parts(Method::GET, "/dashboard/orders?status=pending"), &state());
        let SessionRejection::SignIn { location, secure } = rejection else {
            panic!("expected sign-in redirect");
        };
        assert_eq!(
            location,
            "/sign-in?redirect=%2Fdashboard%2Forders%3Fstatus%3Dpending"
        );
        assert!(!secure);
    }

    #[test]
    fn test_post_rejection_returns_to_dashboard() {
        let rejection = rejection_for(&parts(Method::POST, "/dashboard/orders/o-1/delete"), &state());
        assert!(matches!(
            rejection,
            SessionRejection::SignIn { ref location, .. } if location == "/sign-in?redirect=%2Fdashboard"
        ));
    }

    #[test]
    fn test_api_rejection_is_unauthorized() {
        let rejection = rejection_for(&parts(Method::GET, "/api/orders"), &state());
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_sign_in_rejection_expires_cookie() {
        let response = SessionRejection::SignIn {
            location: "/sign-in".to_string(),
            secure: false,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_missing_session_layer_reads_as_signed_out() {
        let request = Request::builder().uri("/dashboard").body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();
        let OptionalSession(current) = OptionalSession::from_request_parts(&mut parts, &state())
            .await
            .unwrap();
        assert!(current.is_none());
    }
}
