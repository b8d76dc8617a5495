//! Sign-in and sign-out.
//!
//! Credentials go to the backend's `/auth/login`; on success the token and
//! user are stored in the session and mirrored into the `token` cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use pedalhub_core::LoginRequest;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::WebSession;
use crate::session::cookie::{append_set_cookie, login_cookie, logout_cookie};
use crate::state::AppState;

/// Where a successful sign-in lands when no return path was given.
const DEFAULT_RETURN_PATH: &str = "/dashboard";

/// Sign-in page query.
#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    pub redirect: Option<String>,
}

/// Sign-in form data.
#[derive(Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    pub redirect: Option<String>,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub error: Option<String>,
    pub email: String,
    pub redirect: String,
}

/// Only same-site absolute paths are followed after sign-in.
fn safe_return_path(redirect: Option<&str>) -> &str {
    redirect
        .filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
        .unwrap_or(DEFAULT_RETURN_PATH)
}

/// `GET /sign-in`
pub async fn sign_in_page(Query(query): Query<SignInQuery>) -> impl IntoResponse {
    SignInTemplate {
        error: None,
        email: String::new(),
        redirect: safe_return_path(query.redirect.as_deref()).to_string(),
    }
}

/// `POST /sign-in`
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: WebSession,
    Form(form): Form<SignInForm>,
) -> Response {
    let return_to = safe_return_path(form.redirect.as_deref()).to_string();
    let request = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password,
    };

    let login = match state.backend().login(&request).await {
        Ok(login) => login,
        Err(e) => {
            tracing::warn!("Sign-in failed: {e}");
            let status = match e.status() {
                Some(400 | 401) => StatusCode::UNAUTHORIZED,
                Some(_) | None => StatusCode::BAD_GATEWAY,
            };
            let page = SignInTemplate {
                error: Some(e.user_message()),
                email: request.email,
                redirect: return_to,
            };
            return (status, page).into_response();
        }
    };

    let token = SecretString::from(login.access_token);
    if let Err(e) = session.login(&token, &login.user).await {
        tracing::error!("Failed to store session: {e}");
        let page = SignInTemplate {
            error: Some("We could not sign you in. Please try again.".to_string()),
            email: request.email,
            redirect: return_to,
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, page).into_response();
    }

    set_sentry_user(&login.user.id, Some(&login.user.email));

    let mut response = Redirect::to(&return_to).into_response();
    append_set_cookie(&mut response, &login_cookie(&token, state.config().is_secure()));
    response
}

/// `POST /sign-out`
///
/// Clears the session entries and the cookie even if the store fails.
#[instrument(skip(state, session))]
pub async fn sign_out(State(state): State<AppState>, session: WebSession) -> Response {
    if let Err(e) = session.logout().await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();

    let mut response = Redirect::to(state.guard().sign_in_path).into_response();
    append_set_cookie(&mut response, &logout_cookie(state.config().is_secure()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_path_accepts_local_paths() {
        assert_eq!(safe_return_path(Some("/admin/metrics")), "/admin/metrics");
        assert_eq!(
            safe_return_path(Some("/dashboard/orders?status=pending")),
            "/dashboard/orders?status=pending"
        );
    }

    #[test]
    fn test_return_path_rejects_offsite_targets() {
        assert_eq!(safe_return_path(None), "/dashboard");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_return_path(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/dashboard");
    }

    #[test]
    fn test_sign_in_page_renders_redirect() {
        let html = SignInTemplate {
            error: Some("Invalid credentials".to_string()),
            email: "rider@pedalhub.vn".to_string(),
            redirect: "/admin/metrics".to_string(),
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("Invalid credentials"));
        assert!(html.contains("rider@pedalhub.vn"));
        assert!(html.contains(r#"name="redirect""#));
    }
}
