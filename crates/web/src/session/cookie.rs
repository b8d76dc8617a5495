//! The `token` cookie that mirrors login state for the route guard.
//!
//! The guard only checks that the cookie is present and non-empty. It is
//! written on login and expired on logout, next to the session entries.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};
use axum::response::Response;
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Name of the login-state cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Login cookie lifetime (7 days), matching the session expiry.
pub const TOKEN_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Whether the request carries a non-empty `token` cookie.
#[must_use]
pub fn has_token_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == TOKEN_COOKIE && !cookie.value().is_empty())
}

/// Cookie set after a successful login.
#[must_use]
pub fn login_cookie(token: &SecretString, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token.expose_secret().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(TOKEN_COOKIE_MAX_AGE_SECS))
        .build()
}

/// Cookie that expires the login cookie immediately.
#[must_use]
pub fn logout_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Render a cookie as a `Set-Cookie` header value.
#[must_use]
pub fn set_cookie_value(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Append a `Set-Cookie` header for `cookie` to a response.
pub fn append_set_cookie(response: &mut Response, cookie: &Cookie<'_>) {
    if let Some(value) = set_cookie_value(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}
