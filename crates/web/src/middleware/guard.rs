//! Cookie-presence route guard.
//!
//! Decides, before any handler runs, whether a navigation is allowed or
//! redirected. The decision only looks at the path and whether a non-empty
//! `token` cookie is present; the token itself is never checked here.
//!
//! # Rules (first match wins)
//!
//! ```text
//! 1. path under /store                          -> allow
//! 2. cookie present, path is /sign-in           -> redirect /dashboard
//! 3. path under /sign-in, /sign-up, /reset-password -> allow
//! 4. no cookie, path under /dashboard or /admin -> redirect /sign-in?redirect=<path+query>
//! 5. anything else                              -> allow
//! ```
//!
//! Requests outside the matcher prefixes (`/api`, `/static`, `/health`, ...)
//! skip the guard entirely.

use axum::{
    extract::{Request, State},
    http::uri::PathAndQuery,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::cookie::has_token_cookie;
use crate::state::AppState;

/// What the guard does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the request through.
    Allow,
    /// Send an already signed-in visitor to the dashboard root.
    RedirectToDashboard,
    /// Send an anonymous visitor to sign-in, remembering where they were going.
    RedirectToSignIn { return_to: String },
}

impl GuardDecision {
    /// Redirect target, if any.
    #[must_use]
    pub fn location(&self, config: &GuardConfig) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::RedirectToDashboard => Some(config.dashboard_root.to_string()),
            Self::RedirectToSignIn { return_to } => Some(format!(
                "{}?redirect={}",
                config.sign_in_path,
                urlencoding::encode(return_to)
            )),
        }
    }
}

/// Path prefixes the guard works with.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Only paths under these prefixes invoke the guard.
    pub matchers: Vec<&'static str>,
    /// Always allowed, before any other rule.
    pub storefront_prefix: &'static str,
    /// The sign-in page; signed-in visitors are bounced off it.
    pub sign_in_path: &'static str,
    /// Allowed without a cookie.
    pub public_prefixes: Vec<&'static str>,
    /// Require a cookie.
    pub protected_prefixes: Vec<&'static str>,
    /// Where signed-in visitors land.
    pub dashboard_root: &'static str,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            matchers: vec![
                "/dashboard",
                "/admin",
                "/sign-in",
                "/sign-up",
                "/reset-password",
                "/store",
            ],
            storefront_prefix: "/store",
            sign_in_path: "/sign-in",
            public_prefixes: vec!["/sign-in", "/sign-up", "/reset-password"],
            protected_prefixes: vec!["/dashboard", "/admin"],
            dashboard_root: "/dashboard",
        }
    }
}

impl GuardConfig {
    /// Whether the guard runs for this path at all.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|prefix| under_prefix(path, prefix))
    }
}

/// Facts a rule looks at.
struct Visit<'a> {
    path: &'a str,
    /// Path plus query string, used as the sign-in return path.
    target: &'a str,
    has_cookie: bool,
}

/// One guard rule: a predicate and the decision it produces.
struct Rule {
    applies: fn(&Visit<'_>, &GuardConfig) -> bool,
    decide: fn(&Visit<'_>) -> GuardDecision,
}

const RULES: &[Rule] = &[
    Rule {
        applies: is_storefront,
        decide: allow,
    },
    Rule {
        applies: is_signed_in_on_sign_in,
        decide: redirect_to_dashboard,
    },
    Rule {
        applies: is_public,
        decide: allow,
    },
    Rule {
        applies: is_anonymous_on_protected,
        decide: redirect_to_sign_in,
    },
];

fn is_storefront(visit: &Visit<'_>, config: &GuardConfig) -> bool {
    under_prefix(visit.path, config.storefront_prefix)
}

fn is_signed_in_on_sign_in(visit: &Visit<'_>, config: &GuardConfig) -> bool {
    visit.has_cookie && under_prefix(visit.path, config.sign_in_path)
}

fn is_public(visit: &Visit<'_>, config: &GuardConfig) -> bool {
    config
        .public_prefixes
        .iter()
        .any(|prefix| under_prefix(visit.path, prefix))
}

fn is_anonymous_on_protected(visit: &Visit<'_>, config: &GuardConfig) -> bool {
    !visit.has_cookie
        && config
            .protected_prefixes
            .iter()
            .any(|prefix| under_prefix(visit.path, prefix))
}

const fn allow(_: &Visit<'_>) -> GuardDecision {
    GuardDecision::Allow
}

const fn redirect_to_dashboard(_: &Visit<'_>) -> GuardDecision {
    GuardDecision::RedirectToDashboard
}

fn redirect_to_sign_in(visit: &Visit<'_>) -> GuardDecision {
    GuardDecision::RedirectToSignIn {
        return_to: visit.target.to_string(),
    }
}

/// Decide what to do with a navigation to `target`.
///
/// Rules match on the path alone; a query string is only carried into the
/// sign-in return path.
#[must_use]
pub fn evaluate(target: &str, has_session_cookie: bool, config: &GuardConfig) -> GuardDecision {
    let path = target.split_once('?').map_or(target, |(path, _)| path);
    let visit = Visit {
        path,
        target,
        has_cookie: has_session_cookie,
    };

    RULES
        .iter()
        .find(|rule| (rule.applies)(&visit, config))
        .map_or(GuardDecision::Allow, |rule| (rule.decide)(&visit))
}

/// Segment-aware prefix test: `/store` matches `/store` and `/store/cart`,
/// not `/storefront`.
fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Middleware applying [`evaluate`] to matching requests.
pub async fn route_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = state.guard();
    let path = request.uri().path();
    if !config.matches(path) {
        return next.run(request).await;
    }

    let target = request
        .uri()
        .path_and_query()
        .map_or(path, PathAndQuery::as_str);
    let decision = evaluate(target, has_token_cookie(request.headers()), config);
    match decision.location(config) {
        Some(location) => {
            tracing::debug!(path, %location, "route guard redirect");
            Redirect::to(&location).into_response()
        }
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(path: &str, has_cookie: bool) -> GuardDecision {
        evaluate(path, has_cookie, &GuardConfig::default())
    }

    #[test]
    fn test_storefront_always_allowed() {
        for path in ["/store", "/store/cart", "/store/products/p-1"] {
            assert_eq!(decide(path, false), GuardDecision::Allow);
            assert_eq!(decide(path, true), GuardDecision::Allow);
        }
    }

    #[test]
    fn test_signed_in_visitor_leaves_sign_in() {
        assert_eq!(decide("/sign-in", true), GuardDecision::RedirectToDashboard);
        assert_eq!(decide("/sign-in", false), GuardDecision::Allow);
    }

    #[test]
    fn test_public_pages_allowed_with_cookie() {
        assert_eq!(decide("/sign-up", true), GuardDecision::Allow);
        assert_eq!(decide("/reset-password", true), GuardDecision::Allow);
    }

    #[test]
    fn test_protected_paths_need_cookie() {
        assert_eq!(
            decide("/admin/metrics", false),
            GuardDecision::RedirectToSignIn {
                return_to: "/admin/metrics".to_string()
            }
        );
        assert_eq!(decide("/admin/metrics", true), GuardDecision::Allow);
        assert_eq!(decide("/dashboard", true), GuardDecision::Allow);
    }

    #[test]
    fn test_sign_in_redirect_encodes_return_path() {
        let config = GuardConfig::default();
        let location = evaluate("/dashboard/orders/o 1", false, &config).location(&config);
        assert_eq!(
            location.as_deref(),
            Some("/sign-in?redirect=%2Fdashboard%2Forders%2Fo%201")
        );
    }

    #[test]
    fn test_sign_in_redirect_keeps_query() {
        let config = GuardConfig::default();
        let decision = evaluate("/dashboard/orders?status=pending", false, &config);
        assert_eq!(
            decision.location(&config).as_deref(),
            Some("/sign-in?redirect=%2Fdashboard%2Forders%3Fstatus%3Dpending")
        );
        assert_eq!(
            evaluate("/store?page=2", false, &config),
            GuardDecision::Allow
        );
        assert_eq!(
            evaluate("/sign-in?redirect=%2Fdashboard", true, &config),
            GuardDecision::RedirectToDashboard
        );
    }

    #[test]
    fn test_prefix_matching_respects_segments() {
        assert!(under_prefix("/store", "/store"));
        assert!(under_prefix("/store/cart", "/store"));
        assert!(!under_prefix("/storefront", "/store"));
        assert!(!under_prefix("/administrator", "/admin"));
        assert_eq!(decide("/administrator", false), GuardDecision::Allow);
    }

    #[test]
    fn test_matcher_skips_other_paths() {
        let config = GuardConfig::default();
        assert!(config.matches("/dashboard/orders"));
        assert!(!config.matches("/api/auth/login"));
        assert!(!config.matches("/static/css/main.css"));
        assert!(!config.matches("/health"));
    }
}
