//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::config::WebConfig;
use crate::middleware::GuardConfig;
use crate::middleware::security_headers::content_security_policy;
use crate::services::{BackendClient, BackendError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    backend: BackendClient,
    guard: GuardConfig,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WebConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let csp = HeaderValue::from_str(&content_security_policy(&config.image_hosts))
            .unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'"));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                guard: GuardConfig::default(),
                csp,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Typed backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn guard(&self) -> &GuardConfig {
        &self.inner.guard
    }

    /// Precomputed `Content-Security-Policy` header.
    #[must_use]
    pub fn csp(&self) -> &HeaderValue {
        &self.inner.csp
    }

    /// The image URL to render for a product, or the local placeholder when
    /// the URL is missing or its host is not whitelisted.
    #[must_use]
    pub fn image_src(&self, url: Option<&str>) -> String {
        url.filter(|url| image_host_allowed(url, &self.inner.config.image_hosts))
            .map_or_else(|| PLACEHOLDER_IMAGE.to_string(), String::from)
    }
}

/// Local fallback for product images.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

fn image_host_allowed(raw: &str, hosts: &[String]) -> bool {
    url::Url::parse(raw).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|host| hosts.iter().any(|allowed| allowed == host))
    })
}
