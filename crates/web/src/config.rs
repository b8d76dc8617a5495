//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target local development.
//!
//! - `PEDALHUB_HOST` - Bind address (default: 127.0.0.1)
//! - `PEDALHUB_PORT` - Listen port (default: 3000)
//! - `PEDALHUB_BASE_URL` - Public URL of this site (default: <http://localhost:3000>)
//! - `BACKEND_API_URL` - Base URL of the backend REST API (default: <http://localhost:8080/api>)
//! - `BACKEND_TIMEOUT_SECS` - Outbound request timeout (default: 30)
//! - `IMAGE_REMOTE_HOSTS` - Comma-separated hosts allowed to serve product images
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Backend address used when `BACKEND_API_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/api";

/// Image hosts allowed when `IMAGE_REMOTE_HOSTS` is unset.
const DEFAULT_IMAGE_HOSTS: &str = "localhost,res.cloudinary.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for this site
    pub base_url: String,
    /// Backend REST API location
    pub backend: BackendConfig,
    /// Hosts allowed to serve remote product images
    pub image_hosts: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Normalized base URL (no trailing slash)
    pub base_url: BackendUrl,
    /// Timeout applied to every outbound request
    pub timeout: Duration,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PEDALHUB_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PEDALHUB_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PEDALHUB_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PEDALHUB_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("PEDALHUB_BASE_URL", "http://localhost:3000");

        let backend = BackendConfig::from_env()?;
        let image_hosts = parse_host_list(&get_env_or_default(
            "IMAGE_REMOTE_HOSTS",
            DEFAULT_IMAGE_HOSTS,
        ));

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            image_hosts,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at a given backend, with defaults for the rest.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend URL does not parse.
    pub fn for_backend(backend_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                base_url: BackendUrl::parse(backend_url)?,
                timeout: Duration::from_secs(30),
            },
            image_hosts: parse_host_list(DEFAULT_IMAGE_HOSTS),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = BackendUrl::parse(&get_env_or_default("BACKEND_API_URL", DEFAULT_BACKEND_URL))?;
        let timeout_secs = get_env_or_default("BACKEND_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BACKEND_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Backend URL
// =============================================================================

/// The backend's base URL, normalized for joining with request paths.
///
/// Trailing slashes are stripped. When the base already ends in `/api`, a
/// path that also starts with `/api/` has the duplicate prefix dropped, so
/// `http://host/api` + `/api/auth/login` becomes `http://host/api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl(String);

impl BackendUrl {
    /// Validate and normalize a base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the value is not an absolute
    /// http(s) URL.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |msg: String| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), msg);

        let trimmed = raw.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The normalized base.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a backend path (with or without a leading slash) onto the base.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let path = if self.0.ends_with("/api") {
            path.strip_prefix("api/").unwrap_or(path)
        } else {
            path
        };
        format!("{}/{}", self.0, path)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Split a comma-separated host list, dropping blanks.
fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_strips_trailing_slash() {
        let url = BackendUrl::parse("http://localhost:8080/api/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api");
    }

    #[test]
    fn test_backend_url_drops_duplicate_api_prefix() {
        let url = BackendUrl::parse("http://localhost:8080/api").unwrap();
        assert_eq!(
            url.join("/api/auth/login"),
            "http://localhost:8080/api/auth/login"
        );
        assert_eq!(url.join("/auth/login"), "http://localhost:8080/api/auth/login");
    }

    #[test]
    fn test_backend_url_without_api_suffix_keeps_path() {
        let url = BackendUrl::parse("https://backend.example.vn").unwrap();
        assert_eq!(
            url.join("/api/orders"),
            "https://backend.example.vn/api/orders"
        );
        assert_eq!(url.join("orders/7"), "https://backend.example.vn/orders/7");
    }

    #[test]
    fn test_backend_url_rejects_non_http() {
        assert!(BackendUrl::parse("ftp://files.example.vn").is_err());
        assert!(BackendUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_parse_host_list() {
        assert_eq!(
            parse_host_list(" Res.Cloudinary.com, ,localhost "),
            vec!["res.cloudinary.com".to_string(), "localhost".to_string()]
        );
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = WebConfig::for_backend(DEFAULT_BACKEND_URL).unwrap();
        assert_eq!(config.socket_addr().port(), 3000);
        assert!(!config.is_secure());
        config.base_url = "https://shop.example.vn".to_string();
        assert!(config.is_secure());
    }
}
