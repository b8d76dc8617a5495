//! Security headers middleware.
//!
//! Locked down by default. The only loosening is `img-src`, which admits the
//! configured product image hosts and `data:` URIs for the bank-transfer QR
//! code, and `connect-src 'self'` for the countdown event stream.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Build the `Content-Security-Policy` value for the given image hosts.
///
/// ```text
/// default-src 'none'; script-src 'self'; style-src 'self'; font-src 'self';
/// img-src 'self' data: https://<host> ...; connect-src 'self';
/// frame-src 'none'; object-src 'none'; base-uri 'self';
/// form-action 'self'; frame-ancestors 'none'
/// ```
#[must_use]
pub fn content_security_policy(image_hosts: &[String]) -> String {
    let mut img_src = String::from("'self' data:");
    for host in image_hosts {
        img_src.push_str(" https://");
        img_src.push_str(host);
        if host == "localhost" {
            img_src.push_str(" http://localhost:*");
        }
    }

    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         font-src 'self'; \
         img-src {img_src}; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, state.csp().clone());

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             geolocation=(), \
             microphone=(), \
             payment=(), \
             usb=(), \
             interest-cohort=()",
        ),
    );

    // Pages show orders and payment details; static assets set their own.
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_img_src_lists_whitelisted_hosts_and_data() {
        let csp = content_security_policy(&["res.cloudinary.com".to_string()]);
        assert!(csp.contains("img-src 'self' data: https://res.cloudinary.com;"));
        assert!(csp.contains("default-src 'none'"));
    }

    #[test]
    fn test_localhost_allows_plain_http() {
        let csp = content_security_policy(&["localhost".to_string()]);
        assert!(csp.contains("https://localhost http://localhost:*"));
    }

    #[test]
    fn test_policy_is_a_valid_header_value() {
        let csp = content_security_policy(&["localhost".to_string(), "cdn.example.com".to_string()]);
        assert!(HeaderValue::from_str(&csp).is_ok());
    }
}
