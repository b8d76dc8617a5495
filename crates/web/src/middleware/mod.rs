//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, ...)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Route guard (cookie presence, matcher prefixes only)
//! 7. Rejected-token sign-out (clears the session when the backend says 401)

pub mod auth;
pub mod guard;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalSession, RequireAdmin, RequireSession, SessionRejection, WebSession};
pub use guard::{GuardConfig, GuardDecision, evaluate, route_guard};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, end_rejected_session};
