//! HTTP middleware for the sync service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (only when origins are configured)
//! 5. App Proxy signature (sync routes only, when a secret is configured)

pub mod app_proxy;
pub mod request_id;

pub use app_proxy::{require_app_proxy_signature, verify_app_proxy_signature};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
