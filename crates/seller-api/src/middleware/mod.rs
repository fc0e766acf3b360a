//! HTTP middleware for the seller API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. CORS (browser calls from the storefront origin)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//!
//! Bearer tokens are checked per handler through the [`Caller`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, Caller};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
