//! # Observability Module
//!
//! - **Structured Logging**: pretty or JSON logs through `tracing`
//! - **Request Tracing**: request ID propagation across handlers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::Router;
//! use vibe_node::observability::{init_logging, request_id_middleware};
//!
//! init_logging("info", true);
//!
//! let app: Router<()> = Router::new().layer(axum::middleware::from_fn(request_id_middleware));
//! ```

mod logging;
pub mod middleware;

pub use logging::{init_logging, LogFormat};
pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
