//! # Portico Middleware
//!
//! The gateway-trust context pipeline.
//!
//! Every request runs through the same fixed stages before it reaches a
//! handler:
//!
//! ```text
//! Request → RequestId → GatewayContext → Handler
//!                           │
//!          extract → validate → normalize → publish
//! ```
//!
//! | Stage | Middleware       | Purpose                                      |
//! |-------|------------------|----------------------------------------------|
//! | 1     | Request ID       | Generate/adopt request ID (UUID v7)          |
//! | 2     | Gateway Context  | Publish the caller context for this request  |
//!
//! The per-request [`ContextScope`](portico_core::ContextScope) lives in the
//! request's [`MiddlewareContext`]; there is no state shared between
//! requests apart from the immutable configuration.
//!
//! ## Example
//!
//! ```
//! use portico_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[1].name(), "gateway_context");
//! ```

#![doc(html_root_url = "https://docs.rs/portico-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod gateway;
pub mod handler;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::MiddlewareContext;
pub use handler::{BoxedHandler, Handler, HandlerResult};
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use types::{Request, Response, ResponseExt};
