//! Core middleware stages.
//!
//! The stages run in a fixed order before every handler:
//!
//! 1. [`request_id`] - Generate or adopt the request ID
//! 2. [`gateway_context`] - Extract, validate, normalize and publish the
//!    caller context

pub mod gateway_context;
pub mod request_id;

pub use gateway_context::GatewayContextMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
