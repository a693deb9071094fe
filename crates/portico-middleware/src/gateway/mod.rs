//! Gateway-trust context building.
//!
//! Three pure steps turn an inbound request into a [`RequestContext`]:
//!
//! ```text
//! headers ──extract──▶ RawHeaders ─┐
//!                                  ├─normalize──▶ RequestContext
//! signal ──validate──▶ TrustDecision┘
//! ```
//!
//! The steps hold no state and can run concurrently for any number of
//! requests. [`GatewayContextMiddleware`](crate::stages::GatewayContextMiddleware)
//! runs them in order and publishes the result into the request's scope.
//!
//! [`RequestContext`]: portico_core::RequestContext

mod extract;
mod forward;
mod normalize;
mod trust;

pub use extract::extract;
pub use forward::forward_headers;
pub use normalize::{normalize, parse_groups};
pub use trust::{observe_signal, validate, TrustDecision, UntrustedReason};
