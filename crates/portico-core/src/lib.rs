//! # Portico Core
//!
//! Core types for the Portico gateway-trust context layer.
//!
//! This crate provides the value types shared by every other Portico crate:
//!
//! - [`RequestContext`] - Normalized caller identity of one request
//! - [`ClientType`] - Enumeration of known client kinds
//! - [`RawHeaders`] - Unvalidated identity header values
//! - [`ContextScope`] - Per-request holder of the published context
//! - [`RequestId`] - UUID v7 request identifier
//! - [`PeerIdentity`] / [`PeerAddr`] - Transport facts attached by the server
//! - [`PorticoError`] / [`MisuseError`] - Error types

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client_type;
mod context;
mod error;
mod peer;
mod raw;
mod scope;

pub use client_type::ClientType;
pub use context::{RequestContext, RequestId};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, MisuseError, PorticoError, PorticoResult};
pub use peer::{PeerAddr, PeerIdentity};
pub use raw::RawHeaders;
pub use scope::{ContextScope, ContextState};
