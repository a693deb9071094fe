//! # Portico
//!
//! **Gateway-trust request context for HTTP services**
//!
//! A service deployed behind the microservice gateway receives the caller's
//! identity as plain request headers. Portico turns those headers into a
//! typed, per-request [`RequestContext`](portico_core::RequestContext), and
//! only when the request provably came through the gateway:
//!
//! - **Trust anchored outside the identity headers** – a dedicated signal
//!   header or a transport peer identity, never the claims themselves
//! - **Empty context on spoofing** – an untrusted request carries no identity
//! - **Per-request isolation** – no context ever leaks between requests
//! - **Fixed pipeline** – request id, then context publication, then handler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portico::prelude::*;
//!
//! async fn orders(scope: ContextScope, _request: Request) -> HandlerResult {
//!     let ctx = scope.get()?;
//!     ctx.require_group("orders-reader")?;
//!     Ok(Response::json(http::StatusCode::OK, &ctx.user_id()))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_dotenv().with_env()?.load()?;
//!     init_logging(&LogConfig::from_settings(&config.logging, "orders"))?;
//!     Server::new(&config, orders).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → GatewayContext → Handler
//!                            │
//!           extract → validate → normalize → publish
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export core types
pub use portico_core as core;

// Re-export configuration
pub use portico_config as config;

// Re-export middleware types
pub use portico_middleware as middleware;

// Re-export logging setup
pub use portico_telemetry as telemetry;

// Re-export server types
pub use portico_server as server;

/// Prelude module for convenient imports.
///
/// ```
/// use portico::prelude::*;
///
/// let ctx = RequestContext::untrusted();
/// assert_eq!(ctx.client_type(), ClientType::Unknown);
/// ```
pub mod prelude {
    pub use portico_core::{
        ClientType, ContextScope, MisuseError, PeerIdentity, PorticoError, PorticoResult,
        RequestContext, RequestId,
    };

    pub use portico_config::{ConfigLoader, HeaderConfig, PorticoConfig};

    pub use portico_middleware::gateway::forward_headers;
    pub use portico_middleware::{Handler, HandlerResult, Request, Response, ResponseExt};

    pub use portico_telemetry::{init_logging, LogConfig};

    pub use portico_server::{Server, ShutdownSignal};
}
