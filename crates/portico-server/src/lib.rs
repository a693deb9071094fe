//! # Portico Server
//!
//! Hosts a Portico service over HTTP/1.1.
//!
//! - Hyper on Tokio, one task per connection
//! - Every request runs through the gateway pipeline before the handler
//! - `/-/healthz` and `/-/ready` answered without touching the pipeline
//! - Graceful shutdown on SIGTERM/SIGINT or [`ShutdownSignal::trigger`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use portico_config::ConfigLoader;
//! use portico_core::ContextScope;
//! use portico_middleware::{HandlerResult, Request, Response, ResponseExt};
//! use portico_server::Server;
//!
//! async fn whoami(scope: ContextScope, _request: Request) -> HandlerResult {
//!     Ok(Response::json(http::StatusCode::OK, scope.get()?))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env()?.load()?;
//!     Server::new(&config, whoami).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod health;
mod server;
pub mod shutdown;

pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use server::{PeerIdentityResolver, Server, DEFAULT_REQUEST_TIMEOUT};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
