//! Typed configuration for Portico services.
//!
//! This crate turns environment variables (and optionally a TOML file) into
//! an immutable [`PorticoConfig`]:
//!
//! - [`HeaderConfig`] - identity header names and the gateway trust policy
//! - [`ServerSettings`] - bind address and shutdown timeout
//! - [`LoggingSettings`] - log filter and output format
//!
//! Loading fails with a [`ConfigError`] if any required header key is
//! missing, which must prevent the service from starting.
//!
//! # Example
//!
//! ```no_run
//! use portico_config::ConfigLoader;
//!
//! # fn main() -> Result<(), portico_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_optional_file("portico.toml")?
//!     .with_env()?
//!     .load()?;
//!
//! println!("gateway: {}", config.headers.expected_gateway_signature());
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `USERID_HEADER_KEY` | header carrying the user id (required) |
//! | `GROUPS_HEADER_KEY` | header carrying the group list (required) |
//! | `CLIENTTYPE_HEADER_KEY` | header carrying the client type (required) |
//! | `BACKOFFICE_HEADER_KEY` | header carrying the back-office flag (required) |
//! | `MICROSERVICE_GATEWAY_SERVICE_NAME` | gateway identity that grants trust (required) |
//! | `GATEWAY_SIGNAL_SOURCE` | `header` (default) or `peer` |
//! | `GATEWAY_SIGNAL_HEADER_KEY` | signal header, default `x-gateway-service-name` |
//! | `GROUPS_HEADER_DELIMITER` | group separator, default `,` |
//! | `BACKOFFICE_TRUTHY_TOKEN` | back-office value meaning true, default `true` |
//! | `HTTP_HOST` / `HTTP_PORT` | bind address, default `0.0.0.0:3000` |
//! | `SHUTDOWN_TIMEOUT_SECS` | graceful shutdown timeout, default 10 |
//! | `TRUST_INBOUND_REQUEST_ID` | adopt inbound `x-request-id`, default false |
//! | `LOG_LEVEL` / `LOG_FORMAT` | log filter and `json`/`pretty` |

#![warn(missing_docs)]

mod config;
mod error;
pub mod keys;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
