//! Structured logging for Portico services.
//!
//! Log output goes to stdout through `tracing-subscriber`, either as one
//! JSON object per line (the default) or in a human-readable format for
//! local development. The level is an `EnvFilter` directive such as
//! `info` or `portico_middleware=debug`.
//!
//! # Example
//!
//! ```rust,ignore
//! use portico_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! tracing::info!(port = 3000, "listening");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
