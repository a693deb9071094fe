//! Server error types.

use std::net::SocketAddr;

use portico_config::ConfigError;
use thiserror::Error;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server settings do not describe a usable bind address.
    #[error("invalid server settings: {0}")]
    Config(#[from] ConfigError),

    /// Failed to bind to the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the listening socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
