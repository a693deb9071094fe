//! Liveness and readiness endpoints.
//!
//! - `GET /-/healthz` - always `200` while the process is serving
//! - `GET /-/ready` - `200` until shutdown starts, then `503`
//!
//! Neither endpoint runs the context pipeline.
//!
//! # Example
//!
//! ```
//! use portico_server::{HealthCheck, ReadinessCheck};
//!
//! let health = HealthCheck::new("orders", "1.4.0");
//! assert_eq!(health.status().name(), "orders");
//!
//! let readiness = ReadinessCheck::new();
//! assert!(readiness.is_ready());
//! readiness.set_ready(false);
//! assert!(!readiness.is_ready());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Path of the liveness endpoint.
pub const HEALTHZ_PATH: &str = "/-/healthz";

/// Path of the readiness endpoint.
pub const READY_PATH: &str = "/-/ready";

/// Body of the liveness endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
    name: String,
    version: String,
}

impl HealthStatus {
    /// Returns the status string, always `"OK"`.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Liveness check reporting the service name and version.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: String,
    version: String,
}

impl HealthCheck {
    /// Creates a health check for a service.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Returns the current health status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "OK".to_string(),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

/// Body of the readiness endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    ready: bool,
}

impl ReadinessStatus {
    /// Returns whether the service accepts traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Readiness flag, cleared when graceful shutdown begins.
///
/// Clones share the same flag.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    ready: Arc<AtomicBool>,
}

impl ReadinessCheck {
    /// Creates a readiness check that starts out ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns whether the service accepts traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Returns the readiness status body.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        ReadinessStatus {
            ready: self.is_ready(),
        }
    }

    /// Sets the readiness flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}
