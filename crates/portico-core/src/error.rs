//! Error types for Portico.
//!
//! Two families of errors live here:
//!
//! - [`MisuseError`] signals a programming defect in the context pipeline,
//!   such as reading the context of a request before it was published.
//! - [`PorticoError`] is the handler-facing error type. It is categorised,
//!   maps onto an HTTP status code, and renders to a JSON error envelope.
//!
//! Malformed identity headers are deliberately absent from both: they
//! degrade to safe defaults during normalization and never fail a request.

use crate::scope::ContextState;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`PorticoError`].
pub type PorticoResult<T> = Result<T, PorticoError>;

/// Violations of the per-request context lifecycle.
///
/// Each variant means the pipeline ordering was broken by the code calling
/// into a [`ContextScope`](crate::ContextScope); none of them are caused by
/// request content.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisuseError {
    /// The context was read before it was published.
    #[error("request context read before it was published (scope is {state})")]
    NotPublished {
        /// The state the scope was in when `get` was called.
        state: ContextState,
    },

    /// The context was published twice for the same request.
    #[error("request context already published for this request")]
    AlreadyPublished,

    /// A pipeline transition skipped or repeated a state.
    #[error("invalid context transition from {from} to {to}")]
    OutOfOrder {
        /// The current state.
        from: ContextState,
        /// The requested state.
        to: ContextState,
    },
}

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller is not identified (no trusted user id).
    Authentication,
    /// The caller is identified but lacks a required group.
    Authorization,
    /// Resource not found.
    NotFound,
    /// Internal server errors, including context misuse.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type returned by request handlers.
///
/// # Example
///
/// ```
/// use portico_core::{ErrorCategory, PorticoError};
///
/// let error = PorticoError::authorization("group 'admin' required");
/// assert_eq!(error.category(), ErrorCategory::Authorization);
/// assert_eq!(error.status_code().as_u16(), 403);
/// ```
#[derive(Error, Debug)]
pub enum PorticoError {
    /// The request carries no trusted caller identity.
    #[error("Authentication required: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// The caller lacks a required group membership.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
        /// The group that was required, if any.
        required_group: Option<String>,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The context pipeline was driven out of order.
    #[error("Context misuse: {0}")]
    Misuse(#[from] MisuseError),
}

impl PorticoError {
    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            required_group: None,
        }
    }

    /// Creates an authorization error naming the missing group.
    #[must_use]
    pub fn missing_group(group: impl Into<String>) -> Self {
        let group = group.into();
        Self::Authorization {
            message: format!("membership in group '{group}' is required"),
            required_group: Some(group),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Internal { .. } | Self::Misuse(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Internal errors never expose their message or source; clients only
    /// see a generic message and the request id to quote in support cases.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let message = match self.category() {
            ErrorCategory::Internal => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                category: self.category(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Returns a machine-readable error code.
    fn error_code(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "AUTHENTICATION_REQUIRED",
            Self::Authorization { .. } => "AUTHORIZATION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Misuse(_) => "CONTEXT_MISUSE",
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Authorization {
                required_group: Some(group),
                ..
            } => Some(serde_json::json!({ "required_group": group })),
            _ => None,
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
