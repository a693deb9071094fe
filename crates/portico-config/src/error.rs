//! Configuration errors.
//!
//! Every variant is fatal: a service whose gateway-trust settings cannot be
//! established must not start serving requests. Fields are named by the
//! environment key that sets them, so the message points an operator at the
//! variable to fix even when the value came from a file.

use std::path::PathBuf;
use thiserror::Error;

/// Why a [`PorticoConfig`](crate::PorticoConfig) could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("cannot read config file {path}")]
    ReadError {
        /// Path that failed.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid for the schema.
    #[error("malformed config file: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A key is set to a value that cannot be used.
    #[error("{field} is invalid: {reason}")]
    InvalidValue {
        /// Environment key of the offending setting.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A required key is unset or blank.
    #[error("{field} must be set")]
    MissingField {
        /// Environment key that is missing.
        field: String,
    },

    /// A numeric or boolean key does not parse.
    #[error("{var} could not be parsed: {reason}")]
    EnvParseError {
        /// Environment key.
        var: String,
        /// Expected form.
        reason: String,
    },

    /// Settings that are valid alone but conflict with each other, such as
    /// two identity fields sharing one header.
    #[error("conflicting header settings: {0}")]
    ValidationError(String),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Returns the environment key the error is about, if it concerns one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } | Self::MissingField { field } => Some(field),
            Self::EnvParseError { var, .. } => Some(var),
            _ => None,
        }
    }
}
