//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, a TOML file, explicit key/value pairs, and
//! the process environment.

use std::env;
use std::fs;
use std::path::Path;

use crate::config::{HeaderConfigBuilder, LogFormat, LoggingSettings, ServerSettings};
use crate::schema::FileConfig;
use crate::{keys, ConfigError, PorticoConfig};

/// Configuration loader with layered approach.
///
/// Layers are applied in call order, later layers overriding earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML)
/// 3. Key/value pairs or environment variables
///
/// Validation happens once, in [`load`](Self::load).
///
/// # Example
///
/// ```
/// use portico_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_vars([
///         ("USERID_HEADER_KEY", "userid"),
///         ("GROUPS_HEADER_KEY", "groups"),
///         ("CLIENTTYPE_HEADER_KEY", "clienttype"),
///         ("BACKOFFICE_HEADER_KEY", "backoffice"),
///         ("MICROSERVICE_GATEWAY_SERVICE_NAME", "microservice-gateway.example.org"),
///     ])
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.headers.groups_header().as_str(), "groups");
/// assert_eq!(config.server.port, 3000);
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    headers: HeaderConfigBuilder,
    server: ServerSettings,
    logging: LoggingSettings,
}

impl ConfigLoader {
    /// Create a new configuration loader holding default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML or unknown fields
    ///
    /// # Example
    ///
    /// ```no_run
    /// use portico_config::ConfigLoader;
    ///
    /// # fn main() -> Result<(), portico_config::ConfigError> {
    /// let loader = ConfigLoader::new()
    ///     .with_file("portico.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.with_string(&content)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use portico_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     port = 8080
    /// "#;
    ///
    /// let loader = ConfigLoader::new().with_string(toml).unwrap();
    /// ```
    pub fn with_string(mut self, content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content)?;

        for (key, value) in file.headers.into_pairs() {
            self.headers.apply(key, &value);
        }

        if let Some(host) = file.server.host {
            self.server.host = host;
        }
        if let Some(port) = file.server.port {
            self.server.port = port;
        }
        if let Some(secs) = file.server.shutdown_timeout_secs {
            self.server.shutdown_timeout_secs = secs;
        }
        if let Some(trust) = file.server.trust_inbound_request_id {
            self.server.trust_inbound_request_id = trust;
        }

        if let Some(level) = file.logging.level {
            self.logging.level = level;
        }
        if let Some(format) = file.logging.format {
            self.logging.format = parse_log_format(&format)
                .ok_or_else(|| ConfigError::invalid_value("logging.format", "expected 'json' or 'pretty'"))?;
        }

        Ok(self)
    }

    /// Apply explicit key/value pairs, using the environment variable names
    /// from [`keys`](crate::keys).
    ///
    /// This is what tests use to boot a service with a fixed set of
    /// variables without touching the process environment. Unknown keys are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` if a numeric or boolean value
    /// cannot be parsed.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self.apply_var(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Apply the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` if a recognised variable cannot
    /// be parsed.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(env::vars())
    }

    /// Load a `.env` file into the process environment.
    ///
    /// Uses the `dotenvy` crate. A missing file is not an error; call
    /// [`with_env`](Self::with_env) afterwards to pick the values up.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env file"),
        }
        self
    }

    /// Finalize and return the validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required header key is missing or any
    /// value fails validation.
    pub fn load(self) -> Result<PorticoConfig, ConfigError> {
        let headers = self.headers.build()?;
        self.server.socket_addr()?;

        Ok(PorticoConfig {
            headers,
            server: self.server,
            logging: self.logging,
        })
    }

    // Apply a single key
    fn apply_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if self.headers.apply(key, value) {
            return Ok(());
        }

        match key {
            keys::HTTP_HOST => {
                self.server.host = value.to_string();
            }
            keys::HTTP_PORT => {
                self.server.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?;
            }
            keys::SHUTDOWN_TIMEOUT_SECS => {
                self.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            keys::TRUST_INBOUND_REQUEST_ID => {
                self.server.trust_inbound_request_id = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            keys::LOG_LEVEL => {
                self.logging.level = value.to_string();
            }
            keys::LOG_FORMAT => {
                self.logging.format = parse_log_format(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }

            // Unrelated variable
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_log_format(s: &str) -> Option<LogFormat> {
    match s.to_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" => Some(LogFormat::Pretty),
        _ => None,
    }
}
