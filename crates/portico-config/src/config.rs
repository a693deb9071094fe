//! Main configuration types.
//!
//! [`PorticoConfig`] is built once at startup by the
//! [`ConfigLoader`](crate::ConfigLoader) and never changes afterwards. The
//! gateway-trust part of it, [`HeaderConfig`], is injected into the context
//! pipeline as an immutable value.

use http::HeaderName;
use std::net::SocketAddr;
use std::time::Duration;

use crate::keys;
use crate::ConfigError;

/// Default header carrying the gateway signal.
pub const DEFAULT_GATEWAY_SIGNAL_HEADER: &str = "x-gateway-service-name";

/// Default separator between group names.
pub const DEFAULT_GROUPS_DELIMITER: char = ',';

/// Default back-office truthy token.
pub const DEFAULT_BACKOFFICE_TRUTHY_TOKEN: &str = "true";

/// Default bind host.
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Complete Portico service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PorticoConfig {
    /// Gateway-trust header configuration.
    pub headers: HeaderConfig,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// The channel the gateway signal is observed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewaySignal {
    /// A dedicated header the gateway sets and strips from external traffic.
    Header(HeaderName),
    /// An identity the transport attaches to the request, such as the
    /// subject of a verified client certificate.
    PeerIdentity,
}

impl Default for GatewaySignal {
    fn default() -> Self {
        Self::Header(HeaderName::from_static(DEFAULT_GATEWAY_SIGNAL_HEADER))
    }
}

/// Header names and trust policy for gateway-forwarded identity.
///
/// Header names are stored lower-cased as [`HeaderName`] values, so lookups
/// are case-insensitive. Instances can only be obtained through
/// [`HeaderConfig::builder`], which validates every field.
///
/// # Example
///
/// ```
/// use portico_config::HeaderConfig;
///
/// let config = HeaderConfig::builder()
///     .user_id_header("UserId")
///     .groups_header("groups")
///     .client_type_header("clienttype")
///     .backoffice_header("backoffice")
///     .expected_gateway_signature("microservice-gateway.example.org")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.user_id_header().as_str(), "userid");
/// assert_eq!(config.groups_delimiter(), ',');
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    user_id_header: HeaderName,
    groups_header: HeaderName,
    client_type_header: HeaderName,
    backoffice_header: HeaderName,
    expected_gateway_signature: String,
    gateway_signal: GatewaySignal,
    groups_delimiter: char,
    backoffice_truthy_token: String,
}

impl HeaderConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> HeaderConfigBuilder {
        HeaderConfigBuilder::default()
    }

    /// Header carrying the user id.
    #[must_use]
    pub fn user_id_header(&self) -> &HeaderName {
        &self.user_id_header
    }

    /// Header carrying the groups list.
    #[must_use]
    pub fn groups_header(&self) -> &HeaderName {
        &self.groups_header
    }

    /// Header carrying the client type.
    #[must_use]
    pub fn client_type_header(&self) -> &HeaderName {
        &self.client_type_header
    }

    /// Header carrying the back-office flag.
    #[must_use]
    pub fn backoffice_header(&self) -> &HeaderName {
        &self.backoffice_header
    }

    /// The gateway identity a request must present to be trusted.
    #[must_use]
    pub fn expected_gateway_signature(&self) -> &str {
        &self.expected_gateway_signature
    }

    /// Where the gateway signal is read from.
    #[must_use]
    pub fn gateway_signal(&self) -> &GatewaySignal {
        &self.gateway_signal
    }

    /// Separator between group names.
    #[must_use]
    pub fn groups_delimiter(&self) -> char {
        self.groups_delimiter
    }

    /// Back-office value meaning `true`, matched ASCII-case-insensitively.
    #[must_use]
    pub fn backoffice_truthy_token(&self) -> &str {
        &self.backoffice_truthy_token
    }

    /// The four identity header names, in a fixed order.
    #[must_use]
    pub fn identity_headers(&self) -> [&HeaderName; 4] {
        [
            &self.user_id_header,
            &self.groups_header,
            &self.client_type_header,
            &self.backoffice_header,
        ]
    }
}

/// Builder for [`HeaderConfig`].
///
/// Values are kept as plain strings until [`build`](Self::build), so the
/// loader can fill them from any source and report errors by key name.
#[derive(Debug, Clone, Default)]
pub struct HeaderConfigBuilder {
    user_id_header: Option<String>,
    groups_header: Option<String>,
    client_type_header: Option<String>,
    backoffice_header: Option<String>,
    expected_gateway_signature: Option<String>,
    gateway_signal_source: Option<String>,
    gateway_signal_header: Option<String>,
    groups_delimiter: Option<String>,
    backoffice_truthy_token: Option<String>,
}

impl HeaderConfigBuilder {
    /// Sets the user id header name.
    #[must_use]
    pub fn user_id_header(mut self, name: impl Into<String>) -> Self {
        self.user_id_header = Some(name.into());
        self
    }

    /// Sets the groups header name.
    #[must_use]
    pub fn groups_header(mut self, name: impl Into<String>) -> Self {
        self.groups_header = Some(name.into());
        self
    }

    /// Sets the client type header name.
    #[must_use]
    pub fn client_type_header(mut self, name: impl Into<String>) -> Self {
        self.client_type_header = Some(name.into());
        self
    }

    /// Sets the back-office header name.
    #[must_use]
    pub fn backoffice_header(mut self, name: impl Into<String>) -> Self {
        self.backoffice_header = Some(name.into());
        self
    }

    /// Sets the gateway identity requests must present.
    #[must_use]
    pub fn expected_gateway_signature(mut self, signature: impl Into<String>) -> Self {
        self.expected_gateway_signature = Some(signature.into());
        self
    }

    /// Reads the gateway signal from the given header.
    #[must_use]
    pub fn gateway_signal_header(mut self, name: impl Into<String>) -> Self {
        self.gateway_signal_source = Some("header".to_string());
        self.gateway_signal_header = Some(name.into());
        self
    }

    /// Reads the gateway signal from the transport-level peer identity.
    #[must_use]
    pub fn gateway_signal_from_peer(mut self) -> Self {
        self.gateway_signal_source = Some("peer".to_string());
        self
    }

    /// Sets the group separator.
    #[must_use]
    pub fn groups_delimiter(mut self, delimiter: char) -> Self {
        self.groups_delimiter = Some(delimiter.to_string());
        self
    }

    /// Sets the back-office truthy token.
    #[must_use]
    pub fn backoffice_truthy_token(mut self, token: impl Into<String>) -> Self {
        self.backoffice_truthy_token = Some(token.into());
        self
    }

    /// Applies a single environment-style key. Returns `false` for keys
    /// that do not belong to the header configuration.
    pub(crate) fn apply(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            keys::USERID_HEADER_KEY => &mut self.user_id_header,
            keys::GROUPS_HEADER_KEY => &mut self.groups_header,
            keys::CLIENTTYPE_HEADER_KEY => &mut self.client_type_header,
            keys::BACKOFFICE_HEADER_KEY => &mut self.backoffice_header,
            keys::MICROSERVICE_GATEWAY_SERVICE_NAME => &mut self.expected_gateway_signature,
            keys::GATEWAY_SIGNAL_SOURCE => &mut self.gateway_signal_source,
            keys::GATEWAY_SIGNAL_HEADER_KEY => &mut self.gateway_signal_header,
            keys::GROUPS_HEADER_DELIMITER => &mut self.groups_delimiter,
            keys::BACKOFFICE_TRUTHY_TOKEN => &mut self.backoffice_truthy_token,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    /// Validates the collected values and builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if a required key is absent or blank
    /// - [`ConfigError::InvalidValue`] if a header name is not a valid HTTP
    ///   header name, the delimiter is not a single visible character, or
    ///   the signal source is unknown
    /// - [`ConfigError::ValidationError`] if two identity headers share a
    ///   name, or the gateway signal header is also an identity header
    pub fn build(self) -> Result<HeaderConfig, ConfigError> {
        let user_id_header = header_name(keys::USERID_HEADER_KEY, self.user_id_header)?;
        let groups_header = header_name(keys::GROUPS_HEADER_KEY, self.groups_header)?;
        let client_type_header = header_name(keys::CLIENTTYPE_HEADER_KEY, self.client_type_header)?;
        let backoffice_header = header_name(keys::BACKOFFICE_HEADER_KEY, self.backoffice_header)?;
        let expected_gateway_signature = required(
            keys::MICROSERVICE_GATEWAY_SERVICE_NAME,
            self.expected_gateway_signature,
        )?;

        let identity = [
            &user_id_header,
            &groups_header,
            &client_type_header,
            &backoffice_header,
        ];
        for (i, a) in identity.iter().enumerate() {
            if identity[i + 1..].contains(a) {
                return Err(ConfigError::validation_error(format!(
                    "header '{a}' is configured for more than one identity field"
                )));
            }
        }

        let gateway_signal = match self.gateway_signal_source.as_deref().map(str::trim) {
            None | Some("header") => {
                let name = match self.gateway_signal_header {
                    Some(name) => header_name(keys::GATEWAY_SIGNAL_HEADER_KEY, Some(name))?,
                    None => HeaderName::from_static(DEFAULT_GATEWAY_SIGNAL_HEADER),
                };
                if identity.contains(&&name) {
                    return Err(ConfigError::validation_error(format!(
                        "gateway signal header '{name}' must differ from the identity headers"
                    )));
                }
                GatewaySignal::Header(name)
            }
            Some("peer") => GatewaySignal::PeerIdentity,
            Some(other) => {
                return Err(ConfigError::invalid_value(
                    keys::GATEWAY_SIGNAL_SOURCE,
                    format!("expected 'header' or 'peer', got '{other}'"),
                ))
            }
        };

        let groups_delimiter = match self.groups_delimiter {
            None => DEFAULT_GROUPS_DELIMITER,
            Some(raw) => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() && !c.is_control() => c,
                    _ => {
                        return Err(ConfigError::invalid_value(
                            keys::GROUPS_HEADER_DELIMITER,
                            "expected a single visible character",
                        ))
                    }
                }
            }
        };

        let backoffice_truthy_token = match self.backoffice_truthy_token {
            None => DEFAULT_BACKOFFICE_TRUTHY_TOKEN.to_string(),
            token => required(keys::BACKOFFICE_TRUTHY_TOKEN, token)?,
        };

        Ok(HeaderConfig {
            user_id_header,
            groups_header,
            client_type_header,
            backoffice_header,
            expected_gateway_signature,
            gateway_signal,
            groups_delimiter,
            backoffice_truthy_token,
        })
    }
}

fn required(key: &str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::missing_field(key)),
    }
}

fn header_name(key: &str, value: Option<String>) -> Result<HeaderName, ConfigError> {
    let value = required(key, value)?;
    HeaderName::from_bytes(value.to_ascii_lowercase().as_bytes()).map_err(|_| {
        ConfigError::invalid_value(key, format!("'{value}' is not a valid HTTP header name"))
    })
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// How long to wait for in-flight connections on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Whether to adopt an inbound `x-request-id` header.
    pub trust_inbound_request_id: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            trust_inbound_request_id: false,
        }
    }
}

impl ServerSettings {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if host and port do not form a
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                ConfigError::invalid_value(
                    keys::HTTP_HOST,
                    format!("'{}:{}' is not a valid socket address", self.host, self.port),
                )
            })
    }

    /// Returns the shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, for local development.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive passed to the subscriber.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> HeaderConfigBuilder {
        HeaderConfig::builder()
            .user_id_header("userid")
            .groups_header("groups")
            .client_type_header("clienttype")
            .backoffice_header("backoffice")
            .expected_gateway_signature("microservice-gateway.example.org")
    }

    #[test]
    fn test_build_with_defaults() {
        let config = base().build().unwrap();
        assert_eq!(config.user_id_header().as_str(), "userid");
        assert_eq!(
            config.expected_gateway_signature(),
            "microservice-gateway.example.org"
        );
        assert_eq!(config.gateway_signal(), &GatewaySignal::default());
        assert_eq!(config.groups_delimiter(), ',');
        assert_eq!(config.backoffice_truthy_token(), "true");
    }

    #[test]
    fn test_header_names_are_lowercased() {
        let config = base().client_type_header("X-Client-Type").build().unwrap();
        assert_eq!(config.client_type_header().as_str(), "x-client-type");
    }

    #[test]
    fn test_missing_required_field() {
        let err = HeaderConfig::builder()
            .user_id_header("userid")
            .groups_header("groups")
            .client_type_header("clienttype")
            .backoffice_header("backoffice")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField { ref field } if field == "MICROSERVICE_GATEWAY_SERVICE_NAME"
        ));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = base().groups_header("   ").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "GROUPS_HEADER_KEY"));
    }

    #[test]
    fn test_invalid_header_name() {
        let err = base().user_id_header("user id").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "USERID_HEADER_KEY"));
    }

    #[test]
    fn test_duplicate_identity_headers_rejected() {
        let err = base().groups_header("UserId").build().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_signal_header_must_not_be_identity_header() {
        let err = base().gateway_signal_header("userid").build().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_peer_signal() {
        let config = base().gateway_signal_from_peer().build().unwrap();
        assert_eq!(config.gateway_signal(), &GatewaySignal::PeerIdentity);
    }

    #[test]
    fn test_unknown_signal_source() {
        let mut builder = base();
        assert!(builder.apply(keys::GATEWAY_SIGNAL_SOURCE, "carrier-pigeon"));
        assert!(matches!(
            builder.build().unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_delimiter_must_be_single_char() {
        let mut builder = base();
        builder.apply(keys::GROUPS_HEADER_DELIMITER, ";;");
        assert!(builder.build().is_err());

        let config = base().groups_delimiter(';').build().unwrap();
        assert_eq!(config.groups_delimiter(), ';');
    }

    #[test]
    fn test_apply_ignores_foreign_keys() {
        let mut builder = HeaderConfig::builder();
        assert!(!builder.apply("HTTP_PORT", "3000"));
        assert!(builder.apply(keys::USERID_HEADER_KEY, "userid"));
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerSettings::default();
        assert_eq!(server.socket_addr().unwrap().port(), 3000);

        let bad = ServerSettings {
            host: "not a host".to_string(),
            ..ServerSettings::default()
        };
        assert!(bad.socket_addr().is_err());
    }
}
