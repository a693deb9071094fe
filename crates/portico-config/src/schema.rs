//! Configuration file schema.
//!
//! Every field is optional: a file only overrides what it names, and the
//! required header keys may just as well come from the environment.
//!
//! ```toml
//! [headers]
//! user_id = "userid"
//! groups = "groups"
//! client_type = "clienttype"
//! backoffice = "backoffice"
//! gateway_service_name = "microservice-gateway.example.org"
//! gateway_signal_source = "header"
//! gateway_signal_header = "x-gateway-service-name"
//! groups_delimiter = ","
//! backoffice_truthy_token = "true"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! shutdown_timeout_secs = 10
//! trust_inbound_request_id = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::Deserialize;

use crate::keys;

/// Root of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub headers: FileHeaders,
    #[serde(default)]
    pub server: FileServer,
    #[serde(default)]
    pub logging: FileLogging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileHeaders {
    pub user_id: Option<String>,
    pub groups: Option<String>,
    pub client_type: Option<String>,
    pub backoffice: Option<String>,
    pub gateway_service_name: Option<String>,
    pub gateway_signal_source: Option<String>,
    pub gateway_signal_header: Option<String>,
    pub groups_delimiter: Option<String>,
    pub backoffice_truthy_token: Option<String>,
}

impl FileHeaders {
    /// Pairs each present value with the environment key it overrides.
    pub fn into_pairs(self) -> impl Iterator<Item = (&'static str, String)> {
        [
            (keys::USERID_HEADER_KEY, self.user_id),
            (keys::GROUPS_HEADER_KEY, self.groups),
            (keys::CLIENTTYPE_HEADER_KEY, self.client_type),
            (keys::BACKOFFICE_HEADER_KEY, self.backoffice),
            (keys::MICROSERVICE_GATEWAY_SERVICE_NAME, self.gateway_service_name),
            (keys::GATEWAY_SIGNAL_SOURCE, self.gateway_signal_source),
            (keys::GATEWAY_SIGNAL_HEADER_KEY, self.gateway_signal_header),
            (keys::GROUPS_HEADER_DELIMITER, self.groups_delimiter),
            (keys::BACKOFFICE_TRUTHY_TOKEN, self.backoffice_truthy_token),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileServer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub shutdown_timeout_secs: Option<u64>,
    pub trust_inbound_request_id: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileLogging {
    pub level: Option<String>,
    pub format: Option<String>,
}
