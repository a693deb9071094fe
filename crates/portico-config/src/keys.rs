//! Environment variable names understood by the loader.
//!
//! These are read verbatim, without any prefix, so that a service can be
//! configured with the same variables the gateway deployment already sets.

/// Header carrying the caller's user id.
pub const USERID_HEADER_KEY: &str = "USERID_HEADER_KEY";
/// Header carrying the caller's groups.
pub const GROUPS_HEADER_KEY: &str = "GROUPS_HEADER_KEY";
/// Header carrying the client type.
pub const CLIENTTYPE_HEADER_KEY: &str = "CLIENTTYPE_HEADER_KEY";
/// Header carrying the back-office flag.
pub const BACKOFFICE_HEADER_KEY: &str = "BACKOFFICE_HEADER_KEY";
/// Identity the gateway presents; requests without it are untrusted.
pub const MICROSERVICE_GATEWAY_SERVICE_NAME: &str = "MICROSERVICE_GATEWAY_SERVICE_NAME";

/// Where the gateway signal is read from: `header` or `peer`.
pub const GATEWAY_SIGNAL_SOURCE: &str = "GATEWAY_SIGNAL_SOURCE";
/// Header carrying the gateway signal when the source is `header`.
pub const GATEWAY_SIGNAL_HEADER_KEY: &str = "GATEWAY_SIGNAL_HEADER_KEY";
/// Single character separating group names.
pub const GROUPS_HEADER_DELIMITER: &str = "GROUPS_HEADER_DELIMITER";
/// Value of the back-office header that means `true`.
pub const BACKOFFICE_TRUTHY_TOKEN: &str = "BACKOFFICE_TRUTHY_TOKEN";

/// Interface to bind.
pub const HTTP_HOST: &str = "HTTP_HOST";
/// Port to bind.
pub const HTTP_PORT: &str = "HTTP_PORT";
/// Seconds to wait for in-flight connections on shutdown.
pub const SHUTDOWN_TIMEOUT_SECS: &str = "SHUTDOWN_TIMEOUT_SECS";
/// Whether to adopt an inbound `x-request-id`.
pub const TRUST_INBOUND_REQUEST_ID: &str = "TRUST_INBOUND_REQUEST_ID";

/// Log filter directive, e.g. `info` or `portico=debug`.
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Log output format: `json` or `pretty`.
pub const LOG_FORMAT: &str = "LOG_FORMAT";

/// Keys that must be present for the service to start.
pub const REQUIRED: [&str; 5] = [
    USERID_HEADER_KEY,
    GROUPS_HEADER_KEY,
    CLIENTTYPE_HEADER_KEY,
    BACKOFFICE_HEADER_KEY,
    MICROSERVICE_GATEWAY_SERVICE_NAME,
];
