//! Header extraction.

use http::header::HeaderMap;
use http::HeaderName;
use portico_config::HeaderConfig;
use portico_core::RawHeaders;

/// Reads the four configured identity headers.
///
/// Lookups are case-insensitive because [`HeaderName`]s are lower-cased.
/// When a header is repeated the first value wins. Values are decoded as
/// UTF-8, so `josé` survives; a value that is not valid UTF-8 is treated as
/// absent.
///
/// # Example
///
/// ```
/// use http::{HeaderMap, HeaderName};
/// use portico_config::HeaderConfig;
/// use portico_middleware::gateway::extract;
///
/// let config = HeaderConfig::builder()
///     .user_id_header("userid")
///     .groups_header("groups")
///     .client_type_header("clienttype")
///     .backoffice_header("backoffice")
///     .expected_gateway_signature("gw")
///     .build()
///     .unwrap();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(HeaderName::from_bytes(b"UserId").unwrap(), "u1".parse().unwrap());
///
/// let raw = extract(&config, &headers);
/// assert_eq!(raw.user_id.as_deref(), Some("u1"));
/// assert!(raw.groups.is_none());
/// ```
#[must_use]
pub fn extract(config: &HeaderConfig, headers: &HeaderMap) -> RawHeaders {
    RawHeaders {
        user_id: first_value(headers, config.user_id_header()),
        groups: first_value(headers, config.groups_header()),
        client_type: first_value(headers, config.client_type_header()),
        backoffice: first_value(headers, config.backoffice_header()),
    }
}

pub(crate) fn first_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .map(ToString::to_string)
}
