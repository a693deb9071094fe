//! Identity forwarding for outbound calls.

use http::header::{HeaderMap, HeaderValue};
use portico_config::HeaderConfig;
use portico_core::RequestContext;

/// Rebuilds the identity headers for a call to another service behind the
/// same gateway.
///
/// Untrusted contexts forward nothing. Fields at their default value are
/// omitted, and a value that cannot be encoded as a header is skipped.
/// The gateway signal itself is never forwarded.
///
/// # Example
///
/// ```
/// use portico_config::HeaderConfig;
/// use portico_core::{ClientType, RequestContext};
/// use portico_middleware::gateway::forward_headers;
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
/// let ctx = RequestContext::trusted(
///     Some("u1".to_string()),
///     vec!["admin".to_string(), "ops".to_string()],
///     ClientType::WebApp,
///     false,
/// );
///
/// let headers = forward_headers(&config, &ctx);
/// assert_eq!(headers["groups"], "admin,ops");
/// assert!(!headers.contains_key("backoffice"));
/// ```
#[must_use]
pub fn forward_headers(config: &HeaderConfig, context: &RequestContext) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if !context.is_trusted() {
        return headers;
    }

    if let Some(value) = context.user_id().and_then(encode) {
        headers.insert(config.user_id_header().clone(), value);
    }

    if !context.groups().is_empty() {
        let mut buf = [0; 4];
        let delimiter: &str = config.groups_delimiter().encode_utf8(&mut buf);
        let joined = context.groups().join(delimiter);
        if let Some(value) = encode(&joined) {
            headers.insert(config.groups_header().clone(), value);
        }
    }

    if context.client_type().is_known() {
        headers.insert(
            config.client_type_header().clone(),
            HeaderValue::from_static(context.client_type().as_str()),
        );
    }

    if context.is_backoffice() {
        if let Some(value) = encode(config.backoffice_truthy_token()) {
            headers.insert(config.backoffice_header().clone(), value);
        }
    }

    headers
}

fn encode(value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(value).ok()
}
