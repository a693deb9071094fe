//! Context normalization.
//!
//! Every input degrades to a safe default. Nothing in here can fail a
//! request.

use portico_config::HeaderConfig;
use portico_core::{ClientType, RawHeaders, RequestContext};

use super::trust::TrustDecision;

/// Builds the [`RequestContext`] for one request.
///
/// Untrusted requests always get [`RequestContext::untrusted`], whatever
/// their headers say. The function is pure: the same inputs always give the
/// same context.
///
/// # Example
///
/// ```
/// use portico_config::HeaderConfig;
/// use portico_core::{ClientType, RawHeaders};
/// use portico_middleware::gateway::{normalize, TrustDecision};
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
/// let raw = RawHeaders {
///     user_id: Some("u1".to_string()),
///     groups: Some("a, b,,c ".to_string()),
///     client_type: Some("tv-app".to_string()),
///     backoffice: None,
/// };
///
/// let ctx = normalize(&config, &raw, TrustDecision::Trusted);
/// assert_eq!(ctx.groups(), ["a", "b", "c"]);
/// assert_eq!(ctx.client_type(), ClientType::Unknown);
/// assert!(!ctx.is_backoffice());
/// ```
#[must_use]
pub fn normalize(config: &HeaderConfig, raw: &RawHeaders, decision: TrustDecision) -> RequestContext {
    if !decision.is_trusted() {
        return RequestContext::untrusted();
    }

    RequestContext::trusted(
        raw.user_id.clone(),
        raw.groups
            .as_deref()
            .map(|value| parse_groups(value, config.groups_delimiter()))
            .unwrap_or_default(),
        raw.client_type
            .as_deref()
            .map_or(ClientType::Unknown, ClientType::parse),
        raw.backoffice
            .as_deref()
            .is_some_and(|value| is_truthy(value, config.backoffice_truthy_token())),
    )
}

/// Splits a group list, trimming each entry and dropping empty ones.
#[must_use]
pub fn parse_groups(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn is_truthy(value: &str, token: &str) -> bool {
    value.trim().eq_ignore_ascii_case(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::trust::UntrustedReason;

    fn config() -> HeaderConfig {
        HeaderConfig::builder()
            .user_id_header("userid")
            .groups_header("groups")
            .client_type_header("clienttype")
            .backoffice_header("backoffice")
            .expected_gateway_signature("microservice-gateway.example.org")
            .build()
            .unwrap()
    }

    fn full_raw() -> RawHeaders {
        RawHeaders {
            user_id: Some("u1".to_string()),
            groups: Some("admin,ops".to_string()),
            client_type: Some("backoffice-app".to_string()),
            backoffice: Some("true".to_string()),
        }
    }

    #[test]
    fn test_trusted_request() {
        let ctx = normalize(&config(), &full_raw(), TrustDecision::Trusted);
        assert_eq!(
            ctx,
            RequestContext::trusted(
                Some("u1".to_string()),
                vec!["admin".to_string(), "ops".to_string()],
                ClientType::BackofficeApp,
                true,
            )
        );
    }

    #[test]
    fn test_untrusted_request_is_zeroed() {
        for reason in [UntrustedReason::MissingSignal, UntrustedReason::SignalMismatch] {
            let ctx = normalize(&config(), &full_raw(), TrustDecision::Untrusted(reason));
            assert_eq!(ctx, RequestContext::untrusted());
        }
    }

    #[test]
    fn test_trusted_without_headers() {
        let ctx = normalize(&config(), &RawHeaders::default(), TrustDecision::Trusted);
        assert!(ctx.is_trusted());
        assert!(ctx.user_id().is_none());
        assert!(ctx.groups().is_empty());
        assert_eq!(ctx.client_type(), ClientType::Unknown);
        assert!(!ctx.is_backoffice());
    }

    #[test]
    fn test_user_id_is_kept_as_is() {
        let raw = RawHeaders {
            user_id: Some(" u1 ".to_string()),
            ..RawHeaders::default()
        };
        let ctx = normalize(&config(), &raw, TrustDecision::Trusted);
        assert_eq!(ctx.user_id(), Some(" u1 "));
    }

    #[test]
    fn test_group_parsing() {
        assert_eq!(parse_groups("a, b,,c ", ','), ["a", "b", "c"]);
        assert_eq!(parse_groups("", ','), Vec::<String>::new());
        assert_eq!(parse_groups(" , ,", ','), Vec::<String>::new());
        assert_eq!(parse_groups("a;b,c", ';'), ["a", "b,c"]);
    }

    #[test]
    fn test_whitespace_delimiter_rejected() {
        let config = HeaderConfig::builder()
            .user_id_header("userid")
            .groups_header("groups")
            .client_type_header("clienttype")
            .backoffice_header("backoffice")
            .expected_gateway_signature("gw")
            .groups_delimiter(' ')
            .build();
        assert!(config.is_err());
    }

    #[test]
    fn test_backoffice_flag() {
        let cases = [
            (Some("true"), true),
            (Some("TRUE"), true),
            (Some(" True "), true),
            (Some("1"), false),
            (Some("yes"), false),
            (Some("false"), false),
            (Some(""), false),
            (None, false),
        ];

        for (value, expected) in cases {
            let raw = RawHeaders {
                backoffice: value.map(ToString::to_string),
                ..RawHeaders::default()
            };
            let ctx = normalize(&config(), &raw, TrustDecision::Trusted);
            assert_eq!(ctx.is_backoffice(), expected, "backoffice = {value:?}");
        }
    }

    #[test]
    fn test_custom_truthy_token() {
        let config = HeaderConfig::builder()
            .user_id_header("userid")
            .groups_header("groups")
            .client_type_header("clienttype")
            .backoffice_header("backoffice")
            .expected_gateway_signature("gw")
            .backoffice_truthy_token("yes")
            .build()
            .unwrap();

        let raw = RawHeaders {
            backoffice: Some("YES".to_string()),
            ..RawHeaders::default()
        };
        assert!(normalize(&config, &raw, TrustDecision::Trusted).is_backoffice());
    }
}
