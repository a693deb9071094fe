//! Trust decision.
//!
//! A request is trusted if and only if the configured gateway signal is
//! observed and equals the expected gateway identity. The identity headers
//! themselves never take part in the decision.

use http::header::HeaderMap;
use http::Extensions;
use portico_config::{GatewaySignal, HeaderConfig};
use portico_core::PeerIdentity;
use serde::Serialize;
use std::fmt;

use super::extract::first_value;

/// Why a request was not trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UntrustedReason {
    /// No gateway signal was observed.
    MissingSignal,
    /// A signal was observed but names a different service.
    SignalMismatch,
}

impl UntrustedReason {
    /// Returns the reason as used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSignal => "missing_signal",
            Self::SignalMismatch => "signal_mismatch",
        }
    }
}

impl fmt::Display for UntrustedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the trust validator. There is no partial trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum TrustDecision {
    /// The request came through the configured gateway.
    Trusted,
    /// The request must not carry identity.
    Untrusted(UntrustedReason),
}

impl TrustDecision {
    /// Returns `true` for [`TrustDecision::Trusted`].
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::Trusted)
    }
}

/// Reads the gateway signal from wherever the configuration says it lives.
///
/// For [`GatewaySignal::Header`] the first value of the signal header is
/// used; for [`GatewaySignal::PeerIdentity`] the [`PeerIdentity`] request
/// extension is used and headers are ignored entirely.
#[must_use]
pub fn observe_signal(
    config: &HeaderConfig,
    headers: &HeaderMap,
    extensions: &Extensions,
) -> Option<String> {
    match config.gateway_signal() {
        GatewaySignal::Header(name) => first_value(headers, name),
        GatewaySignal::PeerIdentity => extensions
            .get::<PeerIdentity>()
            .map(|peer| peer.as_str().to_string()),
    }
}

/// Decides whether the observed signal grants trust.
///
/// Surrounding whitespace is ignored; otherwise the comparison is exact.
/// A blank signal counts as missing.
///
/// # Example
///
/// ```
/// use portico_config::HeaderConfig;
/// use portico_middleware::gateway::{validate, TrustDecision, UntrustedReason};
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
/// assert_eq!(validate(&config, Some("gw")), TrustDecision::Trusted);
/// assert_eq!(
///     validate(&config, None),
///     TrustDecision::Untrusted(UntrustedReason::MissingSignal)
/// );
/// ```
#[must_use]
pub fn validate(config: &HeaderConfig, signal: Option<&str>) -> TrustDecision {
    match signal.map(str::trim) {
        None | Some("") => TrustDecision::Untrusted(UntrustedReason::MissingSignal),
        Some(observed) if observed == config.expected_gateway_signature() => {
            TrustDecision::Trusted
        }
        Some(_) => TrustDecision::Untrusted(UntrustedReason::SignalMismatch),
    }
}
