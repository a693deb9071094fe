//! Client type enumeration.
//!
//! The gateway tags each forwarded request with the kind of client that
//! originated it. Only a fixed set of values is recognised; anything else
//! becomes [`ClientType::Unknown`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of client a request originated from.
///
/// # Example
///
/// ```
/// use portico_core::ClientType;
///
/// assert_eq!(ClientType::parse("backoffice-app"), ClientType::BackofficeApp);
/// assert_eq!(ClientType::parse("smart-fridge"), ClientType::Unknown);
/// assert_eq!(ClientType::parse("").as_str(), "unknown");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientType {
    /// Internal back-office console.
    BackofficeApp,
    /// Public web application.
    WebApp,
    /// Native mobile application.
    MobileApp,
    /// Another backend service calling through the gateway.
    Service,
    /// Absent or unrecognised client type.
    #[default]
    Unknown,
}

impl ClientType {
    /// All recognised client types, excluding [`ClientType::Unknown`].
    pub const KNOWN: [ClientType; 4] = [
        Self::BackofficeApp,
        Self::WebApp,
        Self::MobileApp,
        Self::Service,
    ];

    /// Maps a raw header value onto a client type.
    ///
    /// Surrounding whitespace is ignored, matching is otherwise exact.
    /// This never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == raw)
            .unwrap_or(Self::Unknown)
    }

    /// Returns the wire representation of this client type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BackofficeApp => "backoffice-app",
            Self::WebApp => "web-app",
            Self::MobileApp => "mobile-app",
            Self::Service => "service",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` unless this is [`ClientType::Unknown`].
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
