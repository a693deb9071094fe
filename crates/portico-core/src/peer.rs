//! Transport-level facts about the connection a request arrived on.
//!
//! Both types are stored as [`http::Extensions`] on the inbound request by
//! the hosting server, never derived from headers.

use std::fmt;
use std::net::SocketAddr;

/// Identity of the peer as established by the transport, for example the
/// subject of a verified client certificate.
///
/// When the gateway signal source is `peer`, this is the only value the
/// trust decision looks at.
///
/// # Example
///
/// ```
/// use portico_core::PeerIdentity;
///
/// let mut request = http::Request::new(());
/// request
///     .extensions_mut()
///     .insert(PeerIdentity::new("microservice-gateway.example.org"));
///
/// let peer = request.extensions().get::<PeerIdentity>().unwrap();
/// assert_eq!(peer.as_str(), "microservice-gateway.example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerIdentity(String);

impl PeerIdentity {
    /// Creates a peer identity.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Returns the identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote socket address of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
