//! Request context types.
//!
//! [`RequestContext`] is the normalized caller identity of one request, and
//! [`RequestId`] is the identifier the scope holding it is keyed by.

use crate::client_type::ClientType;
use crate::error::PorticoError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use portico_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    ///
    /// This is useful when parsing request IDs from headers.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Normalized caller identity for a single request.
///
/// A context is either *trusted*, meaning the request was forwarded by the
/// configured gateway and its identity headers were parsed, or *untrusted*,
/// in which case every identity field holds its default value. There is no
/// way to build an untrusted context that carries identity.
///
/// # Example
///
/// ```
/// use portico_core::{ClientType, RequestContext};
///
/// let ctx = RequestContext::trusted(
///     Some("u1".to_string()),
///     vec!["admin".to_string(), "ops".to_string()],
///     ClientType::BackofficeApp,
///     true,
/// );
/// assert!(ctx.has_group("ops"));
/// assert_eq!(ctx.log_id(), "user:u1");
///
/// let anonymous = RequestContext::untrusted();
/// assert!(!anonymous.is_trusted());
/// assert!(anonymous.groups().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    user_id: Option<String>,
    groups: Vec<String>,
    client_type: ClientType,
    is_backoffice: bool,
    trusted: bool,
}

impl RequestContext {
    /// Returns the empty context used for requests that did not come
    /// through the gateway.
    #[must_use]
    pub fn untrusted() -> Self {
        Self::default()
    }

    /// Creates a context for a request whose gateway signal was accepted.
    #[must_use]
    pub fn trusted(
        user_id: Option<String>,
        groups: Vec<String>,
        client_type: ClientType,
        is_backoffice: bool,
    ) -> Self {
        Self {
            user_id,
            groups,
            client_type,
            is_backoffice,
            trusted: true,
        }
    }

    /// Returns the caller's user id, if the gateway supplied one.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the caller's groups in the order the gateway sent them.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns the client type.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        self.client_type
    }

    /// Returns `true` if the request came from the back-office.
    #[must_use]
    pub const fn is_backoffice(&self) -> bool {
        self.is_backoffice
    }

    /// Returns `true` if the gateway signal was accepted for this request.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Returns `true` if the context is trusted and names a user.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.trusted && self.user_id.is_some()
    }

    /// Returns `true` if the caller belongs to `group`.
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Returns a short identifier suitable for logging.
    ///
    /// - trusted with user id: `user:<id>`
    /// - trusted without user id: `gateway:anonymous`
    /// - untrusted: `untrusted`
    #[must_use]
    pub fn log_id(&self) -> String {
        match (self.trusted, self.user_id.as_deref()) {
            (true, Some(user_id)) => format!("user:{user_id}"),
            (true, None) => "gateway:anonymous".to_string(),
            (false, _) => "untrusted".to_string(),
        }
    }

    /// Returns the user id or an authentication error.
    pub fn require_user(&self) -> Result<&str, PorticoError> {
        if !self.trusted {
            return Err(PorticoError::authentication(
                "request was not forwarded by the gateway",
            ));
        }
        self.user_id()
            .ok_or_else(|| PorticoError::authentication("no user id on request"))
    }

    /// Fails with an authorization error unless the caller is in `group`.
    ///
    /// An unidentified caller gets an authentication error instead.
    pub fn require_group(&self, group: &str) -> Result<(), PorticoError> {
        self.require_user()?;
        if self.has_group(group) {
            Ok(())
        } else {
            Err(PorticoError::missing_group(group))
        }
    }
}
