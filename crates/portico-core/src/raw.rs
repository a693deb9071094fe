//! Raw, unvalidated identity header values.

/// Identity header values exactly as they arrived on one request.
///
/// Every field is `None` when the corresponding header was absent or was not
/// valid UTF-8. Nothing in here is trusted: the values only become
/// part of a [`RequestContext`](crate::RequestContext) after the gateway
/// signal has been validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaders {
    /// Value of the configured user id header.
    pub user_id: Option<String>,
    /// Value of the configured groups header.
    pub groups: Option<String>,
    /// Value of the configured client type header.
    pub client_type: Option<String>,
    /// Value of the configured back-office flag header.
    pub backoffice: Option<String>,
}

impl RawHeaders {
    /// Returns `true` if any identity header was present.
    ///
    /// Used to tell an anonymous request apart from a spoof attempt when
    /// the gateway signal is missing.
    #[must_use]
    pub fn carries_identity(&self) -> bool {
        self.user_id.is_some()
            || self.groups.is_some()
            || self.client_type.is_some()
            || self.backoffice.is_some()
    }
}
