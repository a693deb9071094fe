//! Per-request context scope.
//!
//! A [`ContextScope`] is created for each inbound request and owned by that
//! request's processing path. It records how far the context pipeline has
//! progressed and, once the pipeline finishes, holds the published
//! [`RequestContext`]. Scopes are plain values threaded through the call
//! chain, so there is no shared state between concurrent requests.
//!
//! ```text
//! Unstarted → Extracted → Validated → Normalized → Published
//! ```

use crate::context::{RequestContext, RequestId};
use crate::error::MisuseError;
use std::fmt;
use std::sync::Arc;

/// Progress of the context pipeline for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextState {
    /// No pipeline stage has run.
    Unstarted,
    /// Raw identity headers were read.
    Extracted,
    /// The gateway signal was checked.
    Validated,
    /// The raw headers were turned into a [`RequestContext`].
    Normalized,
    /// The context is readable by handlers.
    Published,
}

impl ContextState {
    /// Returns the state that must follow this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Unstarted => Some(Self::Extracted),
            Self::Extracted => Some(Self::Validated),
            Self::Validated => Some(Self::Normalized),
            Self::Normalized => Some(Self::Published),
            Self::Published => None,
        }
    }

    /// Returns the state name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Extracted => "extracted",
            Self::Validated => "validated",
            Self::Normalized => "normalized",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holder of one request's context.
///
/// `get` before `set` is a [`MisuseError`], never a silent default.
///
/// # Example
///
/// ```
/// use portico_core::{ContextScope, ContextState, RequestContext, RequestId};
///
/// let mut scope = ContextScope::new(RequestId::new());
/// assert!(scope.get().is_err());
///
/// scope.advance(ContextState::Extracted).unwrap();
/// scope.advance(ContextState::Validated).unwrap();
/// scope.advance(ContextState::Normalized).unwrap();
/// scope.set(RequestContext::untrusted()).unwrap();
///
/// assert!(!scope.get().unwrap().is_trusted());
/// ```
#[derive(Debug, Clone)]
pub struct ContextScope {
    request_id: RequestId,
    state: ContextState,
    context: Option<Arc<RequestContext>>,
}

impl ContextScope {
    /// Creates an unstarted scope for the given request.
    #[must_use]
    pub const fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: ContextState::Unstarted,
            context: None,
        }
    }

    /// Creates a scope that has already published `context`.
    ///
    /// Intended for handler unit tests that do not run the pipeline.
    #[must_use]
    pub fn published(request_id: RequestId, context: RequestContext) -> Self {
        Self {
            request_id,
            state: ContextState::Published,
            context: Some(Arc::new(context)),
        }
    }

    /// Returns the request this scope belongs to.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Re-keys the scope, used when the request id stage adopts an
    /// inbound id. Only valid before the pipeline has started.
    pub fn set_request_id(&mut self, request_id: RequestId) -> Result<(), MisuseError> {
        if self.state != ContextState::Unstarted {
            return Err(MisuseError::OutOfOrder {
                from: self.state,
                to: ContextState::Unstarted,
            });
        }
        self.request_id = request_id;
        Ok(())
    }

    /// Returns the current pipeline state.
    #[must_use]
    pub const fn state(&self) -> ContextState {
        self.state
    }

    /// Moves the scope to `to`, which must be the immediate successor of
    /// the current state and must not be [`ContextState::Published`].
    ///
    /// Publishing goes through [`ContextScope::set`].
    pub fn advance(&mut self, to: ContextState) -> Result<(), MisuseError> {
        if to == ContextState::Published || self.state.next() != Some(to) {
            return Err(MisuseError::OutOfOrder {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Publishes the context for this request.
    ///
    /// The scope must be in [`ContextState::Normalized`]. A published
    /// context is never replaced.
    pub fn set(&mut self, context: RequestContext) -> Result<(), MisuseError> {
        match self.state {
            ContextState::Published => Err(MisuseError::AlreadyPublished),
            ContextState::Normalized => {
                self.context = Some(Arc::new(context));
                self.state = ContextState::Published;
                Ok(())
            }
            from => Err(MisuseError::OutOfOrder {
                from,
                to: ContextState::Published,
            }),
        }
    }

    /// Returns the published context.
    pub fn get(&self) -> Result<&RequestContext, MisuseError> {
        self.context
            .as_deref()
            .ok_or(MisuseError::NotPublished { state: self.state })
    }

    /// Returns a shared handle to the published context, for handlers that
    /// move it into spawned tasks.
    pub fn get_shared(&self) -> Result<Arc<RequestContext>, MisuseError> {
        self.context
            .clone()
            .ok_or(MisuseError::NotPublished { state: self.state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_type::ClientType;

    fn normalized_scope() -> ContextScope {
        let mut scope = ContextScope::new(RequestId::new());
        scope.advance(ContextState::Extracted).unwrap();
        scope.advance(ContextState::Validated).unwrap();
        scope.advance(ContextState::Normalized).unwrap();
        scope
    }

    #[test]
    fn test_get_before_set_is_misuse() {
        let scope = ContextScope::new(RequestId::new());
        assert_eq!(
            scope.get().unwrap_err(),
            MisuseError::NotPublished {
                state: ContextState::Unstarted
            }
        );
    }

    #[test]
    fn test_set_then_get_returns_same_value() {
        let ctx = RequestContext::trusted(
            Some("u1".to_string()),
            vec!["ops".to_string()],
            ClientType::WebApp,
            false,
        );
        let mut scope = normalized_scope();
        scope.set(ctx.clone()).unwrap();

        assert_eq!(scope.state(), ContextState::Published);
        assert_eq!(scope.get().unwrap(), &ctx);
        assert_eq!(*scope.get_shared().unwrap(), ctx);
    }

    #[test]
    fn test_set_twice_is_rejected() {
        let mut scope = normalized_scope();
        scope.set(RequestContext::untrusted()).unwrap();
        assert_eq!(
            scope.set(RequestContext::untrusted()).unwrap_err(),
            MisuseError::AlreadyPublished
        );
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        let mut scope = ContextScope::new(RequestId::new());
        assert!(scope.advance(ContextState::Validated).is_err());
        assert!(scope.set(RequestContext::untrusted()).is_err());

        scope.advance(ContextState::Extracted).unwrap();
        assert!(scope.advance(ContextState::Extracted).is_err());
        assert!(scope.advance(ContextState::Normalized).is_err());
        assert_eq!(scope.state(), ContextState::Extracted);
    }

    #[test]
    fn test_advance_cannot_publish() {
        let mut scope = normalized_scope();
        assert!(scope.advance(ContextState::Published).is_err());
        assert!(scope.get().is_err());
    }

    #[test]
    fn test_request_id_fixed_once_started() {
        let mut scope = ContextScope::new(RequestId::new());
        let inbound = RequestId::new();
        scope.set_request_id(inbound).unwrap();
        assert_eq!(scope.request_id(), inbound);

        scope.advance(ContextState::Extracted).unwrap();
        assert!(scope.set_request_id(RequestId::new()).is_err());
    }

    #[test]
    fn test_published_helper() {
        let scope = ContextScope::published(RequestId::new(), RequestContext::untrusted());
        assert_eq!(scope.state(), ContextState::Published);
        assert!(scope.get().is_ok());
    }
}
