//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries one request's state through the
//! pipeline. It owns the request's [`ContextScope`], so nothing about the
//! caller's identity is ever stored outside the request that produced it.

use portico_core::{ContextScope, MisuseError, RequestContext, RequestId};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// Context that flows through the middleware pipeline.
///
/// Stages advance the embedded [`ContextScope`]; the handler only ever sees
/// the published [`RequestContext`].
///
/// # Example
///
/// ```
/// use portico_middleware::context::MiddlewareContext;
///
/// let ctx = MiddlewareContext::new();
///
/// // Nothing has been published yet
/// assert!(ctx.context().is_err());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Per-request context scope, keyed by request id.
    scope: ContextScope,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            scope: ContextScope::new(request_id),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.scope.request_id()
    }

    /// Sets the request ID.
    ///
    /// Only the request id stage calls this, before the gateway stage runs.
    pub fn set_request_id(&mut self, request_id: RequestId) -> Result<(), MisuseError> {
        self.scope.set_request_id(request_id)
    }

    /// Returns the request's context scope.
    #[must_use]
    pub fn scope(&self) -> &ContextScope {
        &self.scope
    }

    /// Returns the request's context scope for the gateway stage to advance.
    pub fn scope_mut(&mut self) -> &mut ContextScope {
        &mut self.scope
    }

    /// Returns the published context.
    ///
    /// Fails with [`MisuseError::NotPublished`] when called before the
    /// gateway stage has run.
    pub fn context(&self) -> Result<&RequestContext, MisuseError> {
        self.scope.get()
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// # Example
    ///
    /// ```
    /// use portico_middleware::context::MiddlewareContext;
    ///
    /// #[derive(Clone)]
    /// struct RouteName(&'static str);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(RouteName("whoami"));
    ///
    /// assert_eq!(ctx.get_extension::<RouteName>().unwrap().0, "whoami");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{ContextState, MisuseError};

    #[test]
    fn test_new_context_is_unstarted() {
        let ctx = MiddlewareContext::new();
        assert_eq!(ctx.scope().state(), ContextState::Unstarted);
        assert!(matches!(
            ctx.context(),
            Err(MisuseError::NotPublished {
                state: ContextState::Unstarted
            })
        ));
    }

    #[test]
    fn test_request_id_follows_scope() {
        let id = RequestId::new();
        let mut ctx = MiddlewareContext::new();
        ctx.set_request_id(id).unwrap();
        assert_eq!(ctx.request_id(), id);
        assert_eq!(ctx.scope().request_id(), id);
    }

    #[test]
    fn test_request_id_is_fixed_once_started() {
        let mut ctx = MiddlewareContext::new();
        ctx.scope_mut().advance(ContextState::Extracted).unwrap();
        assert!(ctx.set_request_id(RequestId::new()).is_err());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, Clone, PartialEq)]
        struct MyExtension {
            value: i32,
        }

        let mut ctx = MiddlewareContext::new();
        assert!(ctx.get_extension::<MyExtension>().is_none());

        ctx.set_extension(MyExtension { value: 42 });
        assert_eq!(ctx.get_extension::<MyExtension>(), Some(&MyExtension { value: 42 }));

        let removed = ctx.remove_extension::<MyExtension>();
        assert_eq!(removed, Some(MyExtension { value: 42 }));
        assert!(ctx.get_extension::<MyExtension>().is_none());
    }

    #[test]
    fn test_elapsed_time() {
        let ctx = MiddlewareContext::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(10));
    }
}
