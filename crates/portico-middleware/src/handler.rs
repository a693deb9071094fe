//! Request handlers.
//!
//! A handler runs after the pipeline has published the caller context. It
//! receives its own clone of the request's [`ContextScope`] and reads the
//! context through [`ContextScope::get`].

use std::future::Future;
use std::sync::Arc;

use portico_core::{ContextScope, PorticoError};

use crate::middleware::BoxFuture;
use crate::types::{Request, Response};

/// Result returned by handlers.
pub type HandlerResult = Result<Response, PorticoError>;

/// A request handler.
///
/// Implemented for every `Fn(ContextScope, Request) -> impl Future` closure,
/// so most handlers are plain async functions.
///
/// # Example
///
/// ```
/// use portico_core::{ContextScope, PorticoError};
/// use portico_middleware::{HandlerResult, Request, Response, ResponseExt};
///
/// async fn admin_only(scope: ContextScope, _request: Request) -> HandlerResult {
///     let ctx = scope.get()?;
///     ctx.require_group("admin")?;
///     Ok(Response::json(http::StatusCode::OK, ctx))
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, scope: ContextScope, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(ContextScope, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, scope: ContextScope, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(scope, request))
    }
}

/// A type-erased, shareable handler.
pub type BoxedHandler = Arc<dyn Handler>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use portico_core::{ClientType, MisuseError, RequestContext, RequestId};

    async fn whoami(scope: ContextScope, _request: Request) -> HandlerResult {
        let ctx = scope.get()?;
        let user = ctx.require_user()?;
        Ok(Response::json(StatusCode::OK, &user))
    }

    fn request() -> Request {
        http::Request::new(Full::new(Bytes::new()))
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler: BoxedHandler = Arc::new(whoami);
        let scope = ContextScope::published(
            RequestId::new(),
            RequestContext::trusted(Some("u1".to_string()), vec![], ClientType::WebApp, false),
        );

        let response = handler.call(scope, request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unpublished_scope_is_misuse() {
        let handler: BoxedHandler = Arc::new(whoami);
        let err = handler
            .call(ContextScope::new(RequestId::new()), request())
            .await
            .unwrap_err();

        assert!(matches!(err, PorticoError::Misuse(MisuseError::NotPublished { .. })));
    }

    #[tokio::test]
    async fn test_anonymous_caller_is_rejected() {
        let handler: BoxedHandler = Arc::new(whoami);
        let scope = ContextScope::published(RequestId::new(), RequestContext::untrusted());

        let err = handler.call(scope, request()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
