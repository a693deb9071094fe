//! Fixed-order middleware pipeline.
//!
//! Every request flows through the same stages before it reaches a
//! handler:
//!
//! 1. **Request ID** - Generate or adopt the request ID (UUID v7)
//! 2. **Gateway Context** - Extract, validate, normalize and publish the
//!    caller context
//!
//! The order is fixed by [`Pipeline::gateway`]. [`PipelineBuilder`] exists
//! for tests that need to wrap stages of their own around a handler.

use std::sync::Arc;

use portico_config::PorticoConfig;
use portico_core::{PorticoError, RequestId};

use crate::context::MiddlewareContext;
use crate::handler::Handler;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{GatewayContextMiddleware, RequestIdMiddleware};
use crate::types::{Request, Response, ResponseExt};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The middleware pipeline.
///
/// A pipeline holds no per-request state and is shared by every connection.
///
/// # Example
///
/// ```
/// use portico_config::ConfigLoader;
/// use portico_middleware::pipeline::{Pipeline, Stage};
///
/// let config = ConfigLoader::new()
///     .with_vars([
///         ("USERID_HEADER_KEY", "userid"),
///         ("GROUPS_HEADER_KEY", "groups"),
///         ("CLIENTTYPE_HEADER_KEY", "clienttype"),
///         ("BACKOFFICE_HEADER_KEY", "backoffice"),
///         ("MICROSERVICE_GATEWAY_SERVICE_NAME", "microservice-gateway.example.org"),
///     ])
///     .unwrap()
///     .load()
///     .unwrap();
///
/// let pipeline = Pipeline::gateway(&config);
/// assert_eq!(pipeline.stage_names(), ["request_id", "gateway_context"]);
/// assert_eq!(pipeline.stage_count(), Stage::all().len());
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates the standard pipeline for a service.
    #[must_use]
    pub fn gateway(config: &PorticoConfig) -> Self {
        let request_id = if config.server.trust_inbound_request_id {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };

        Self::builder()
            .stage(request_id)
            .stage(GatewayContextMiddleware::new(config.headers.clone()))
            .build()
    }

    /// Processes a request through every stage, then the terminal closure.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Processes a request with a fresh [`MiddlewareContext`] and a
    /// [`Handler`].
    ///
    /// Handler errors become error envelope responses. Internal errors are
    /// logged here since their details never reach the client.
    pub async fn dispatch(&self, request: Request, handler: Arc<dyn Handler>) -> Response {
        self.process(MiddlewareContext::new(), request, move |ctx, request| {
            let scope = ctx.scope().clone();
            Box::pin(async move {
                let request_id = scope.request_id();
                match handler.call(scope, request).await {
                    Ok(response) => response,
                    Err(e) => {
                        log_handler_error(&e, request_id);
                        Response::from_error(&e, request_id)
                    }
                }
            })
        })
        .await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

fn log_handler_error(error: &PorticoError, request_id: RequestId) {
    match error {
        PorticoError::Misuse(e) => {
            tracing::error!(%request_id, error = %e, "handler read the context out of order");
        }
        PorticoError::Internal { message, source } => {
            tracing::error!(
                %request_id,
                %message,
                source = source.as_ref().map(tracing::field::display),
                "handler failed"
            );
        }
        other => {
            tracing::debug!(%request_id, status = other.status_code().as_u16(), "handler rejected request");
        }
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// The stages of the standard pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: Request ID generation/adoption
    RequestId = 1,
    /// Stage 2: Gateway context publication
    GatewayContext = 2,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::GatewayContext => "gateway_context",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 2] {
        [Self::RequestId, Self::GatewayContext]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use portico_config::ConfigLoader;
    use portico_core::ContextScope;
    use std::sync::Mutex;

    fn config() -> PorticoConfig {
        ConfigLoader::new()
            .with_vars([
                ("USERID_HEADER_KEY", "userid"),
                ("GROUPS_HEADER_KEY", "groups"),
                ("CLIENTTYPE_HEADER_KEY", "clienttype"),
                ("BACKOFFICE_HEADER_KEY", "backoffice"),
                ("MICROSERVICE_GATEWAY_SERVICE_NAME", "microservice-gateway.example.org"),
            ])
            .unwrap()
            .load()
            .unwrap()
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    struct OrderTrackingMiddleware {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.name);
                next.run(ctx, request).await
            })
        }
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .stage(OrderTrackingMiddleware {
                name: "first",
                order: order.clone(),
            })
            .stage(OrderTrackingMiddleware {
                name: "second",
                order: order.clone(),
            })
            .build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async {
                    HttpResponse::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::from("OK")))
                        .unwrap()
                })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_envelope() {
        async fn forbidden(scope: ContextScope, _request: Request) -> HandlerResult {
            scope.get()?.require_group("admin")?;
            Ok(Response::json(StatusCode::OK, &"unreachable"))
        }

        let pipeline = Pipeline::gateway(&config());
        let response = pipeline.dispatch(request(), Arc::new(forbidden)).await;

        // No gateway signal, so the caller is anonymous
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_handler_without_gateway_stage_is_misuse() {
        async fn reads_context(scope: ContextScope, _request: Request) -> HandlerResult {
            let ctx = scope.get()?;
            Ok(Response::json(StatusCode::OK, ctx))
        }

        let pipeline = Pipeline::builder().stage(RequestIdMiddleware::new()).build();
        let response = pipeline.dispatch(request(), Arc::new(reads_context)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_gateway_pipeline_stages() {
        let pipeline = Pipeline::gateway(&config());
        let names: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(pipeline.stage_names(), names);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::RequestId < Stage::GatewayContext);
    }

    #[test]
    fn test_empty_pipeline() {
        assert_eq!(Pipeline::builder().build().stage_count(), 0);
    }
}
