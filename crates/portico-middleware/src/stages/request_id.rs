//! Request ID middleware.
//!
//! Stage 1 of the pipeline. Every request gets a UUID v7 [`RequestId`] that
//! keys its context scope and is echoed back in the `x-request-id` response
//! header, so log lines and error envelopes can be matched to a request.
//!
//! An inbound `x-request-id` is only adopted when the middleware was built
//! with [`RequestIdMiddleware::trust_incoming`], and only if it parses as a
//! UUID.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderValue;
use portico_core::RequestId;
use uuid::Uuid;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or adopts request IDs.
///
/// # Example
///
/// ```
/// use portico_middleware::stages::RequestIdMiddleware;
///
/// let middleware = RequestIdMiddleware::new();
/// let internal = RequestIdMiddleware::trust_incoming();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that adopts a valid inbound `x-request-id`.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self { trust_incoming: true }
    }

    fn extract_request_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(RequestId::from_uuid)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self
                .extract_request_id(&request)
                .unwrap_or_else(RequestId::new);

            if let Err(e) = ctx.set_request_id(request_id) {
                tracing::error!(error = %e, "request id assigned after the context pipeline started");
            }

            let request_id = ctx.request_id();
            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    fn create_test_request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn create_request_with_id(request_id: &str) -> Request {
        HttpRequest::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, request_id)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn create_handler<'a>() -> Next<'a> {
        Next::handler(|_ctx, _req| {
            Box::pin(async {
                HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from("OK")))
                    .unwrap()
            })
        })
    }

    fn header_id(response: &Response) -> &str {
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_generates_request_id_when_missing() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, create_test_request(), create_handler())
            .await;

        assert_eq!(ctx.request_id().to_string(), header_id(&response));
        assert_eq!(ctx.scope().request_id(), ctx.request_id());
    }

    #[tokio::test]
    async fn test_ignores_incoming_id_when_not_trusted() {
        let middleware = RequestIdMiddleware::new();
        let mut ctx = MiddlewareContext::new();
        let incoming_id = "01234567-89ab-7def-8123-456789abcdef";

        let response = middleware
            .process(&mut ctx, create_request_with_id(incoming_id), create_handler())
            .await;

        assert_ne!(header_id(&response), incoming_id);
    }

    #[tokio::test]
    async fn test_uses_incoming_id_when_trusted() {
        let middleware = RequestIdMiddleware::trust_incoming();
        let mut ctx = MiddlewareContext::new();
        let incoming_id = "01234567-89ab-7def-8123-456789abcdef";

        let response = middleware
            .process(&mut ctx, create_request_with_id(incoming_id), create_handler())
            .await;

        assert_eq!(header_id(&response), incoming_id);
        assert_eq!(ctx.request_id().to_string(), incoming_id);
    }

    #[tokio::test]
    async fn test_ignores_invalid_incoming_id() {
        let middleware = RequestIdMiddleware::trust_incoming();
        let mut ctx = MiddlewareContext::new();
        let invalid_id = "not-a-valid-uuid";

        let response = middleware
            .process(&mut ctx, create_request_with_id(invalid_id), create_handler())
            .await;

        let id = header_id(&response);
        assert_ne!(id, invalid_id);
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(RequestIdMiddleware::new().name(), "request_id");
    }
}
