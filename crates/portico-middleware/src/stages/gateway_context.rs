//! Gateway context middleware.
//!
//! Stage 2 of the pipeline. Drives the request's [`ContextScope`] through
//! `Extracted → Validated → Normalized → Published` using the pure steps in
//! [`crate::gateway`], so that by the time the handler runs the context is
//! published and immutable.
//!
//! If the scope refuses a transition the request is answered with a
//! `CONTEXT_MISUSE` envelope and the handler is never invoked.
//!
//! [`ContextScope`]: portico_core::ContextScope

use std::sync::Arc;

use crate::context::MiddlewareContext;
use crate::gateway::{self, TrustDecision};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use portico_config::HeaderConfig;
use portico_core::{ContextState, MisuseError, PorticoError, RawHeaders, RequestContext};

/// Middleware that publishes the gateway-trust [`RequestContext`].
///
/// The configuration is shared read-only across all requests; every other
/// value lives in the request's own [`MiddlewareContext`]. The
/// [`TrustDecision`] is also stored as a context extension.
///
/// # Example
///
/// ```
/// use portico_config::HeaderConfig;
/// use portico_middleware::stages::GatewayContextMiddleware;
///
/// let config = HeaderConfig::builder()
///     .user_id_header("userid")
///     .groups_header("groups")
///     .client_type_header("clienttype")
///     .backoffice_header("backoffice")
///     .expected_gateway_signature("microservice-gateway.example.org")
///     .build()
///     .unwrap();
///
/// let middleware = GatewayContextMiddleware::new(config);
/// ```
#[derive(Debug, Clone)]
pub struct GatewayContextMiddleware {
    config: Arc<HeaderConfig>,
}

impl GatewayContextMiddleware {
    /// Creates the middleware for the given header configuration.
    #[must_use]
    pub fn new(config: impl Into<Arc<HeaderConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Returns the header configuration.
    #[must_use]
    pub fn config(&self) -> &HeaderConfig {
        &self.config
    }

    fn publish(
        &self,
        ctx: &mut MiddlewareContext,
        request: &Request,
    ) -> Result<TrustDecision, MisuseError> {
        let config = self.config.as_ref();
        let scope = ctx.scope_mut();

        let raw = gateway::extract(config, request.headers());
        scope.advance(ContextState::Extracted)?;

        let signal = gateway::observe_signal(config, request.headers(), request.extensions());
        let decision = gateway::validate(config, signal.as_deref());
        scope.advance(ContextState::Validated)?;

        let context = gateway::normalize(config, &raw, decision);
        scope.advance(ContextState::Normalized)?;

        log_decision(ctx, &raw, decision, &context);
        ctx.scope_mut().set(context)?;

        Ok(decision)
    }
}

fn log_decision(
    ctx: &MiddlewareContext,
    raw: &RawHeaders,
    decision: TrustDecision,
    context: &RequestContext,
) {
    let request_id = ctx.request_id();
    match decision {
        TrustDecision::Trusted => tracing::debug!(
            %request_id,
            caller = %context.log_id(),
            groups = context.groups().len(),
            client_type = %context.client_type(),
            backoffice = context.is_backoffice(),
            "gateway context published"
        ),
        // Header values are attacker-controlled here and stay out of the logs
        TrustDecision::Untrusted(reason) if raw.carries_identity() => tracing::warn!(
            %request_id,
            %reason,
            "identity headers ignored on request not forwarded by the gateway"
        ),
        TrustDecision::Untrusted(reason) => tracing::debug!(
            %request_id,
            %reason,
            "untrusted request without identity headers"
        ),
    }
}

impl Middleware for GatewayContextMiddleware {
    fn name(&self) -> &'static str {
        "gateway_context"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.publish(ctx, &request) {
                Ok(decision) => {
                    ctx.set_extension(decision);
                    next.run(ctx, request).await
                }
                Err(e) => {
                    let request_id = ctx.request_id();
                    tracing::error!(
                        %request_id,
                        state = %ctx.scope().state(),
                        error = %e,
                        "context pipeline ran out of order"
                    );
                    Response::from_error(&PorticoError::from(e), request_id)
                }
            }
        })
    }
}
