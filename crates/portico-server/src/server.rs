//! HTTP server.
//!
//! The server accepts HTTP/1.1 connections with Hyper on Tokio, answers the
//! health endpoints itself and hands every other request to the gateway
//! pipeline and then the service handler.
//!
//! # Example
//!
//! ```rust,ignore
//! use portico_config::ConfigLoader;
//! use portico_server::Server;
//!
//! let config = ConfigLoader::new().with_env()?.load()?;
//! Server::new(&config, whoami).run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use portico_config::{PorticoConfig, ServerSettings};
use portico_core::{
    ContextScope, ErrorCategory, ErrorDetail, ErrorEnvelope, PeerAddr, PeerIdentity, RequestId,
};
use portico_middleware::{
    BoxFuture, BoxedHandler, Handler, HandlerResult, Pipeline, Request, Response, ResponseExt,
};

use crate::error::ServerError;
use crate::health::{HealthCheck, ReadinessCheck, HEALTHZ_PATH, READY_PATH};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Default time a request may take from the start of body collection to
/// the handler's response. Body collection and the handler share the one
/// deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps the remote address of a connection to a transport identity.
pub type PeerIdentityResolver = Arc<dyn Fn(&PeerAddr) -> Option<PeerIdentity> + Send + Sync>;

/// The Portico HTTP server.
///
/// Owns the pipeline built from the service configuration and the single
/// handler every non-health request is dispatched to.
pub struct Server {
    settings: ServerSettings,
    pipeline: Pipeline,
    handler: BoxedHandler,
    health: HealthCheck,
    readiness: ReadinessCheck,
    request_timeout: Duration,
    peer_identity: Option<PeerIdentityResolver>,
}

impl Server {
    /// Creates a server for a service configuration and handler.
    #[must_use]
    pub fn new<H: Handler>(config: &PorticoConfig, handler: H) -> Self {
        Self {
            settings: config.server.clone(),
            pipeline: Pipeline::gateway(config),
            handler: Arc::new(handler),
            health: HealthCheck::new("portico", env!("CARGO_PKG_VERSION")),
            readiness: ReadinessCheck::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            peer_identity: None,
        }
    }

    /// Sets the name and version reported by the liveness endpoint.
    #[must_use]
    pub fn with_service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.health = HealthCheck::new(name, version);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Attaches a [`PeerIdentity`] to each request whose connection the
    /// resolver recognises.
    ///
    /// Used when the gateway signal source is `peer` and the transport in
    /// front of this server authenticates connections.
    #[must_use]
    pub fn with_peer_identity<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&PeerAddr) -> Option<PeerIdentity> + Send + Sync + 'static,
    {
        self.peer_identity = Some(Arc::new(resolver));
        self
    }

    /// Returns the server settings.
    #[must_use]
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Returns the request pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the liveness check.
    #[must_use]
    pub fn health(&self) -> &HealthCheck {
        &self.health
    }

    /// Returns the readiness check. Clones share its flag.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is invalid or cannot be
    /// bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is invalid or cannot be
    /// bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.settings.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then drains open connections for at most the configured
    /// shutdown timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();
        let stop = shutdown.recv();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.serve_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(peer = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = &mut stop => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        server.readiness.set_ready(false);
        drop(listener);

        let timeout = server.settings.shutdown_timeout();
        tracing::info!(
            timeout_secs = timeout.as_secs(),
            active = tracker.active_connections(),
            "draining connections"
        );

        if tokio::time::timeout(timeout, tracker.drained()).await.is_err() {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request, remote_addr).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);
        let stop = shutdown.recv();
        tokio::pin!(stop);
        let mut draining = false;

        loop {
            tokio::select! {
                result = conn.as_mut() => return result,
                () = &mut stop, if !draining => {
                    // Finish the in-flight request, then close.
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        }
    }

    async fn handle_request(&self, request: http::Request<Incoming>, remote_addr: SocketAddr) -> Response {
        if request.method() == Method::GET {
            match request.uri().path() {
                HEALTHZ_PATH => return Response::json(StatusCode::OK, &self.health.status()),
                READY_PATH => return self.handle_ready(),
                _ => {}
            }
        }

        tracing::trace!(method = %request.method(), path = request.uri().path(), "request received");

        let deadline = Instant::now() + self.request_timeout;
        let (mut parts, body) = request.into_parts();
        let body = match tokio::time::timeout_at(deadline, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(peer = %remote_addr, error = %e, "failed to read request body");
                return Response::json_error(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "Failed to read request body",
                );
            }
            Err(_) => {
                tracing::warn!(peer = %remote_addr, "request body collection timed out");
                return Response::json_error(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "Request body collection timed out",
                );
            }
        };

        let peer = PeerAddr(remote_addr);
        if let Some(identity) = self.peer_identity.as_ref().and_then(|resolve| resolve(&peer)) {
            parts.extensions.insert(identity);
        }
        parts.extensions.insert(peer);

        let request = Request::from_parts(parts, Full::new(body));
        let handler = Arc::new(DeadlineHandler {
            inner: Arc::clone(&self.handler),
            deadline,
            remote_addr,
        });

        self.pipeline.dispatch(request, handler).await
    }

    fn handle_ready(&self) -> Response {
        let status = self.readiness.status();
        let code = if status.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        Response::json(code, &status)
    }
}

/// Runs the service handler inside the pipeline against the request's
/// deadline, so a timeout response still carries the request id.
struct DeadlineHandler {
    inner: BoxedHandler,
    deadline: Instant,
    remote_addr: SocketAddr,
}

impl Handler for DeadlineHandler {
    fn call(&self, scope: ContextScope, request: Request) -> BoxFuture<'static, HandlerResult> {
        let request_id = scope.request_id();
        let call = self.inner.call(scope, request);
        let deadline = self.deadline;
        let remote_addr = self.remote_addr;

        Box::pin(async move {
            match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(%request_id, peer = %remote_addr, "handler timed out");
                    Ok(handler_timeout(request_id))
                }
            }
        })
    }
}

fn handler_timeout(request_id: RequestId) -> Response {
    let envelope = ErrorEnvelope {
        error: ErrorDetail {
            code: "HANDLER_TIMEOUT".to_string(),
            message: "Handler execution timed out".to_string(),
            category: ErrorCategory::Internal,
            details: None,
        },
        request_id: Some(request_id.to_string()),
    };
    Response::json(StatusCode::GATEWAY_TIMEOUT, &envelope)
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("settings", &self.settings)
            .field("stages", &self.pipeline.stage_names())
            .field("health", &self.health)
            .field("readiness", &self.readiness)
            .field("request_timeout", &self.request_timeout)
            .field("peer_identity", &self.peer_identity.is_some())
            .finish_non_exhaustive()
    }
}
