//! In-memory test client.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use portico_config::{ConfigLoader, GatewaySignal, PorticoConfig};
use portico_core::ContextScope;
use portico_middleware::{BoxedHandler, Handler, HandlerResult, Pipeline, Request, Response, ResponseExt};
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Handler that answers with the published context as JSON.
///
/// # Errors
///
/// Returns a misuse error if the context was never published.
pub async fn echo_context(scope: ContextScope, _request: Request) -> HandlerResult {
    let ctx = scope.get()?;
    Ok(Response::json(StatusCode::OK, ctx))
}

/// Drives requests through the standard pipeline without a network.
///
/// # Example
///
/// ```
/// use portico_test::{echo_context, TestClient};
///
/// # tokio_test::block_on(async {
/// let client = TestClient::from_vars(
///     [
///         ("USERID_HEADER_KEY", "userid"),
///         ("GROUPS_HEADER_KEY", "groups"),
///         ("CLIENTTYPE_HEADER_KEY", "clienttype"),
///         ("BACKOFFICE_HEADER_KEY", "backoffice"),
///         ("MICROSERVICE_GATEWAY_SERVICE_NAME", "microservice-gateway.example.org"),
///     ],
///     echo_context,
/// )
/// .unwrap();
///
/// let response = client.get("/").via_gateway().user("u1").send().await.unwrap();
/// assert_eq!(response.json_value().unwrap()["user_id"], "u1");
/// # });
/// ```
pub struct TestClient {
    config: PorticoConfig,
    pipeline: Pipeline,
    handler: BoxedHandler,
}

impl TestClient {
    /// Creates a client for a loaded configuration.
    #[must_use]
    pub fn new<H: Handler>(config: PorticoConfig, handler: H) -> Self {
        Self {
            pipeline: Pipeline::gateway(&config),
            config,
            handler: Arc::new(handler),
        }
    }

    /// Boots a client from environment-style variables, the way the service
    /// would start with them set.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Config`] if the variables do not form a valid
    /// configuration.
    pub fn from_vars<I, K, V, H>(vars: I, handler: H) -> Result<Self, TestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        H: Handler,
    {
        let config = ConfigLoader::new().with_vars(vars)?.load()?;
        Ok(Self::new(config, handler))
    }

    /// Returns the configuration the client was booted with.
    #[must_use]
    pub fn config(&self) -> &PorticoConfig {
        &self.config
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            builder: TestRequestBuilder::new(method, uri),
        }
    }

    /// Dispatches a built request through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the response body cannot be read.
    pub async fn send(&self, request: Request) -> Result<TestResponse, TestError> {
        let response = self
            .pipeline
            .dispatch(request, Arc::clone(&self.handler))
            .await;
        TestResponse::from_response(response).await
    }
}

/// A request bound to a [`TestClient`].
///
/// The identity helpers write to the header names the client was configured
/// with.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the remote address.
    pub fn peer_addr(mut self, addr: SocketAddr) -> Self {
        self.builder = self.builder.peer_addr(addr);
        self
    }

    /// Attaches a transport-level peer identity.
    pub fn peer_identity(mut self, identity: impl Into<String>) -> Self {
        self.builder = self.builder.peer_identity(identity);
        self
    }

    /// Marks the request as forwarded by the configured gateway, on
    /// whichever channel the configuration observes.
    pub fn via_gateway(self) -> Self {
        let client = self.client;
        let headers = &client.config.headers;
        let signature = headers.expected_gateway_signature().to_string();
        match headers.gateway_signal() {
            GatewaySignal::Header(name) => {
                let name = name.as_str().to_string();
                self.header(name, signature)
            }
            GatewaySignal::PeerIdentity => self.peer_identity(signature),
        }
    }

    /// Sets the user id header.
    pub fn user(self, user_id: impl Into<String>) -> Self {
        let client = self.client;
        let name = client.config.headers.user_id_header().as_str().to_string();
        self.header(name, user_id)
    }

    /// Sets the groups header, joined with the configured delimiter.
    pub fn groups(self, groups: &[&str]) -> Self {
        let client = self.client;
        let headers = &client.config.headers;
        let name = headers.groups_header().as_str().to_string();
        let value = groups.join(&headers.groups_delimiter().to_string());
        self.header(name, value)
    }

    /// Sets the client type header.
    pub fn client_type(self, client_type: impl Into<String>) -> Self {
        let client = self.client;
        let name = client.config.headers.client_type_header().as_str().to_string();
        self.header(name, client_type)
    }

    /// Sets the backoffice header to the truthy token or `false`.
    pub fn backoffice(self, is_backoffice: bool) -> Self {
        let client = self.client;
        let headers = &client.config.headers;
        let name = headers.backoffice_header().as_str().to_string();
        let value = if is_backoffice {
            headers.backoffice_truthy_token().to_string()
        } else {
            "false".to_string()
        };
        self.header(name, value)
    }

    /// Builds and sends the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the response body
    /// cannot be read.
    pub async fn send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [(&str, &str); 5] = [
        ("USERID_HEADER_KEY", "x-user"),
        ("GROUPS_HEADER_KEY", "x-groups"),
        ("CLIENTTYPE_HEADER_KEY", "x-client"),
        ("BACKOFFICE_HEADER_KEY", "x-backoffice"),
        ("MICROSERVICE_GATEWAY_SERVICE_NAME", "gw.internal"),
    ];

    #[tokio::test]
    async fn test_identity_helpers_follow_config() {
        let client = TestClient::from_vars(
            VARS.into_iter().chain([("GROUPS_HEADER_DELIMITER", ";")]),
            echo_context,
        )
        .unwrap();

        let response = client
            .get("/")
            .via_gateway()
            .user("u1")
            .groups(&["a", "b"])
            .client_type("mobile-app")
            .backoffice(true)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.request_id().is_some());
        assert_eq!(
            response.json_value().unwrap(),
            serde_json::json!({
                "user_id": "u1",
                "groups": ["a", "b"],
                "client_type": "mobile-app",
                "is_backoffice": true,
                "trusted": true
            })
        );
    }

    #[tokio::test]
    async fn test_without_gateway_is_untrusted() {
        let client = TestClient::from_vars(VARS, echo_context).unwrap();

        let response = client.get("/").user("u1").backoffice(true).send().await.unwrap();
        let body = response.json_value().unwrap();
        assert_eq!(body["trusted"], false);
        assert_eq!(body["is_backoffice"], false);
    }

    #[tokio::test]
    async fn test_via_gateway_in_peer_mode() {
        let client = TestClient::from_vars(
            VARS.into_iter().chain([("GATEWAY_SIGNAL_SOURCE", "peer")]),
            echo_context,
        )
        .unwrap();

        let response = client.get("/").via_gateway().user("u1").send().await.unwrap();
        assert_eq!(response.json_value().unwrap()["trusted"], true);
    }

    #[test]
    fn test_missing_required_var() {
        let result = TestClient::from_vars(VARS[..4].iter().copied(), echo_context);
        assert!(matches!(result, Err(TestError::Config(_))));
    }

    #[tokio::test]
    async fn test_build_error_surfaces() {
        let client = TestClient::from_vars(VARS, echo_context).unwrap();
        let err = client.get("/").header("x-user", "a\u{7f}").send().await.unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }
}
