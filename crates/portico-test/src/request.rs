//! Test request building.

use std::net::SocketAddr;

use bytes::Bytes;
use http::{header, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use portico_core::{PeerAddr, PeerIdentity};
use portico_middleware::Request;
use serde::Serialize;

use crate::error::TestError;

/// Loopback address attached to requests that do not set one.
pub const DEFAULT_PEER_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 40000);

/// Builder for requests sent through a [`TestClient`](crate::TestClient).
///
/// Invalid header names or values are reported when the request is built.
///
/// # Example
///
/// ```
/// use portico_test::TestRequestBuilder;
///
/// let request = TestRequestBuilder::get("/orders")
///     .header("userid", "u1")
///     .build()
///     .unwrap();
/// assert_eq!(request.headers()["userid"], "u1");
/// ```
#[derive(Debug)]
#[must_use]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    peer_addr: SocketAddr,
    peer_identity: Option<PeerIdentity>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a request builder.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            peer_addr: DEFAULT_PEER_ADDR,
            peer_identity: None,
            error: None,
        }
    }

    /// Creates a GET request builder.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Appends a header. Repeated names are all sent, in order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Bytes::from(body);
                self.header(header::CONTENT_TYPE.as_str(), "application/json")
            }
            Err(e) => {
                self.error.get_or_insert(TestError::Json(e));
                self
            }
        }
    }

    /// Sets the remote address the request appears to come from.
    pub fn peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = addr;
        self
    }

    /// Attaches a transport-level peer identity.
    pub fn peer_identity(mut self, identity: impl Into<String>) -> Self {
        self.peer_identity = Some(PeerIdentity::new(identity));
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI, a header, or the JSON body was invalid.
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI '{}': {e}", self.uri)))?;

        let mut request = http::Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;

        for (name, value) in self.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            request.headers_mut().append(header_name, header_value);
        }

        request.extensions_mut().insert(PeerAddr(self.peer_addr));
        if let Some(identity) = self.peer_identity {
            request.extensions_mut().insert(identity);
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let request = TestRequestBuilder::post("/orders?page=2")
            .header("groups", "a")
            .header("groups", "b")
            .json(&serde_json::json!({"sku": "x"}))
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().query(), Some("page=2"));
        assert_eq!(request.headers().get_all("groups").iter().count(), 2);
        assert_eq!(request.headers()["content-type"], "application/json");
        assert_eq!(
            request.extensions().get::<PeerAddr>(),
            Some(&PeerAddr(DEFAULT_PEER_ADDR))
        );
        assert!(request.extensions().get::<PeerIdentity>().is_none());
    }

    #[test]
    fn test_peer_identity_extension() {
        let request = TestRequestBuilder::get("/")
            .peer_identity("gateway")
            .build()
            .unwrap();
        assert_eq!(
            request.extensions().get::<PeerIdentity>().map(PeerIdentity::as_str),
            Some("gateway")
        );
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let err = TestRequestBuilder::get("/")
            .header("bad header", "v")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));

        let err = TestRequestBuilder::get("/")
            .header("userid", "line\nbreak")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_uri() {
        let err = TestRequestBuilder::get("not a uri").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }
}
