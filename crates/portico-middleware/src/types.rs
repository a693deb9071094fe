//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use portico_core::{PorticoError, RequestId};
use serde::Serialize;

/// The HTTP request type used in the middleware pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a JSON response from a serializable value.
    ///
    /// Falls back to a 500 error envelope if serialization fails.
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Response;

    /// Creates a JSON error response.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;

    /// Converts a [`PorticoError`] into its error envelope response.
    fn from_error(error: &PorticoError, request_id: RequestId) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => with_json_body(status, body),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                )
            }
        }
    }

    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        with_json_body(status, body.to_string().into_bytes())
    }

    fn from_error(error: &PorticoError, request_id: RequestId) -> Response {
        let request_id = request_id.to_string();
        Self::json(error.status_code(), &error.to_envelope(Some(&request_id)))
    }
}

fn with_json_body(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use portico_core::MisuseError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_error_response() {
        let response = Response::json_error(
            StatusCode::UNAUTHORIZED,
            "AUTHENTICATION_REQUIRED",
            "Authentication required",
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AUTHENTICATION_REQUIRED");
    }

    #[tokio::test]
    async fn test_from_forbidden_error() {
        let id = RequestId::new();
        let response = Response::from_error(&PorticoError::missing_group("admin"), id);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AUTHORIZATION_DENIED");
        assert_eq!(body["error"]["details"]["required_group"], "admin");
        assert_eq!(body["request_id"], id.to_string());
    }

    #[tokio::test]
    async fn test_misuse_is_opaque_internal_error() {
        let error = PorticoError::from(MisuseError::AlreadyPublished);
        let response = Response::from_error(&error, RequestId::new());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONTEXT_MISUSE");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }
}
