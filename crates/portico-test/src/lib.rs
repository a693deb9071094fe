//! # Portico Test
//!
//! In-memory testing for Portico services. A [`TestClient`] boots the
//! standard pipeline from the same variables the service reads at startup
//! and sends requests through it without binding a port.
//!
//! ## Example
//!
//! ```
//! use portico_test::{echo_context, TestClient};
//!
//! # tokio_test::block_on(async {
//! let client = TestClient::from_vars(
//!     [
//!         ("USERID_HEADER_KEY", "userid"),
//!         ("GROUPS_HEADER_KEY", "groups"),
//!         ("CLIENTTYPE_HEADER_KEY", "clienttype"),
//!         ("BACKOFFICE_HEADER_KEY", "backoffice"),
//!         ("MICROSERVICE_GATEWAY_SERVICE_NAME", "microservice-gateway.example.org"),
//!     ],
//!     echo_context,
//! )
//! .unwrap();
//!
//! // A direct call that sets identity headers itself gets an empty context
//! let response = client
//!     .get("/orders")
//!     .user("admin")
//!     .groups(&["admin"])
//!     .send()
//!     .await
//!     .unwrap();
//!
//! let body = response.json_value().unwrap();
//! assert_eq!(body["trusted"], false);
//! assert_eq!(body["groups"], serde_json::json!([]));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/portico-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{echo_context, TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequestBuilder, DEFAULT_PEER_ADDR};
pub use response::TestResponse;
