//! Server integration tests over real TCP connections.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::{Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use portico_config::{ConfigLoader, PorticoConfig};
use portico_core::{ContextScope, PeerAddr, PeerIdentity};
use portico_middleware::{HandlerResult, Request, Response, ResponseExt};
use portico_server::{Server, ShutdownSignal};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const GATEWAY: &str = "microservice-gateway.example.org";

fn config_with(extra: &[(&str, &str)]) -> PorticoConfig {
    ConfigLoader::new()
        .with_vars([
            ("USERID_HEADER_KEY", "userid"),
            ("GROUPS_HEADER_KEY", "groups"),
            ("CLIENTTYPE_HEADER_KEY", "clienttype"),
            ("BACKOFFICE_HEADER_KEY", "backoffice"),
            ("MICROSERVICE_GATEWAY_SERVICE_NAME", GATEWAY),
            ("SHUTDOWN_TIMEOUT_SECS", "1"),
        ])
        .unwrap()
        .with_vars(extra.iter().copied())
        .unwrap()
        .load()
        .unwrap()
}

async fn whoami(scope: ContextScope, request: Request) -> HandlerResult {
    let ctx = scope.get()?;
    let peer = request.extensions().get::<PeerAddr>().map(ToString::to_string);
    Ok(Response::json(
        StatusCode::OK,
        &serde_json::json!({ "context": ctx, "peer": peer }),
    ))
}

struct Running {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<(), portico_server::ServerError>>,
}

async fn start(server: Server) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));
    Running {
        addr,
        shutdown,
        handle,
    }
}

async fn send(
    addr: SocketAddr,
    request: HttpRequest<Full<Bytes>>,
) -> (StatusCode, http::HeaderMap, serde_json::Value) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}

fn get(path: &str) -> http::request::Builder {
    HttpRequest::builder().uri(path).header("host", "localhost")
}

#[tokio::test]
async fn test_gateway_request_over_http() {
    let running = start(Server::new(&config_with(&[]), whoami)).await;

    let request = get("/whoami")
        .header("userid", "u1")
        .header("groups", "admin, ops")
        .header("x-gateway-service-name", GATEWAY)
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, headers, body) = send(running.addr, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(body["context"]["trusted"], true);
    assert_eq!(body["context"]["user_id"], "u1");
    assert_eq!(body["context"]["groups"], serde_json::json!(["admin", "ops"]));
    assert!(body["peer"].as_str().unwrap().starts_with("127.0.0.1:"));

    running.shutdown.trigger();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_direct_call_is_untrusted() {
    let running = start(Server::new(&config_with(&[]), whoami)).await;

    let request = get("/whoami")
        .header("userid", "admin")
        .header("groups", "admin")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(running.addr, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["trusted"], false);
    assert_eq!(body["context"]["user_id"], serde_json::Value::Null);
    assert_eq!(body["context"]["groups"], serde_json::json!([]));

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_peer_identity_resolver() {
    let server = Server::new(&config_with(&[("GATEWAY_SIGNAL_SOURCE", "peer")]), whoami)
        .with_peer_identity(|peer: &PeerAddr| {
            peer.0.ip().is_loopback().then(|| PeerIdentity::new(GATEWAY))
        });
    let running = start(server).await;

    // A header claiming to be the gateway is ignored in peer mode
    let request = get("/whoami")
        .header("userid", "u1")
        .header("x-gateway-service-name", "someone-else")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (_, _, body) = send(running.addr, request).await;

    assert_eq!(body["context"]["trusted"], true);
    assert_eq!(body["context"]["user_id"], "u1");

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_health_endpoints_skip_pipeline() {
    let server = Server::new(&config_with(&[]), whoami).with_service("orders", "1.2.3");
    let readiness = server.readiness().clone();
    let running = start(server).await;

    let (status, headers, body) =
        send(running.addr, get("/-/healthz").body(Full::new(Bytes::new())).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key("x-request-id"));
    assert_eq!(
        body,
        serde_json::json!({"status": "OK", "name": "orders", "version": "1.2.3"})
    );

    let (status, _, body) =
        send(running.addr, get("/-/ready").body(Full::new(Bytes::new())).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    readiness.set_ready(false);
    let (status, _, body) =
        send(running.addr, get("/-/ready").body(Full::new(Bytes::new())).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_handler_timeout() {
    async fn slow(_scope: ContextScope, _request: Request) -> HandlerResult {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Response::json(StatusCode::OK, &"late"))
    }

    let server = Server::new(&config_with(&[]), slow)
        .with_request_timeout(Duration::from_millis(50));
    let running = start(server).await;

    let (status, headers, body) =
        send(running.addr, get("/slow").body(Full::new(Bytes::new())).unwrap()).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "HANDLER_TIMEOUT");

    // The timeout is answered inside the pipeline, so it can be correlated
    let request_id = headers["x-request-id"].to_str().unwrap();
    assert_eq!(body["request_id"], request_id);

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let running = start(Server::new(&config_with(&[]), whoami)).await;

    running.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("server should stop within the drain timeout")
        .unwrap()
        .unwrap();

    assert!(TcpStream::connect(running.addr).await.is_err());
}
