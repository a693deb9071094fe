//! Portico - entry point
//!
//! Serves a `whoami` endpoint that echoes the caller context published for
//! each request. Useful for verifying a gateway deployment end to end.

use std::path::PathBuf;

use http::StatusCode;
use portico::config::{ConfigError, ConfigLoader, GatewaySignal, PorticoConfig};
use portico::core::ContextScope;
use portico::middleware::{HandlerResult, Request, Response, ResponseExt};
use portico::server::Server;
use portico::telemetry::{init_logging, LogConfig};
use serde::Serialize;

/// Config file read when `--config` is not given, if it exists.
const DEFAULT_CONFIG_FILE: &str = "portico.toml";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("portico {}", portico::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Portico - gateway-trust context echo service

USAGE:
    portico [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to a TOML configuration file (default: ./portico.toml if present)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES (override the file; a .env file is loaded first):
    USERID_HEADER_KEY                  Header carrying the user id (required)
    GROUPS_HEADER_KEY                  Header carrying the groups list (required)
    CLIENTTYPE_HEADER_KEY              Header carrying the client type (required)
    BACKOFFICE_HEADER_KEY              Header carrying the backoffice flag (required)
    MICROSERVICE_GATEWAY_SERVICE_NAME  Expected gateway signature (required)
    GATEWAY_SIGNAL_SOURCE              header | peer (default: header)
    GATEWAY_SIGNAL_HEADER_KEY          Signal header (default: x-gateway-service-name)
    GROUPS_HEADER_DELIMITER            Groups delimiter (default: ,)
    BACKOFFICE_TRUTHY_TOKEN            Backoffice true value (default: true)
    HTTP_HOST / HTTP_PORT              Bind address (default: 0.0.0.0:3000)
    SHUTDOWN_TIMEOUT_SECS              Graceful shutdown timeout (default: 10)
    TRUST_INBOUND_REQUEST_ID           Adopt inbound x-request-id (default: false)
    LOG_LEVEL / LOG_FORMAT             Filter directive and json | pretty
"
    );
}

fn load_config(args: &Args) -> Result<PorticoConfig, ConfigError> {
    let loader = ConfigLoader::new().with_dotenv();
    let loader = match &args.config {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    loader.with_env()?.load()
}

#[derive(Serialize)]
struct WhoAmI<'a> {
    request_id: String,
    authenticated: bool,
    context: &'a portico::core::RequestContext,
}

async fn whoami(scope: ContextScope, _request: Request) -> HandlerResult {
    let ctx = scope.get()?;
    let body = WhoAmI {
        request_id: scope.request_id().to_string(),
        authenticated: ctx.is_authenticated(),
        context: ctx,
    };
    Ok(Response::json(StatusCode::OK, &body))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging is configured from the loaded settings, so config errors go to stderr
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("portico: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&LogConfig::from_settings(&config.logging, "portico")) {
        eprintln!("portico: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let signal = match config.headers.gateway_signal() {
        GatewaySignal::Header(name) => format!("header:{name}"),
        GatewaySignal::PeerIdentity => "peer".to_string(),
    };
    tracing::info!(
        version = portico::VERSION,
        host = %config.server.host,
        port = config.server.port,
        gateway_signal = %signal,
        "starting portico"
    );

    let server = Server::new(&config, whoami).with_service("portico", portico::VERSION);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
