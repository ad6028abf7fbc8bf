//! Minimal waypost service: a greeting, a health check and a user lookup.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:8080/
//!   curl -i -H 'X-Correlation-ID: abc-123' http://localhost:8080/users/42
//!   curl -i http://localhost:8080/health
//!
//! Every request prints one JSON line with its correlation ID. Ctrl-C drains
//! in-flight requests and exits.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use waypost::{Request, Response, Server, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let server = Server::new(ServerConfig::new(":8080"), |router| {
        router
            .get("/", |_req: Request| async { "Hello, World!" })
            .get("/health", |_req: Request| async { "OK" })
            .get("/users/{id}", get_user)
    });

    let shutdown = match waypost::wait_for_signal() {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "cannot install signal handlers");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run(shutdown).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

// GET /users/{id}
//
// The correlation ID assigned upstream is available to every handler.
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(
        r#"{{"id":"{id}","name":"alice","correlation_id":"{}"}}"#,
        req.correlation_id()
    ))
}
