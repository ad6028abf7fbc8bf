//! # waypost
//!
//! The boring parts every small HTTP service needs, done once.
//!
//! - **Correlation IDs**: adopt `X-Correlation-ID` from the caller or mint a
//!   UUID, expose it to handlers, echo it on the response.
//! - **Request logging**: one structured `tracing` event per request with
//!   method, path, status, bytes, client address, correlation ID and latency.
//! - **Lifecycle**: bind on a background task, stop on SIGTERM / Ctrl-C,
//!   drain in-flight requests with a deadline.
//!
//! Routing is [`matchit`], connections are [`hyper`], logging output is
//! whatever `tracing` subscriber you install.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use waypost::{Request, Response, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), waypost::Error> {
//!     let server = Server::new(ServerConfig::new(":8080"), |router| {
//!         router
//!             .get("/", hello)
//!             .get("/health", |_req: Request| async { "OK" })
//!     });
//!
//!     server.run(waypost::wait_for_signal()?).await
//! }
//!
//! async fn hello(req: Request) -> Response {
//!     Response::text(format!("hello, request {}", req.correlation_id()))
//! }
//! ```

mod config;
mod context;
mod error;
mod handler;
mod logger;
mod request;
mod response;
mod router;
mod server;
mod signal;

pub mod middleware;

pub use config::ServerConfig;
pub use context::Context;
pub use error::Error;
pub use handler::Handler;
pub use logger::Logger;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Handle, Server, State};
pub use signal::wait_for_signal;

pub use tokio_util::sync::CancellationToken;
