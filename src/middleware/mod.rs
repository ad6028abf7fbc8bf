//! Middleware layer.
//!
//! A middleware receives the request together with [`Next`], the rest of the
//! chain. It may inspect or change the request, must call `next.run(req)`
//! (or answer on its own), and may inspect or change the response before
//! handing it back.
//!
//! ```rust,no_run
//! use waypost::middleware::{self, Next};
//! use waypost::{Request, Response, Router};
//!
//! async fn stamp(req: Request, next: Next) -> Response {
//!     let mut res = next.run(req).await;
//!     res.headers_mut().insert("x-served-by", "waypost".parse().unwrap());
//!     res
//! }
//!
//! let app = Router::new().layer(middleware::from_fn(stamp));
//! ```
//!
//! Middleware registered first runs outermost. [`Server`](crate::Server)
//! installs the built-in stack in this order, ahead of anything the
//! application adds:
//!
//! 1. [`RequestId`]: assign or adopt the per-hop request ID
//! 2. [`CorrelationId`]: assign or adopt the correlation ID
//! 3. [`RealIp`]: trust proxy headers for the client address
//! 4. [`RequestLogger`]: one structured record per request
//! 5. [`Recover`]: turn handler panics into `500`
//!
//! [`Recover`] sits inside [`RequestLogger`] so a panicking request is still
//! logged, with its `500`.

mod correlation;
mod observe;
mod real_ip;
mod recover;
mod request_id;
mod request_log;

pub use correlation::{CORRELATION_ID_HEADER, CorrelationId};
pub use observe::Observation;
pub use real_ip::RealIp;
pub use recover::Recover;
pub use request_id::{REQUEST_ID_HEADER, RequestId};
pub use request_log::RequestLogger;

use std::future::Future;
use std::sync::Arc;

pub use crate::handler::BoxFuture;

use crate::handler::Endpoint;
use crate::request::Request;
use crate::response::Response;

/// A request interceptor.
///
/// Implement this for configurable middleware structs; use [`from_fn`] for
/// plain async functions.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

// ── Next ──────────────────────────────────────────────────────────────────────

/// The remainder of the chain: the middleware still to run, then the handler.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    position: usize,
    endpoint: Endpoint,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: Endpoint) -> Self {
        Self { stack, position: 0, endpoint }
    }

    /// Runs the rest of the chain and returns its response.
    pub async fn run(self, req: Request) -> Response {
        match self.stack.get(self.position).cloned() {
            Some(middleware) => {
                let next = Self { position: self.position + 1, ..self };
                middleware.call(req, next).await
            }
            None => self.endpoint.call(req).await,
        }
    }
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// Adapts `async fn(Request, Next) -> Response` into a [`Middleware`].
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

/// Middleware built by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, next))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Captures JSON log output from a dedicated [`Logger`](crate::Logger).

    use std::io;
    use std::sync::{Arc, Mutex};

    use crate::Logger;

    #[derive(Clone, Default)]
    pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    impl Capture {
        pub(crate) fn logger(&self) -> Logger {
            let sink = self.clone();
            Logger::new(
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::TRACE)
                    .json()
                    .flatten_event(true)
                    .with_writer(move || sink.clone())
                    .finish(),
            )
        }

        /// Every captured record, parsed.
        pub(crate) fn records(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }

        /// The single `request` record; panics unless there is exactly one.
        pub(crate) fn request_record(&self) -> serde_json::Value {
            let mut records: Vec<_> = self
                .records()
                .into_iter()
                .filter(|r| r["message"] == "request")
                .collect();
            assert_eq!(records.len(), 1, "expected one request record, got {records:?}");
            records.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Router;
    use bytes::Bytes;

    async fn tag(label: &'static str, req: Request, next: Next) -> Response {
        let mut res = next.run(req).await;
        res.headers_mut().append("x-trail", label.parse().unwrap());
        res
    }

    #[tokio::test]
    async fn middleware_runs_in_registration_order() {
        let app = Router::new()
            .layer(from_fn(|req, next| tag("outer", req, next)))
            .layer(from_fn(|req, next| tag("inner", req, next)))
            .get("/", |_req: Request| async { "ok" });

        let req = http::Request::get("/").body(Bytes::new()).unwrap();
        let res = app.handle(req.into()).await;

        // Responses travel back inside-out.
        let trail: Vec<_> = res.headers().get_all("x-trail").iter().collect();
        assert_eq!(trail, ["inner", "outer"]);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let app = Router::new()
            .layer(from_fn(|_req, _next| async { Response::status(http::StatusCode::FORBIDDEN) }))
            .get("/", |_req: Request| async { "ok" });

        let req = http::Request::get("/").body(Bytes::new()).unwrap();
        let res = app.handle(req.into()).await;
        assert_eq!(res.status_code(), http::StatusCode::FORBIDDEN);
    }
}
