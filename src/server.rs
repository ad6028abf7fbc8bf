//! HTTP server lifecycle and graceful shutdown.
//!
//! ```text
//!   Idle ──start──▶ Running ──cancel──▶ ShuttingDown ──drained / timed out──▶ Stopped
//!                      │                                                         ▲
//!                      └──────────── bind or listener failure ───────────────────┘
//! ```
//!
//! [`Server::run`] spawns the listener and then waits for whichever comes
//! first: the cancellation token or a listener failure. On cancellation it
//! stops accepting, lets in-flight connections finish, and gives up after
//! [`ServerConfig::shutdown_timeout`], aborting whatever is still running.
//!
//! # Kubernetes
//!
//! A terminating pod receives **SIGTERM** and has
//! `terminationGracePeriodSeconds` (default 30 s) before SIGKILL. Keep the
//! shutdown timeout comfortably below it.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::Error;
use crate::logger::Logger;
use crate::middleware::{CorrelationId, RealIp, Recover, RequestId, RequestLogger};
use crate::request::Request;
use crate::router::Router;

/// Where the server is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Clone, Copy, Debug)]
struct Status {
    state: State,
    local_addr: Option<SocketAddr>,
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    router: Arc<Router>,
    status: Arc<watch::Sender<Status>>,
}

impl Server {
    /// Builds the server and calls `routes` once to register the
    /// application's routes and middleware.
    ///
    /// The built-in stack (request ID, correlation ID, real IP, request
    /// logging, panic recovery) is installed first, so it wraps everything
    /// `routes` adds.
    ///
    /// ```rust,no_run
    /// use waypost::{Request, Response, Server, ServerConfig};
    ///
    /// let server = Server::new(ServerConfig::new(":8080"), |router| {
    ///     router.get("/health", |_req: Request| async { Response::text("OK") })
    /// });
    /// ```
    pub fn new<F>(config: ServerConfig, routes: F) -> Self
    where
        F: FnOnce(Router) -> Router,
    {
        let router = Router::new()
            .layer(RequestId)
            .layer(CorrelationId::new(config.correlation_header.clone()))
            .layer(RealIp)
            .layer(RequestLogger::new(config.logger.clone()))
            .layer(Recover::new(config.logger.clone()));

        let (status, _) = watch::channel(Status { state: State::Idle, local_addr: None });

        Self { router: Arc::new(routes(router)), config, status: Arc::new(status) }
    }

    /// A handle for observing the server from other tasks.
    pub fn handle(&self) -> Handle {
        Handle { status: self.status.subscribe() }
    }

    /// Serves until `shutdown` is cancelled or the listener fails.
    ///
    /// Returns `Ok(())` after a clean drain, [`Error::ShutdownTimeout`] if
    /// connections outlived the drain deadline, [`Error::Serve`] if the
    /// listener could not bind, and [`Error::Listener`] if it panicked. An
    /// already-cancelled token shuts down straight away.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), Error> {
        let logger = self.config.logger.clone();
        let Listening { mut task, mut failed, stop } = self.start();

        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                logger.in_scope(|| info!("shutdown signal received"));
            }

            report = &mut failed => {
                let err = listener_failure(report, task).await;
                self.set_state(State::Stopped);
                logger.in_scope(|| error!(error = %err, "listener failed"));
                return Err(err);
            }
        }

        self.set_state(State::ShuttingDown);
        stop.cancel();

        let timeout = self.config.shutdown_timeout;
        let drained = tokio::time::timeout(timeout, &mut task).await;
        self.set_state(State::Stopped);

        match drained {
            Ok(Ok(())) => {
                logger.in_scope(|| info!("server gracefully stopped"));
                Ok(())
            }
            Ok(Err(join)) => Err(Error::Shutdown(join)),
            Err(_elapsed) => {
                // Dropping the listener task's JoinSet aborts every connection.
                task.abort();
                logger.in_scope(|| warn!(timeout = ?timeout, "shutdown timed out, aborting in-flight connections"));
                Err(Error::ShutdownTimeout(timeout))
            }
        }
    }

    /// Spawns the listener task and returns at once.
    ///
    /// Binding happens on the task, so a bad address shows up on `failed`
    /// rather than here. `failed` is a oneshot: the task can always report
    /// without blocking, even if nobody is listening any more.
    fn start(&self) -> Listening {
        let (fail_tx, failed) = oneshot::channel();
        let stop = CancellationToken::new();

        self.set_state(State::Running);

        let task = tokio::spawn(listen(
            normalize_addr(&self.config.addr),
            self.dispatcher(),
            self.config.logger.clone(),
            Arc::clone(&self.status),
            stop.clone(),
            fail_tx,
        ));

        Listening { task, failed, stop }
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            router: Arc::clone(&self.router),
            logger: self.config.logger.clone(),
            max_body_bytes: self.config.max_body_bytes,
        }
    }

    fn set_state(&self, state: State) {
        self.status.send_modify(|s| s.state = state);
    }
}

struct Listening {
    task: JoinHandle<()>,
    failed: oneshot::Receiver<io::Error>,
    stop: CancellationToken,
}

/// Turns the listener's report into an error. A closed channel means the task
/// ended without reporting, which before shutdown only happens on a panic.
async fn listener_failure(report: Result<io::Error, oneshot::error::RecvError>, task: JoinHandle<()>) -> Error {
    match report {
        Ok(err) => Error::Serve(err),
        Err(_) => match task.await {
            Err(join) => Error::Listener(join),
            Ok(()) => Error::Serve(io::Error::other("listener exited unexpectedly")),
        },
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Read-only view of a [`Server`], usable after the server has moved into
/// [`Server::run`].
#[derive(Clone, Debug)]
pub struct Handle {
    status: watch::Receiver<Status>,
}

impl Handle {
    pub fn state(&self) -> State {
        self.status.borrow().state
    }

    /// The address actually bound, once the listener is up.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.status.borrow().local_addr
    }

    /// Waits until the listener is bound and returns its address, or `None`
    /// if the server stopped without ever binding.
    pub async fn listening(&self) -> Option<SocketAddr> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|s| s.local_addr.is_some() || s.state == State::Stopped)
            .await
            .ok()?;
        status.local_addr
    }
}

// ── Listener task ─────────────────────────────────────────────────────────────

async fn listen(
    addr: String,
    dispatcher: Dispatcher,
    logger: Logger,
    status: Arc<watch::Sender<Status>>,
    stop: CancellationToken,
    failed: oneshot::Sender<io::Error>,
) {
    logger.in_scope(|| info!(addr = %addr, "server starting"));

    let listener = match TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            logger.in_scope(|| error!(addr = %addr, error = %e, "bind failed"));
            // The receiver is gone only if run() already returned.
            let _ = failed.send(e);
            return;
        }
    };
    if let Ok(local) = listener.local_addr() {
        status.send_modify(|s| s.local_addr = Some(local));
        logger.in_scope(|| info!(addr = %local, "listening"));
    }

    // Connection tasks live in the JoinSet so that aborting this task
    // aborts them too.
    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();
    // `auto::Builder` serves both HTTP/1.1 and HTTP/2.
    let builder = ConnBuilder::new(TokioExecutor::new());

    loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => {
                logger.in_scope(|| info!(in_flight = connections.len(), "draining connections"));
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        // Per-connection failures (reset before accept, fd
                        // exhaustion) are not fatal to the listener.
                        logger.in_scope(|| error!(error = %e, "accept error"));
                        continue;
                    }
                };

                let dispatcher = dispatcher.clone();
                let svc = service_fn(move |req| dispatcher.clone().dispatch(req, remote_addr));

                let conn = builder.serve_connection(TokioIo::new(stream), svc).into_owned();
                let conn = graceful.watch(conn);

                let logger = logger.clone();
                connections.spawn(async move {
                    if let Err(e) = conn.await {
                        logger.in_scope(|| debug!(peer = %remote_addr, "connection error: {e}"));
                    }
                });
            }

            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    graceful.shutdown().await;
    while connections.join_next().await.is_some() {}
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Everything a connection needs to answer requests.
#[derive(Clone)]
struct Dispatcher {
    router: Arc<Router>,
    logger: Logger,
    max_body_bytes: usize,
}

impl Dispatcher {
    /// Buffers the body up to the configured limit, then hands the request to
    /// the router.
    ///
    /// Never fails from hyper's point of view. An oversized body becomes
    /// `413`, an unreadable one `400`; both still pass through the middleware
    /// chain so they are correlated and logged.
    async fn dispatch<B>(
        self,
        req: http::Request<B>,
        remote_addr: SocketAddr,
    ) -> Result<http::Response<Full<Bytes>>, Infallible>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (head, body) = req.into_parts();
        let remote = remote_addr.to_string();

        let res = match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => {
                let req = Request::new(head, collected.to_bytes(), remote);
                self.router.handle(req).await
            }
            Err(e) => {
                let status = if e.downcast_ref::<LengthLimitError>().is_some() {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                self.logger.in_scope(|| debug!(peer = %remote_addr, error = %e, "failed to read request body"));
                let req = Request::new(head, Bytes::new(), remote);
                self.router.reject(req, status).await
            }
        };

        Ok(res.into_inner())
    }
}

/// Accepts Go-style `:8080` as shorthand for every interface.
fn normalize_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_owned(),
    }
}
