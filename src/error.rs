//! Unified error type.

use std::time::Duration;

/// The error type returned by waypost's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding the listener, draining it on shutdown,
/// loading configuration and installing signal handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The listener could not bind, or died for a reason other than our own
    /// shutdown request.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The listener task panicked while serving.
    #[error("server error: listener task failed: {0}")]
    Listener(#[source] tokio::task::JoinError),

    /// In-flight connections were still open when the drain deadline passed.
    /// They have been aborted.
    #[error("shutdown: in-flight requests still running after {0:?}")]
    ShutdownTimeout(Duration),

    /// The listener task panicked or was cancelled while draining.
    #[error("shutdown: {0}")]
    Shutdown(#[source] tokio::task::JoinError),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("signal: {0}")]
    Signal(#[source] std::io::Error),
}
