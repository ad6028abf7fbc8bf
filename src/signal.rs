//! Shutdown on operating-system signals.
//!
//! On Unix both **SIGTERM** (sent by `kubectl` and the Kubernetes control
//! plane) and **SIGINT** (Ctrl-C, for local dev) count. On Windows only
//! Ctrl-C is available.

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Returns a token that is cancelled the first time the process receives a
/// shutdown signal, and stays cancelled.
///
/// Handlers are installed before this returns, so a signal arriving right
/// afterwards is not missed. Must be called inside a tokio runtime.
///
/// ```rust,no_run
/// # async fn demo(server: waypost::Server) -> Result<(), waypost::Error> {
/// let shutdown = waypost::wait_for_signal()?;
/// server.run(shutdown).await
/// # }
/// ```
pub fn wait_for_signal() -> Result<CancellationToken, Error> {
    let token = CancellationToken::new();
    let signalled = shutdown_signal()?;

    let cancel = token.clone();
    tokio::spawn(async move {
        signalled.await;
        cancel.cancel();
    });

    Ok(token)
}

#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static, Error> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt()).map_err(Error::Signal)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static, Error> {
    Ok(async {
        // Without a handler we would never shut down; wait forever instead
        // of cancelling spuriously.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
}
