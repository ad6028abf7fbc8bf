//! Logger handle.
//!
//! waypost logs through `tracing`. A [`Logger`] decides *which* subscriber
//! receives those events: the process-global one by default, or a dedicated
//! [`Dispatch`] handed in through [`ServerConfig`](crate::ServerConfig).
//! Cloning is cheap and clones may be used from any task.

use std::fmt;

use tracing::Dispatch;

#[derive(Clone, Default)]
pub struct Logger {
    dispatch: Option<Dispatch>,
}

impl Logger {
    /// Sends events to `subscriber` regardless of the global default.
    pub fn new(subscriber: impl Into<Dispatch>) -> Self {
        Self { dispatch: Some(subscriber.into()) }
    }

    /// Sends events to whatever subscriber is current where they are emitted.
    pub fn global() -> Self {
        Self::default()
    }

    /// Runs `f` with this logger's subscriber as the default.
    pub(crate) fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("dedicated", &self.dispatch.is_some())
            .finish()
    }
}
