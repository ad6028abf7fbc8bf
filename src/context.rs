//! Per-request context.
//!
//! Every [`Request`](crate::Request) owns exactly one [`Context`]. Middleware
//! writes into it on the way in; handlers and later middleware read from it.
//! Fields are typed, so there is no way to store a value of the wrong kind
//! under a well-known key.

/// Values attached to a single request while it moves through the chain.
#[derive(Clone, Debug, Default)]
pub struct Context {
    correlation_id: Option<String>,
    request_id: Option<String>,
}

impl Context {
    /// The request's correlation ID, or `""` if none has been assigned yet.
    ///
    /// Absence is not an error: code running before the correlation
    /// middleware (or on a request built by hand) simply sees an empty
    /// string.
    pub fn correlation_id(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or("")
    }

    /// Assigns the correlation ID, replacing any previous value.
    pub fn set_correlation_id(&mut self, id: impl Into<String>) {
        self.correlation_id = Some(id.into());
    }

    /// The hop-local request ID, or `""` if none has been assigned.
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("")
    }

    pub fn set_request_id(&mut self, id: impl Into<String>) {
        self.request_id = Some(id.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_id_reads_as_empty() {
        assert_eq!(Context::default().correlation_id(), "");
    }

    #[test]
    fn stored_id_is_returned() {
        let mut ctx = Context::default();
        ctx.set_correlation_id("test-id-789");
        assert_eq!(ctx.correlation_id(), "test-id-789");
    }

    #[test]
    fn request_and_correlation_ids_are_independent() {
        let mut ctx = Context::default();
        ctx.set_request_id("req-1");
        assert_eq!(ctx.request_id(), "req-1");
        assert_eq!(ctx.correlation_id(), "");
    }
}
