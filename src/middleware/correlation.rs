//! Correlation ID propagation.
//!
//! 1. Read the configured header (default `X-Correlation-ID`).
//! 2. Adopt its value verbatim if present and non-empty, otherwise mint a
//!    UUID v4.
//! 3. Store it in the request [`Context`](crate::Context) for everything
//!    downstream.
//! 4. Echo it on the response under the same header name.

use http::header::{HeaderName, HeaderValue};
use uuid::Uuid;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Default header carrying the correlation ID.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Assigns every request a correlation ID and echoes it back to the caller.
#[derive(Clone, Debug)]
pub struct CorrelationId {
    header: HeaderName,
}

impl CorrelationId {
    /// Reads and writes `header` only; the default name is not consulted.
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &HeaderName { &self.header }
}

impl Default for CorrelationId {
    fn default() -> Self { Self::new(CORRELATION_ID_HEADER) }
}

impl Middleware for CorrelationId {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        let header = self.header.clone();

        let incoming = req.headers().get(&header).filter(|v| !v.is_empty()).cloned();
        let (id, echo) = match incoming {
            // Opaque: whatever the caller sent goes back out byte for byte.
            Some(value) => (String::from_utf8_lossy(value.as_bytes()).into_owned(), Some(value)),
            None => {
                let id = Uuid::new_v4().to_string();
                let echo = HeaderValue::from_str(&id).ok();
                (id, echo)
            }
        };

        req.context_mut().set_correlation_id(id);

        Box::pin(async move {
            let mut res = next.run(req).await;
            if let Some(value) = echo {
                // A handler that set the header itself wins.
                res.headers_mut().entry(header).or_insert(value);
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::{Request, Response, Router};

    /// Router with the correlation middleware whose handler reports the ID it saw.
    fn app(mw: CorrelationId, seen: Arc<Mutex<Vec<String>>>) -> Router {
        Router::new().layer(mw).get("/test", move |req: Request| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(req.correlation_id().to_owned());
                Response::status(StatusCode::OK)
            }
        })
    }

    fn get(headers: &[(&str, &str)]) -> Request {
        let mut req = http::Request::get("/test");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn generates_uuid_when_header_missing() {
        let seen = Arc::default();
        let res = app(CorrelationId::default(), Arc::clone(&seen)).handle(get(&[])).await;

        let echoed = res.headers()[CORRELATION_ID_HEADER].to_str().unwrap().to_owned();
        assert!(Uuid::parse_str(&echoed).is_ok(), "not a uuid: {echoed}");
        assert_eq!(seen.lock().unwrap().as_slice(), [echoed]);
    }

    #[tokio::test]
    async fn propagates_existing_id_verbatim() {
        let seen = Arc::default();
        let res = app(CorrelationId::default(), Arc::clone(&seen))
            .handle(get(&[("X-Correlation-ID", "test-correlation-id-123")]))
            .await;

        assert_eq!(res.headers()[CORRELATION_ID_HEADER], "test-correlation-id-123");
        assert_eq!(seen.lock().unwrap().as_slice(), ["test-correlation-id-123"]);
    }

    #[tokio::test]
    async fn empty_header_is_treated_as_missing() {
        let seen = Arc::default();
        let res = app(CorrelationId::default(), Arc::clone(&seen))
            .handle(get(&[("X-Correlation-ID", "")]))
            .await;

        let echoed = res.headers()[CORRELATION_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(echoed).is_ok());
    }

    #[tokio::test]
    async fn custom_header_replaces_default() {
        let custom = HeaderName::from_static("x-custom-request-id");
        let seen = Arc::default();
        let res = app(CorrelationId::new(custom.clone()), Arc::clone(&seen))
            .handle(get(&[
                ("X-Custom-Request-ID", "custom-id-456"),
                ("X-Correlation-ID", "ignored"),
            ]))
            .await;

        assert_eq!(res.headers()[&custom], "custom-id-456");
        assert!(res.headers().get(CORRELATION_ID_HEADER).is_none());
        assert_eq!(seen.lock().unwrap().as_slice(), ["custom-id-456"]);
    }

    #[tokio::test]
    async fn handler_header_is_not_overwritten() {
        let app = Router::new().layer(CorrelationId::default()).get("/test", |_req: Request| async {
            Response::builder().header("x-correlation-id", "from-handler").no_body()
        });

        let res = app.handle(get(&[("X-Correlation-ID", "from-client")])).await;
        assert_eq!(res.headers()[CORRELATION_ID_HEADER], "from-handler");
    }
}
