//! Per-hop request IDs.
//!
//! Unlike the correlation ID, which follows a call across services and is
//! echoed to the caller, the request ID names one request at this server. An
//! upstream proxy may assign it through `X-Request-Id`; otherwise a UUID v4 is
//! generated. It is stored in the [`Context`](crate::Context) only and never
//! written to the response.

use http::header::HeaderName;
use uuid::Uuid;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone, Copy, Debug, Default)]
pub struct RequestId;

impl Middleware for RequestId {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        let id = match req.headers().get(REQUEST_ID_HEADER).filter(|v| !v.is_empty()) {
            Some(value) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            None => Uuid::new_v4().to_string(),
        };
        req.context_mut().set_request_id(id);

        Box::pin(next.run(req))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::Router;

    fn app() -> Router {
        Router::new()
            .layer(RequestId)
            .get("/", |req: Request| async move { req.request_id().to_owned() })
    }

    #[tokio::test]
    async fn adopts_upstream_request_id() {
        let req = http::Request::get("/").header("X-Request-Id", "edge-42").body(Bytes::new()).unwrap();
        let res = app().handle(req.into()).await;

        assert_eq!(res.body(), b"edge-42");
        assert!(res.headers().get(REQUEST_ID_HEADER).is_none());
    }

    #[tokio::test]
    async fn generates_one_when_absent() {
        let req = http::Request::get("/").body(Bytes::new()).unwrap();
        let res = app().handle(req.into()).await;

        let id = std::str::from_utf8(res.body()).unwrap();
        assert!(Uuid::parse_str(id).is_ok(), "not a uuid: {id}");
    }

    #[tokio::test]
    async fn does_not_touch_the_correlation_id() {
        let req = http::Request::get("/").header("X-Request-Id", "edge-42").body(Bytes::new()).unwrap();
        let app = Router::new()
            .layer(RequestId)
            .get("/", |req: Request| async move { format!("[{}]", req.correlation_id()) });

        let res = app.handle(req.into()).await;
        assert_eq!(res.body(), b"[]");
    }
}
