//! Route handlers and chain endpoints.
//!
//! Every middleware chain ends in an [`Endpoint`]. Most endpoints are
//! application handlers; the rest are canned responses the router produces
//! itself (`405` with its `Allow` list, a rejected request body), which still
//! travel back through the whole chain so they are correlated and logged like
//! any other response.

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A boxed future resolving to a [`Response`], as returned by middleware.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A route handler: any `async fn(Request) -> impl IntoResponse`, or a
/// closure of the same shape.
///
/// ```rust
/// use waypost::{Request, Router};
///
/// async fn hello(req: Request) -> String {
///     format!("hello, {}", req.param("name").unwrap_or("stranger"))
/// }
///
/// Router::new().get("/hello/{name}", hello);
/// ```
///
/// Sealed; the blanket impl covers every handler shape the router accepts.
pub trait Handler: sealed::Respond + Send + Sync + 'static {}

mod sealed {
    use super::BoxFuture;
    use crate::request::Request;

    pub trait Respond {
        fn respond(&self, req: Request) -> BoxFuture;
    }
}

use sealed::Respond;

impl<F, Fut, R> Respond for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn respond(&self, req: Request) -> BoxFuture {
        let pending = self(req);
        Box::pin(async move { pending.await.into_response() })
    }
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
}

/// The innermost step of a chain.
#[derive(Clone)]
pub(crate) enum Endpoint {
    Handler(Arc<dyn Handler>),
    /// Answers every request with a copy of the same response.
    Fixed(Response),
}

impl Endpoint {
    pub(crate) fn handler(handler: impl Handler) -> Self {
        Self::Handler(Arc::new(handler))
    }

    pub(crate) fn fixed(res: Response) -> Self {
        Self::Fixed(res)
    }

    pub(crate) fn call(&self, req: Request) -> BoxFuture {
        match self {
            Self::Handler(handler) => handler.respond(req),
            Self::Fixed(res) => Box::pin(future::ready(res.clone())),
        }
    }
}
