//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup, plus one ordered
//! middleware chain shared by every route (including the 404 and 405
//! fallbacks, so unrouted requests are correlated and logged too).

use std::collections::HashMap;
use std::sync::Arc;

use http::header::ALLOW;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{Endpoint, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup. Every registration returns `self` so calls
/// chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
    middleware: Arc<[BoxedMiddleware]>,
    fallback: Endpoint,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Arc::new([]),
            fallback: Endpoint::fixed(Response::status(StatusCode::NOT_FOUND)),
        }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax: `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use http::Method;
    /// # use waypost::{Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup, so this is a
    /// programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, Endpoint::handler(handler))
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self { self.on(Method::GET, path, handler) }
    pub fn post(self, path: &str, handler: impl Handler) -> Self { self.on(Method::POST, path, handler) }
    pub fn put(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PUT, path, handler) }
    pub fn patch(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PATCH, path, handler) }
    pub fn delete(self, path: &str, handler: impl Handler) -> Self { self.on(Method::DELETE, path, handler) }

    /// Appends a middleware to the chain. The first one added runs outermost.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let added: BoxedMiddleware = Arc::new(middleware);
        self.middleware = self.middleware.iter().cloned().chain([added]).collect();
        self
    }

    /// Replaces the default `404 Not Found` handler.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Endpoint::handler(handler);
        self
    }

    /// Runs one request through the middleware chain and its handler.
    ///
    /// This is what the server calls for every request; it is public so
    /// applications can exercise their routes without opening a socket.
    pub async fn handle(&self, mut req: Request) -> Response {
        let endpoint = match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler
            }
            None => match self.allowed_methods(req.path()) {
                Some(allow) => method_not_allowed(allow),
                None => self.fallback.clone(),
            },
        };

        Next::new(Arc::clone(&self.middleware), endpoint).run(req).await
    }

    /// Answers `req` with a bodiless `status` without consulting the routes,
    /// still running the full middleware chain around it.
    ///
    /// The server uses this for requests whose body could not be read.
    pub(crate) async fn reject(&self, req: Request, status: StatusCode) -> Response {
        let endpoint = Endpoint::fixed(Response::status(status));
        Next::new(Arc::clone(&self.middleware), endpoint).run(req).await
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(Endpoint, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = matched.value.clone();
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Comma-separated methods that do route `path`, if any.
    fn allowed_methods(&self, path: &str) -> Option<String> {
        let mut allowed: Vec<&str> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect();
        if allowed.is_empty() {
            return None;
        }
        allowed.sort_unstable();
        Some(allowed.join(", "))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn method_not_allowed(allow: String) -> Endpoint {
    Endpoint::fixed(
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW.as_str(), &allow)
            .no_body(),
    )
}
