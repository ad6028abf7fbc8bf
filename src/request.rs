//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::context::Context;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    head: http::request::Parts,
    body: Bytes,
    params: HashMap<String, String>,
    remote_addr: String,
    context: Context,
}

impl Request {
    pub(crate) fn new(head: http::request::Parts, body: Bytes, remote_addr: String) -> Self {
        Self { head, body, params: HashMap::new(), remote_addr, context: Context::default() }
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Returns `None` if the header is absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Address of the client, as seen by the listener or rewritten by
    /// [`RealIp`](crate::middleware::RealIp). Empty for requests built by hand.
    pub fn remote_addr(&self) -> &str { &self.remote_addr }

    pub fn set_remote_addr(&mut self, addr: impl Into<String>) {
        self.remote_addr = addr.into();
    }

    /// Shortcut for `req.context().correlation_id()`.
    pub fn correlation_id(&self) -> &str { self.context.correlation_id() }
    /// Shortcut for `req.context().request_id()`.
    pub fn request_id(&self) -> &str { self.context.request_id() }

    pub fn context(&self) -> &Context { &self.context }
    pub fn context_mut(&mut self) -> &mut Context { &mut self.context }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

/// Builds a request without a connection, e.g. to drive a
/// [`Router`](crate::Router) in tests. The remote address is left empty.
impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (head, body) = req.into_parts();
        Self::new(head, body, String::new())
    }
}
