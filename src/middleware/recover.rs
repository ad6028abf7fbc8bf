//! Panic recovery.
//!
//! A panic inside a handler would otherwise tear down the whole connection
//! with no response. This stage catches it, logs it and answers
//! `500 Internal Server Error` so outer middleware (correlation, logging)
//! still sees a normal response. Anything layered inside it is unwound
//! past, so it belongs directly around the handlers.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::logger::Logger;
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Debug, Default)]
pub struct Recover {
    logger: Logger,
}

impl Recover {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl Middleware for Recover {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let logger = self.logger.clone();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let correlation_id = req.correlation_id().to_owned();

        Box::pin(async move {
            match AssertUnwindSafe(next.run(req)).catch_unwind().await {
                Ok(res) => res,
                Err(panic) => {
                    logger.in_scope(|| {
                        error!(
                            method = %method,
                            path = %path,
                            correlation_id = %correlation_id,
                            panic = panic_message(panic.as_ref()),
                            "handler panicked"
                        );
                    });
                    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
