//! Structured request logging.
//!
//! One INFO event per request, emitted after the rest of the chain has
//! produced its final response:
//!
//! | field            | value                                   |
//! |------------------|-----------------------------------------|
//! | `method`         | request method                          |
//! | `path`           | request path, without query             |
//! | `status`         | final status code                       |
//! | `bytes`          | response body length                    |
//! | `remote`         | client address                          |
//! | `correlation_id` | from the request context, `""` if unset |
//! | `duration`       | time spent downstream of this stage     |

use std::time::Instant;

use tracing::info;

use super::{Middleware, Next, Observation};
use crate::handler::BoxFuture;
use crate::logger::Logger;
use crate::request::Request;

/// Logs every request that passes through it.
#[derive(Clone, Debug, Default)]
pub struct RequestLogger {
    logger: Logger,
}

impl RequestLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl Middleware for RequestLogger {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let logger = self.logger.clone();

        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let path = req.path().to_owned();
            let remote = req.remote_addr().to_owned();
            let correlation_id = req.correlation_id().to_owned();

            let res = next.run(req).await;
            let seen = Observation::of(&res);

            logger.in_scope(|| {
                info!(
                    method = %method,
                    path = %path,
                    status = seen.status.as_u16(),
                    bytes = seen.bytes,
                    remote = %remote,
                    correlation_id = %correlation_id,
                    duration = ?start.elapsed(),
                    "request"
                );
            });
            res
        })
    }
}
