//! Server configuration.
//!
//! Built in code with the `with_*` setters, or loaded from TOML:
//!
//! ```toml
//! addr = "0.0.0.0:8080"
//! correlation_header = "X-Request-ID"
//! shutdown_timeout_secs = 10
//! max_body_bytes = 1048576
//! ```
//!
//! Every field is optional; missing ones take the defaults shown by
//! [`ServerConfig::default`]. The config is immutable once handed to
//! [`Server::new`](crate::Server::new), so the correlation header name cannot
//! change under live traffic.

use std::time::Duration;

use http::header::HeaderName;
use serde::{Deserialize, Deserializer};

use crate::error::Error;
use crate::logger::Logger;
use crate::middleware::CORRELATION_ID_HEADER;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// `host:port`, or `:port` for every interface. Port `0` picks a free one.
    pub addr: String,

    /// Header read for, and echoed with, the correlation ID.
    #[serde(deserialize_with = "header_name")]
    pub correlation_header: HeaderName,

    /// How long in-flight requests get to finish once shutdown starts.
    #[serde(rename = "shutdown_timeout_secs", deserialize_with = "seconds")]
    pub shutdown_timeout: Duration,

    /// Request bodies larger than this are answered with `413` before any
    /// handler runs.
    pub max_body_bytes: usize,

    /// Where request records and lifecycle messages go.
    #[serde(skip)]
    pub logger: Logger,
}

impl ServerConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), ..Self::default() }
    }

    /// Parses a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_correlation_header(mut self, header: HeaderName) -> Self {
        self.correlation_header = header;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            correlation_header: CORRELATION_ID_HEADER,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            logger: Logger::global(),
        }
    }
}

fn header_name<'de, D: Deserializer<'de>>(de: D) -> Result<HeaderName, D::Error> {
    let raw = String::deserialize(de)?;
    HeaderName::try_from(raw.as_str()).map_err(serde::de::Error::custom)
}

fn seconds<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
    u64::deserialize(de).map(Duration::from_secs)
}
