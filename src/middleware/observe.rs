use http::StatusCode;

use crate::response::Response;

/// What a response looked like on its way out: final status and body size.
///
/// Taken by looking at the finished [`Response`]; the response itself is
/// never buffered, copied or changed. A response built without an explicit
/// status reports `200 OK`, matching what goes on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub status: StatusCode,
    pub bytes: usize,
}

impl Observation {
    pub fn of(res: &Response) -> Self {
        Self { status: res.status_code(), bytes: res.body().len() }
    }
}
