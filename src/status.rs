//! HTTP status codes as a typed enum.
//!
//! Only the codes the wall actually sends are listed. Use [`Status`] anywhere
//! a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use wall::{Response, Status};
//!
//! Response::status(Status::NotFound);
//!
//! async fn create(_req: wall::Request) -> Status {
//!     Status::Ok
//! }
//! ```

/// The HTTP status codes produced by wall handlers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,         // 200
    BadRequest, // 400
    NotFound,   // 404
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok         => 200,
            Status::BadRequest => 400,
            Status::NotFound   => 404,
        }
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        match s {
            Status::Ok         => http::StatusCode::OK,
            Status::BadRequest => http::StatusCode::BAD_REQUEST,
            Status::NotFound   => http::StatusCode::NOT_FOUND,
        }
    }
}
