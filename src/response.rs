//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. The server turns it
//! into a hyper response; handlers never see hyper types.

use bytes::Bytes;
use http_body_util::Full;

use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Html, // text/html; charset=utf-8
    Text, // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use wall::{ContentType, Response, Status};
///
/// Response::html(b"<ul></ul>".to_vec());
/// Response::text("hello");
/// Response::status(Status::NotFound);
///
/// Response::builder()
///     .status(Status::Ok)
///     .header("cache-control", "no-store")
///     .bytes(ContentType::Html, b"<p>hi</p>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: Status,
}

impl Response {
    /// `200 OK` with `text/html; charset=utf-8`.
    pub fn html(body: Vec<u8>) -> Self {
        Self::bytes_raw(ContentType::Html, body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw(ContentType::Text, body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok }
    }

    pub fn status_code(&self) -> Status { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn bytes_raw(content_type: ContentType, body: Vec<u8>) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.as_str().to_owned())],
            status: Status::Ok,
        }
    }

    /// Converts into the hyper-facing response. Headers whose name or value
    /// is not valid on the wire are dropped with a warning.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status.into();

        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.as_str().to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// The "nothing written" response: `200 OK`, empty body.
impl IntoResponse for () {
    fn into_response(self) -> Response { Response::status(Status::Ok) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_sets_content_type() {
        let res = Response::html(b"<p></p>".to_vec()).into_inner();
        assert_eq!(res.status(), http::StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    }

    #[test]
    fn builder_keeps_content_type_first() {
        let res = Response::builder()
            .header("cache-control", "no-store")
            .bytes(ContentType::Text, b"ok".to_vec());
        assert_eq!(res.headers[0].0, "content-type");
        assert_eq!(res.header("Cache-Control"), Some("no-store"));
    }

    #[test]
    fn invalid_header_is_dropped() {
        let res = Response::builder()
            .header("bad header", "x")
            .no_body()
            .into_inner();
        assert!(res.headers().is_empty());
    }

    #[test]
    fn unit_is_empty_ok() {
        let res = ().into_response();
        assert_eq!(res.status_code(), Status::Ok);
        assert!(res.body().is_empty());
    }
}
