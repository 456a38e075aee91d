//! Incoming HTTP request type.

use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An incoming HTTP request with its body fully read.
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl Request {
    pub(crate) fn new(
        method: String,
        path: String,
        query: Option<String>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self { method, path, query, headers, body }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first value of the form field `name`.
    ///
    /// A url-encoded body is searched before the query string, so a posted
    /// field shadows a query parameter of the same name. The body is only
    /// consulted when the content type says it is a form. Absent fields
    /// read as the empty string.
    pub fn form_value(&self, name: &str) -> String {
        let from_body = self
            .is_form()
            .then(|| first_pair(form_urlencoded::parse(&self.body), name))
            .flatten();

        from_body
            .or_else(|| {
                self.query
                    .as_deref()
                    .and_then(|q| first_pair(form_urlencoded::parse(q.as_bytes()), name))
            })
            .unwrap_or_default()
    }

    fn is_form(&self) -> bool {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
    }
}

fn first_pair(mut pairs: form_urlencoded::Parse<'_>, name: &str) -> Option<String> {
    pairs.find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content_type: Option<&str>, query: Option<&str>, body: &str) -> Request {
        let headers = content_type
            .map(|ct| vec![("Content-Type".to_owned(), ct.to_owned())])
            .unwrap_or_default();
        Request::new(
            "POST".to_owned(),
            "/".to_owned(),
            query.map(str::to_owned),
            headers,
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn decodes_url_encoded_body() {
        let req = request(Some(FORM_CONTENT_TYPE), None, "user=Amy+Pond&note=hi%21");
        assert_eq!(req.form_value("user"), "Amy Pond");
        assert_eq!(req.form_value("note"), "hi!");
    }

    #[test]
    fn missing_field_is_empty() {
        let req = request(Some(FORM_CONTENT_TYPE), None, "user=amy");
        assert_eq!(req.form_value("note"), "");
    }

    #[test]
    fn body_shadows_query_and_first_value_wins() {
        let req = request(
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            Some("user=query&note=from-query"),
            "user=body&user=second",
        );
        assert_eq!(req.form_value("user"), "body");
        assert_eq!(req.form_value("note"), "from-query");
    }

    #[test]
    fn non_form_body_is_ignored() {
        let req = request(Some("text/plain"), None, "user=amy");
        assert_eq!(req.form_value("user"), "");

        let req = request(None, None, "user=amy");
        assert_eq!(req.form_value("user"), "");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request(Some("text/plain"), None, "");
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }
}
