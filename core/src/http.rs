//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `build_*` methods on `DrugClient`
//! produce `HttpRequest` values and the classifier consumes `HttpResponse`
//! values; only a `Transport` implementation ever touches the network.
//!
//! Header names are compared case-insensitively everywhere, matching HTTP.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute. The dispatcher fills in default headers before the
/// request reaches a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Add `name: value` unless the caller already set that header.
    pub fn set_default_header(&mut self, name: &str, value: &str) {
        if self.header(name).is_none() {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Shorthand for a response carrying `content-type: application/json`.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }

    /// Canonical reason phrase for the status code, e.g. `Internal Server Error`.
    pub fn reason(&self) -> &'static str {
        ureq::http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status")
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_does_not_override_caller() {
        let mut req = HttpRequest::new(HttpMethod::Post, "http://x/drugs")
            .with_header("Content-Type", "text/plain");
        req.set_default_header("content-type", "application/json");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn json_detection_ignores_case_and_parameters() {
        let resp = HttpResponse::new(200, "{}")
            .with_header("Content-Type", "Application/JSON; charset=utf-8");
        assert!(resp.is_json());
        assert!(!HttpResponse::new(200, "{}").is_json());
    }

    #[test]
    fn reason_phrase_comes_from_status() {
        assert_eq!(HttpResponse::new(500, "").reason(), "Internal Server Error");
        assert_eq!(HttpResponse::new(404, "").reason(), "Not Found");
    }
}
