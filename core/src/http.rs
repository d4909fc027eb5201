//! HTTP request, response and result types.
//!
//! # Design
//! Requests and responses are plain data. The client builds and inspects
//! them while a `Transport` does the actual I/O, which keeps everything here
//! deterministic and easy to test. All fields use owned types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::{HeaderName, HttpHeaders, QueryParameters};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether a request body is sent for this method.
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct ParseMethodError(String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HttpHeaders::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, url)
    }

    /// Append a header. Existing headers with the same name are kept.
    pub fn with_header(mut self, name: impl Into<HeaderName>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append `params` to the URL's query string.
    ///
    /// Fails if the URL cannot be parsed.
    pub fn with_query(mut self, params: &QueryParameters) -> Result<Self, url::ParseError> {
        let mut url = url::Url::parse(&self.url)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params.iter() {
                pairs.append_pair(k, v);
            }
        }
        self.url = url.into();
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    ///
    /// Sets `content-type: application/json` unless a content type is
    /// already present.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers
            .set_if_absent(HeaderName::CONTENT_TYPE, "application/json");
        Ok(self)
    }

    /// Encode `params` as an `application/x-www-form-urlencoded` body.
    pub fn with_form(mut self, params: &QueryParameters) -> Self {
        self.body = Some(params.to_query_string().into_bytes());
        self.headers
            .set_if_absent(HeaderName::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

/// Whatever a transport produced for a request.
///
/// Transports that can serve non-HTTP schemes report those answers as
/// `Other`; the client rejects them before any decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Http(HttpResponse),
    Other { url: String, body: Vec<u8> },
}

/// Status and headers of the response a value was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    status: u16,
    headers: HttpHeaders,
}

impl ResponseMetadata {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A decoded value paired with the metadata of its response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResult<T> {
    value: T,
    metadata: ResponseMetadata,
}

impl HttpResult<Vec<u8>> {
    pub(crate) fn from_response(response: HttpResponse) -> Self {
        Self {
            value: response.body,
            metadata: ResponseMetadata {
                status: response.status,
                headers: response.headers,
            },
        }
    }
}

impl<T> HttpResult<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn metadata(&self) -> &ResponseMetadata {
        &self.metadata
    }

    pub fn status(&self) -> u16 {
        self.metadata.status
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.metadata.headers
    }

    pub fn is_success(&self) -> bool {
        self.metadata.is_success()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, ResponseMetadata) {
        (self.value, self.metadata)
    }

    /// Replace the value, keeping the metadata.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<HttpResult<U>, E> {
        Ok(HttpResult {
            value: f(self.value)?,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert!("BREW".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn only_post_put_patch_send_bodies() {
        assert!(HttpMethod::Post.sends_body());
        assert!(HttpMethod::Patch.sends_body());
        assert!(!HttpMethod::Get.sends_body());
        assert!(!HttpMethod::Head.sends_body());
    }

    #[test]
    fn with_query_appends_to_existing_query() {
        let params = QueryParameters::new().with("page", "2").with("q", "a b");
        let req = HttpRequest::get("http://localhost:3000/items?sort=asc")
            .with_query(&params)
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/items?sort=asc&page=2&q=a+b");
    }

    #[test]
    fn with_query_rejects_relative_url() {
        let params = QueryParameters::new().with("a", "1");
        assert!(HttpRequest::get("/relative").with_query(&params).is_err());
    }

    #[test]
    fn with_json_sets_body_and_content_type() {
        let req = HttpRequest::post("http://localhost/items")
            .with_json(&serde_json::json!({"title": "Buy milk"}))
            .unwrap();
        assert_eq!(req.headers.get("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "Buy milk");
    }

    #[test]
    fn with_json_keeps_explicit_content_type() {
        let req = HttpRequest::post("http://localhost/items")
            .with_header("Content-Type", "application/vnd.api+json")
            .with_json(&serde_json::json!({}))
            .unwrap();
        assert_eq!(req.headers.get("content-type"), Some("application/vnd.api+json"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn with_form_encodes_body() {
        let form = QueryParameters::new().with("user", "ada").with("note", "x=y");
        let req = HttpRequest::post("http://localhost/login").with_form(&form);
        assert_eq!(req.body.as_deref(), Some(&b"user=ada&note=x%3Dy"[..]));
        assert_eq!(
            req.headers.get("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn result_exposes_metadata() {
        let response = HttpResponse {
            status: 201,
            headers: HttpHeaders::new().with("Location", "/items/1"),
            body: b"created".to_vec(),
        };
        let result = HttpResult::from_response(response);
        assert!(result.is_success());
        assert_eq!(result.status(), 201);
        assert_eq!(result.headers().get("location"), Some("/items/1"));
        assert_eq!(result.value(), b"created");
    }

    #[test]
    fn try_map_keeps_metadata() {
        let response = HttpResponse {
            status: 404,
            headers: HttpHeaders::new(),
            body: b"missing".to_vec(),
        };
        let result = HttpResult::from_response(response)
            .try_map(String::from_utf8)
            .unwrap();
        assert!(!result.is_success());
        assert_eq!(result.into_parts().0, "missing");
    }
}
