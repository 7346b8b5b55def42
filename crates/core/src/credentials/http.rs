//! HTTP access used by the refreshing credentials
//!
//! Credentials never talk to the network directly; they are handed an
//! [`HttpRequester`] at construction. `gcs-http` provides the reqwest-backed
//! implementation, tests provide fakes.

use async_trait::async_trait;

use crate::status::StatusOr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single request to a token or metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST with an `application/x-www-form-urlencoded` body.
    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(body.into()),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub payload: String,
}

impl HttpResponse {
    pub fn new(status_code: u16, payload: impl Into<String>) -> Self {
        Self {
            status_code,
            payload: payload.into(),
        }
    }
}

/// Executes HTTP requests on behalf of credentials.
///
/// Implementations return `Err` only when no response was received; any HTTP
/// status, including errors, comes back as an [`HttpResponse`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpRequester: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> StatusOr<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_form_sets_content_type() {
        let request = HttpRequest::post_form("https://example.com/token", "a=b");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.body.as_deref(), Some("a=b"));
    }

    #[test]
    fn test_get_has_no_body() {
        let request = HttpRequest::get("http://metadata/").with_header("metadata-flavor", "Google");
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.body.is_none());
        assert_eq!(request.header("Metadata-Flavor"), Some("Google"));
    }
}
