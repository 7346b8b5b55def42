//! reqwest implementation of the credentials' HTTP capability

use async_trait::async_trait;
use gcs_core::StatusOr;
use gcs_core::credentials::{HttpMethod, HttpRequest, HttpRequester, HttpResponse};

use crate::transport_status;

/// Sends token and metadata server requests with a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpRequester for ReqwestHttp {
    async fn execute(&self, request: HttpRequest) -> StatusOr<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_status)?;
        let status_code = response.status().as_u16();
        let payload = response.text().await.map_err(transport_status)?;
        tracing::debug!(url = %request.url, status_code, "Credentials request completed");
        Ok(HttpResponse::new(status_code, payload))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_post_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let http = ReqwestHttp::default();
        let response = http
            .execute(HttpRequest::post_form(
                format!("{}/token", server.uri()),
                "grant_type=refresh_token",
            ))
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.payload, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("metadata-flavor", "Google"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let http = ReqwestHttp::default();
        let response = http
            .execute(HttpRequest::get(server.uri()).with_header("metadata-flavor", "Google"))
            .await
            .unwrap();
        assert_eq!(response.status_code, 404);
        assert_eq!(response.payload, "not here");
    }

    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let http = ReqwestHttp::default();
        let status = http
            .execute(HttpRequest::get("http://127.0.0.1:1/token"))
            .await
            .unwrap_err();
        assert_eq!(status.code(), gcs_core::status::TRANSPORT_FAILURE);
        assert!(gcs_core::is_transient_failure(&status));
    }
}
