//! gcs-http: HTTP transport for the gcs Cloud Storage client
//!
//! Provides [`RestClient`], the terminal [`RawClient`](gcs_core::RawClient)
//! that talks to the JSON API with reqwest, and [`ReqwestHttp`], which lets
//! the OAuth 2.0 credentials reach token endpoints and the metadata server.

mod requester;
mod rest_client;

use std::sync::Arc;

use gcs_core::client_options::TESTBENCH_ENDPOINT_VAR;
use gcs_core::credentials::{
    EnvLookup, create_anonymous_credentials, google_default_credentials_with_env,
};
use gcs_core::{Client, ClientOptions, Credentials, Result, RetryConfig, Status};

pub use requester::ReqwestHttp;
pub use rest_client::RestClient;

/// Map a reqwest failure that produced no usable response.
pub(crate) fn transport_status(err: reqwest::Error) -> Status {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_body() || err.is_decode() {
        "body"
    } else {
        "request"
    };
    Status::transport_failure(format!("HTTP {kind} error: {err}"))
}

/// Options built from the process environment and Application Default
/// Credentials.
pub fn default_client_options() -> Result<ClientOptions> {
    default_client_options_with_env(&|name| std::env::var(name).ok())
}

/// [`default_client_options`] with an explicit environment.
pub fn default_client_options_with_env(env: EnvLookup<'_>) -> Result<ClientOptions> {
    let credentials: Arc<dyn Credentials> = if env(TESTBENCH_ENDPOINT_VAR).is_some() {
        create_anonymous_credentials()
    } else {
        google_default_credentials_with_env(Arc::new(ReqwestHttp::default()), env)?
    };
    Ok(ClientOptions::from_env_with(credentials, env))
}

/// A client over the REST transport with the default retry and logging
/// decorators.
pub fn create_client(options: ClientOptions) -> Result<Client> {
    Ok(Client::new(Arc::new(RestClient::new(options)?)))
}

/// Like [`create_client`], with retry and backoff taken from `config`.
pub fn create_client_with_retry_config(
    options: ClientOptions,
    config: &RetryConfig,
) -> Result<Client> {
    let raw = Arc::new(RestClient::new(options)?);
    Ok(Client::builder(raw).with_retry_config(config).build())
}

/// A client using [`default_client_options`].
pub fn create_default_client() -> Result<Client> {
    create_client(default_client_options()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testbench_uses_anonymous_credentials() {
        let env = |name: &str| match name {
            "CLOUD_STORAGE_TESTBENCH_ENDPOINT" => Some("http://localhost:9000".to_string()),
            "GOOGLE_CLOUD_PROJECT" => Some("test-project".to_string()),
            _ => None,
        };
        let options = default_client_options_with_env(&env).unwrap();
        assert_eq!(options.endpoint(), "http://localhost:9000");
        assert_eq!(options.project_id(), Some("test-project"));
    }

    #[test]
    fn test_missing_explicit_credentials_file() {
        let env = |name: &str| match name {
            "GOOGLE_APPLICATION_CREDENTIALS" => Some("/nonexistent/creds.json".to_string()),
            _ => None,
        };
        assert!(default_client_options_with_env(&env).is_err());
    }

    #[tokio::test]
    async fn test_create_client() {
        let options = ClientOptions::new(create_anonymous_credentials());
        let client = create_client(options).unwrap();
        assert_eq!(client.client_options().version(), "v1");
    }
}
