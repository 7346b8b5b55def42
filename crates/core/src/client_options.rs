//! Connection-level settings shared by every request of a client

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::credentials::{AnonymousCredentials, Credentials, EnvLookup};

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1";

/// Endpoint of a local emulator; also switches to anonymous credentials.
pub const TESTBENCH_ENDPOINT_VAR: &str = "CLOUD_STORAGE_TESTBENCH_ENDPOINT";
/// Comma separated list of components to trace; `http` is recognised.
pub const ENABLE_TRACING_VAR: &str = "CLOUD_STORAGE_ENABLE_TRACING";
pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";

/// Credentials, endpoint and transport settings of a client.
#[derive(Clone)]
pub struct ClientOptions {
    credentials: Arc<dyn Credentials>,
    endpoint: String,
    version: String,
    project_id: Option<String>,
    enable_http_tracing: bool,
    connection_pool_size: usize,
    cancellation: CancellationToken,
}

impl ClientOptions {
    pub fn new(credentials: Arc<dyn Credentials>) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            project_id: None,
            enable_http_tracing: false,
            connection_pool_size: default_connection_pool_size(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Options with the process environment applied on top of the defaults.
    pub fn from_env(credentials: Arc<dyn Credentials>) -> Self {
        Self::from_env_with(credentials, &|name| std::env::var(name).ok())
    }

    /// Options with the given environment applied on top of the defaults.
    pub fn from_env_with(credentials: Arc<dyn Credentials>, env: EnvLookup<'_>) -> Self {
        let mut options = Self::new(credentials);
        if let Some(endpoint) = env(TESTBENCH_ENDPOINT_VAR) {
            tracing::info!(endpoint = %endpoint, "Using storage testbench endpoint");
            options.endpoint = endpoint;
            options.credentials = Arc::new(AnonymousCredentials::new());
        }
        if let Some(components) = env(ENABLE_TRACING_VAR)
            && components.split(',').any(|c| c.trim() == "http")
        {
            tracing::info!("Enabling logging for http");
            options.enable_http_tracing = true;
        }
        if let Some(project) = env(PROJECT_VAR) {
            options.project_id = Some(project);
        }
        options
    }

    pub fn credentials(&self) -> &Arc<dyn Credentials> {
        &self.credentials
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Default project for operations that need one (bucket listing and
    /// creation, service account lookup).
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn enable_http_tracing(&self) -> bool {
        self.enable_http_tracing
    }

    #[must_use]
    pub fn with_http_tracing(mut self, enable: bool) -> Self {
        self.enable_http_tracing = enable;
        self
    }

    /// Upper bound on idle connections kept per host.
    pub fn connection_pool_size(&self) -> usize {
        self.connection_pool_size
    }

    #[must_use]
    pub fn with_connection_pool_size(mut self, size: usize) -> Self {
        self.connection_pool_size = size;
        self
    }

    /// Cancelling this token aborts in-flight attempts and backoff sleeps of
    /// every operation issued through the client.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    #[must_use]
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("endpoint", &self.endpoint)
            .field("version", &self.version)
            .field("project_id", &self.project_id)
            .field("enable_http_tracing", &self.enable_http_tracing)
            .field("connection_pool_size", &self.connection_pool_size)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn default_connection_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| 4 * n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new(Arc::new(AnonymousCredentials::new()));
        assert_eq!(options.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(options.version(), "v1");
        assert!(options.project_id().is_none());
        assert!(!options.enable_http_tracing());
        assert!(options.connection_pool_size() >= 4);
        assert!(!options.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_environment_overrides() {
        let env = env_from(&[
            (TESTBENCH_ENDPOINT_VAR, "http://localhost:9000"),
            (ENABLE_TRACING_VAR, "rpc,http"),
            (PROJECT_VAR, "my-project"),
        ]);
        let options = ClientOptions::from_env_with(Arc::new(AnonymousCredentials::new()), &env);

        assert_eq!(options.endpoint(), "http://localhost:9000");
        assert!(options.enable_http_tracing());
        assert_eq!(options.project_id(), Some("my-project"));
        assert_eq!(options.credentials().authorization_header().await.unwrap(), "");
    }

    #[test]
    fn test_tracing_requires_http_component() {
        let env = env_from(&[(ENABLE_TRACING_VAR, "raw-client")]);
        let options = ClientOptions::from_env_with(Arc::new(AnonymousCredentials::new()), &env);
        assert!(!options.enable_http_tracing());
    }

    #[test]
    fn test_builders() {
        let options = ClientOptions::new(Arc::new(AnonymousCredentials::new()))
            .with_endpoint("https://storage.example.com")
            .with_version("v2")
            .with_project_id("p")
            .with_connection_pool_size(2);
        assert_eq!(options.endpoint(), "https://storage.example.com");
        assert_eq!(options.version(), "v2");
        assert_eq!(options.project_id(), Some("p"));
        assert_eq!(options.connection_pool_size(), 2);
        assert!(format!("{:?}", options).contains("storage.example.com"));
    }
}
