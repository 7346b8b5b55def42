//! Credentials of the service account attached to a Compute Engine instance
//!
//! Tokens come from the instance metadata server. Every refresh first reads
//! the account's email and scopes, then fetches a token for it.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{HttpRequest, HttpRequester, HttpResponse};
use super::token::{AccessToken, TokenCache, parse_token_response};
use super::{Clock, Credentials, SystemClock};
use crate::status::{Status, StatusOr};

/// Environment variable overriding the metadata server host.
pub(crate) const GCE_METADATA_HOST_VAR: &str = "GCE_METADATA_ROOT";

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const REQUIRED_FIELDS: &[&str] = &["access_token", "expires_in", "token_type"];

#[derive(Debug, Clone, Default)]
struct AccountInfo {
    email: String,
    scopes: BTreeSet<String>,
}

#[derive(Deserialize)]
struct MetadataAccount {
    email: String,
    scopes: Vec<String>,
}

/// Refreshing credentials backed by the GCE metadata server.
pub struct ComputeEngineCredentials {
    metadata_host: String,
    account: Mutex<AccountInfo>,
    http: Arc<dyn HttpRequester>,
    cache: TokenCache,
}

impl ComputeEngineCredentials {
    /// Credentials for the instance's default service account.
    pub fn new(http: Arc<dyn HttpRequester>) -> Self {
        Self::for_service_account("default", http)
    }

    /// Credentials for the named service account (an email or `default`).
    ///
    /// The metadata server is [`DEFAULT_METADATA_HOST`]; point elsewhere with
    /// [`Self::with_metadata_host`]. The application default credentials
    /// lookup does that with `GCE_METADATA_ROOT` from its environment.
    pub fn for_service_account(email: impl Into<String>, http: Arc<dyn HttpRequester>) -> Self {
        Self {
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
            account: Mutex::new(AccountInfo {
                email: email.into(),
                scopes: BTreeSet::new(),
            }),
            http,
            cache: TokenCache::new(Arc::new(SystemClock)),
        }
    }

    #[must_use]
    pub fn with_metadata_host(mut self, host: impl Into<String>) -> Self {
        self.metadata_host = host.into();
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = TokenCache::new(clock);
        self
    }

    pub fn metadata_host(&self) -> &str {
        &self.metadata_host
    }

    /// The account email. Until the first refresh this may still be the
    /// alias the credentials were created with.
    pub fn service_account_email(&self) -> String {
        self.account
            .lock()
            .map(|account| account.email.clone())
            .unwrap_or_default()
    }

    /// Scopes granted to the account; empty until the first refresh.
    pub fn scopes(&self) -> BTreeSet<String> {
        self.account
            .lock()
            .map(|account| account.scopes.clone())
            .unwrap_or_default()
    }

    async fn metadata_get(&self, path: &str, recursive: bool) -> StatusOr<HttpResponse> {
        let mut url = format!("http://{}{}", self.metadata_host, path);
        if recursive {
            url.push_str("?recursive=true");
        }
        self.http
            .execute(HttpRequest::get(url).with_header("metadata-flavor", "Google"))
            .await
    }

    async fn retrieve_account_info(&self) -> StatusOr<()> {
        let email = self.service_account_email();
        let response = self
            .metadata_get(
                &format!("/computeMetadata/v1/instance/service-accounts/{}/", email),
                true,
            )
            .await?;
        let code = i64::from(response.status_code);
        if response.status_code >= 300 {
            return Err(Status::new(code, response.payload.clone()).with_payload(response.payload));
        }

        let account: MetadataAccount = serde_json::from_str(&response.payload).map_err(|_| {
            Status::new(
                code,
                "Could not find all required fields in response (email, scopes).",
            )
            .with_payload(response.payload.clone())
        })?;

        if let Ok(mut guard) = self.account.lock() {
            guard.email = account.email;
            guard.scopes = account.scopes.into_iter().collect();
        }
        Ok(())
    }

    async fn refresh(&self) -> StatusOr<AccessToken> {
        tracing::debug!(
            metadata_host = %self.metadata_host,
            "Refreshing compute engine access token"
        );
        self.retrieve_account_info().await?;

        let email = self.service_account_email();
        let response = self
            .metadata_get(
                &format!("/computeMetadata/v1/instance/service-accounts/{}/token", email),
                false,
            )
            .await?;
        parse_token_response(response, REQUIRED_FIELDS, self.cache.clock().now())
    }
}

impl std::fmt::Debug for ComputeEngineCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeEngineCredentials")
            .field("metadata_host", &self.metadata_host)
            .field("service_account_email", &self.service_account_email())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Credentials for ComputeEngineCredentials {
    async fn authorization_header(&self) -> StatusOr<String> {
        self.cache.authorization_header(|| self.refresh()).await
    }
}
