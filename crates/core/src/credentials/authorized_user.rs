//! User account credentials (`authorized_user` key files)
//!
//! The key file holds an OAuth client id/secret and the user's refresh token,
//! as written by `gcloud auth application-default login`. Access tokens are
//! obtained with the `refresh_token` grant.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{HttpRequest, HttpRequester};
use super::token::{AccessToken, TokenCache, parse_token_response};
use super::{Clock, Credentials, GOOGLE_OAUTH_REFRESH_ENDPOINT, SystemClock};
use crate::error::{Error, Result};
use crate::status::StatusOr;

const REQUIRED_FIELDS: &[&str] = &["access_token", "expires_in", "id_token", "token_type"];

/// The fields of an `authorized_user` key file.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizedUserCredentialsInfo {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for AuthorizedUserCredentialsInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentialsInfo")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Parse an `authorized_user` key file. `source` names the file in errors.
pub fn parse_authorized_user_credentials(
    contents: &str,
    source: &str,
) -> Result<AuthorizedUserCredentialsInfo> {
    serde_json::from_str(contents).map_err(|e| {
        Error::Credentials(format!(
            "Invalid AuthorizedUserCredentials, parsing failed on data from {}: {}",
            source, e
        ))
    })
}

/// Refreshing credentials for a user account.
pub struct AuthorizedUserCredentials {
    token_uri: String,
    payload: String,
    http: Arc<dyn HttpRequester>,
    cache: TokenCache,
}

impl AuthorizedUserCredentials {
    pub fn new(info: AuthorizedUserCredentialsInfo, http: Arc<dyn HttpRequester>) -> Self {
        let payload = format!(
            "grant_type=refresh_token&client_id={}&client_secret={}&refresh_token={}",
            urlencoding::encode(&info.client_id),
            urlencoding::encode(&info.client_secret),
            urlencoding::encode(&info.refresh_token),
        );
        Self {
            token_uri: GOOGLE_OAUTH_REFRESH_ENDPOINT.to_string(),
            payload,
            http,
            cache: TokenCache::new(Arc::new(SystemClock)),
        }
    }

    /// Send refresh requests to a different token endpoint.
    #[must_use]
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = TokenCache::new(clock);
        self
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    async fn refresh(&self) -> StatusOr<AccessToken> {
        tracing::debug!(token_uri = %self.token_uri, "Refreshing user access token");
        let request = HttpRequest::post_form(&self.token_uri, &self.payload);
        let response = self.http.execute(request).await?;
        parse_token_response(response, REQUIRED_FIELDS, self.cache.clock().now())
    }
}

impl std::fmt::Debug for AuthorizedUserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentials")
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Credentials for AuthorizedUserCredentials {
    async fn authorization_header(&self) -> StatusOr<String> {
        self.cache.authorization_header(|| self.refresh()).await
    }
}
