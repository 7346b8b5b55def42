//! OAuth 2.0 credentials
//!
//! A [`Credentials`] object produces the value of the `Authorization` header
//! attached to every request. The refreshing variants cache a short-lived
//! bearer token and fetch a new one from their authority when the cached one
//! is about to expire. One credentials object is normally shared by every
//! task using a client, so refreshes are serialized behind a lock: under
//! contention exactly one task talks to the token endpoint and the others
//! wait for its result.

mod anonymous;
mod authorized_user;
mod clock;
mod compute_engine;
mod google;
mod http;
mod service_account;
mod token;

pub use anonymous::AnonymousCredentials;
pub use authorized_user::{
    AuthorizedUserCredentials, AuthorizedUserCredentialsInfo, parse_authorized_user_credentials,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use compute_engine::{ComputeEngineCredentials, DEFAULT_METADATA_HOST};
pub use google::{
    EnvLookup, GOOGLE_APPLICATION_CREDENTIALS_VAR, create_anonymous_credentials,
    create_authorized_user_credentials_from_json_contents,
    create_authorized_user_credentials_from_json_file_path,
    create_service_account_credentials_from_json_contents,
    create_service_account_credentials_from_json_file_path, google_adc_file_path,
    google_default_credentials, google_default_credentials_with_env,
};
pub use http::{HttpMethod, HttpRequest, HttpRequester, HttpResponse};
#[cfg(test)]
pub use http::MockHttpRequester;
pub use service_account::{
    ServiceAccountCredentials, ServiceAccountCredentialsInfo, parse_service_account_credentials,
};

use async_trait::async_trait;
use jiff::SignedDuration;

use crate::status::StatusOr;

/// Token endpoint used by user and service account credentials.
pub const GOOGLE_OAUTH_REFRESH_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Full access to all Google Cloud resources.
pub const GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM: &str =
    "https://www.googleapis.com/auth/cloud-platform";

/// Read-only access to Cloud Storage.
pub const GOOGLE_OAUTH_SCOPE_CLOUD_STORAGE_READ_ONLY: &str =
    "https://www.googleapis.com/auth/devstorage.read_only";

/// Grant type of the JWT bearer assertion exchange, already form-encoded.
pub(crate) const GOOGLE_OAUTH_JWT_GRANT_TYPE: &str =
    "urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";

/// A token is refreshed once it is this close to its expiration.
pub const ACCESS_TOKEN_EXPIRATION_SLACK: SignedDuration = SignedDuration::from_secs(5 * 60);

/// Lifetime requested for service account assertions.
pub const ACCESS_TOKEN_LIFETIME: SignedDuration = SignedDuration::from_secs(60 * 60);

/// Source of the `Authorization` header value for storage requests.
#[async_trait]
pub trait Credentials: Send + Sync {
    /// The header value, e.g. `Bearer ya29.a0...`.
    ///
    /// An empty string means the request is sent without an `Authorization`
    /// header. A failed refresh returns the failing [`Status`](crate::Status).
    async fn authorization_header(&self) -> StatusOr<String>;
}
