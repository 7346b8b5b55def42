//! Service account credentials (`service_account` key files)
//!
//! Access tokens are obtained with the JWT bearer grant (RFC 7523): the
//! client signs a short-lived assertion with the key file's RSA private key
//! and exchanges it at the token endpoint.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff::Timestamp;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::http::{HttpRequest, HttpRequester};
use super::token::{AccessToken, TokenCache, parse_token_response};
use super::{
    ACCESS_TOKEN_LIFETIME, Clock, Credentials, GOOGLE_OAUTH_JWT_GRANT_TYPE,
    GOOGLE_OAUTH_REFRESH_ENDPOINT, GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM, SystemClock,
};
use crate::error::{Error, Result};
use crate::status::{Status, StatusOr};

const REQUIRED_FIELDS: &[&str] = &["access_token", "expires_in", "token_type"];

/// The fields of a `service_account` key file.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountCredentialsInfo {
    pub client_email: String,
    pub private_key_id: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountCredentialsInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentialsInfo")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Parse a `service_account` key file. `source` names the file in errors.
pub fn parse_service_account_credentials(
    contents: &str,
    source: &str,
) -> Result<ServiceAccountCredentialsInfo> {
    serde_json::from_str(contents).map_err(|e| {
        Error::Credentials(format!(
            "Invalid ServiceAccountCredentials, parsing failed on data from {}: {}",
            source, e
        ))
    })
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'a str,
    kid: &'a str,
    typ: &'a str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    aud: &'a str,
    exp: i64,
    iat: i64,
    iss: &'a str,
    scope: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
}

/// Refreshing credentials for a service account.
pub struct ServiceAccountCredentials {
    client_email: String,
    private_key_id: String,
    token_uri: String,
    signing_key: SigningKey<Sha256>,
    scope: String,
    subject: Option<String>,
    http: Arc<dyn HttpRequester>,
    cache: TokenCache,
}

impl ServiceAccountCredentials {
    /// Build credentials from a parsed key file.
    ///
    /// Fails if the private key is not a PEM encoded RSA key (PKCS#8 or
    /// PKCS#1).
    pub fn new(info: ServiceAccountCredentialsInfo, http: Arc<dyn HttpRequester>) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(&info.private_key)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&info.private_key))
            .map_err(|e| {
                Error::Credentials(format!(
                    "Invalid private key for service account {}: {}",
                    info.client_email, e
                ))
            })?;

        Ok(Self {
            client_email: info.client_email,
            private_key_id: info.private_key_id,
            token_uri: info
                .token_uri
                .unwrap_or_else(|| GOOGLE_OAUTH_REFRESH_ENDPOINT.to_string()),
            signing_key: SigningKey::<Sha256>::new(key),
            scope: GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM.to_string(),
            subject: None,
            http,
            cache: TokenCache::new(Arc::new(SystemClock)),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = TokenCache::new(clock);
        self
    }

    /// New credentials requesting `scopes` instead; the copy starts without a
    /// token.
    pub fn with_scopes<I, S>(&self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes: BTreeSet<String> = scopes.into_iter().map(Into::into).collect();
        let mut copy = self.invalidated_copy();
        copy.scope = scopes.into_iter().collect::<Vec<_>>().join(" ");
        copy
    }

    /// New credentials impersonating `user_email` through domain-wide
    /// delegation; the copy starts without a token.
    pub fn with_service_account_user(&self, user_email: impl Into<String>) -> Self {
        let mut copy = self.invalidated_copy();
        copy.subject = Some(user_email.into());
        copy
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn invalidated_copy(&self) -> Self {
        Self {
            client_email: self.client_email.clone(),
            private_key_id: self.private_key_id.clone(),
            token_uri: self.token_uri.clone(),
            signing_key: self.signing_key.clone(),
            scope: self.scope.clone(),
            subject: self.subject.clone(),
            http: Arc::clone(&self.http),
            cache: TokenCache::new(Arc::clone(self.cache.clock())),
        }
    }

    /// Signed JWT assertion issued at `now`.
    pub(crate) fn create_assertion(&self, now: Timestamp) -> StatusOr<String> {
        let iat = now.as_second();
        let header = JwtHeader {
            alg: "RS256",
            kid: &self.private_key_id,
            typ: "JWT",
        };
        let claims = JwtClaims {
            aud: &self.token_uri,
            exp: iat + ACCESS_TOKEN_LIFETIME.as_secs(),
            iat,
            iss: &self.client_email,
            scope: &self.scope,
            sub: self.subject.as_deref(),
        };

        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let signature = self.signing_key.sign(signing_input.as_bytes());
        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    async fn refresh(&self) -> StatusOr<AccessToken> {
        tracing::debug!(
            client_email = %self.client_email,
            token_uri = %self.token_uri,
            "Refreshing service account access token"
        );
        let now = self.cache.clock().now();
        let payload = format!(
            "grant_type={}&assertion={}",
            GOOGLE_OAUTH_JWT_GRANT_TYPE,
            self.create_assertion(now)?
        );
        let response = self
            .http
            .execute(HttpRequest::post_form(&self.token_uri, payload))
            .await?;
        parse_token_response(response, REQUIRED_FIELDS, self.cache.clock().now())
    }
}

/// URL-safe, unpadded base64 of the compact JSON form of `value`.
fn encode_segment<T: Serialize>(value: &T) -> StatusOr<String> {
    serde_json::to_vec(value)
        .map(|json| URL_SAFE_NO_PAD.encode(json))
        .map_err(|e| Status::new(400, format!("Cannot serialize JWT segment: {}", e)))
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("scope", &self.scope)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Credentials for ServiceAccountCredentials {
    async fn authorization_header(&self) -> StatusOr<String> {
        self.cache.authorization_header(|| self.refresh()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::http::{HttpMethod, HttpResponse, MockHttpRequester};
    use crate::credentials::{FixedClock, GOOGLE_OAUTH_SCOPE_CLOUD_STORAGE_READ_ONLY};

    const PRIVATE_KEY: &str = include_str!("../../testdata/service-account-key.pem");
    const CLIENT_EMAIL: &str = "uploader@test-project.iam.gserviceaccount.com";
    const FIXED_TIME: i64 = 1_530_060_324;

    const EXPECTED_ASSERTION: &str = concat!(
        "eyJhbGciOiJSUzI1NiIsImtpZCI6ImExYjJjM2Q0ZTVmNiIsInR5cCI6IkpXVCJ9",
        ".",
        "eyJhdWQiOiJodHRwczovL29hdXRoMi5nb29nbGVhcGlzLmNvbS90b2tlbiIsImV4cCI6MTUzMDA2MzkyNCwiaWF0Ij",
        "oxNTMwMDYwMzI0LCJpc3MiOiJ1cGxvYWRlckB0ZXN0LXByb2plY3QuaWFtLmdzZXJ2aWNlYWNjb3VudC5jb20iLCJz",
        "Y29wZSI6Imh0dHBzOi8vd3d3Lmdvb2dsZWFwaXMuY29tL2F1dGgvY2xvdWQtcGxhdGZvcm0ifQ",
        ".",
        "LD9BpF9ijFfE_N4eSfrv-QEDB3-F5Px3iqJR4fDk3IID1c5e83e2yeHHjdkqLPOEUeACnM8-005ojUCFLE3XdCFUR9Ml",
        "8WGIXu7BzmWQbCjPmwQYYxvpKc8Qme04ptgE0cDbJw7KB2Zp4SH1PdwyYNr_-v0HYIqjAMQ1zDRwozen-CII0dV8ke",
        "4i7VdFdZGt9E7jWoHVvCUm8O4PwlAc3VDdARKabYFlfHQ-qzcvhqbeUksk8sIn1VkKbPNrH0GMAiUtnW7E8-zrZiSYx",
        "biVQznPFhYSav9mYqzAnmfcWiwAhvSBYjAfegg2Yg4JmY5dR0rVnjbK_sy9-bsQ2QIcfA",
    );

    fn key_file() -> String {
        serde_json::json!({
            "type": "service_account",
            "project_id": "test-project",
            "private_key_id": "a1b2c3d4e5f6",
            "private_key": PRIVATE_KEY,
            "client_email": CLIENT_EMAIL,
            "client_id": "100000000000000000001",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
        })
        .to_string()
    }

    fn credentials(http: MockHttpRequester) -> ServiceAccountCredentials {
        let info = parse_service_account_credentials(&key_file(), "test").unwrap();
        ServiceAccountCredentials::new(info, Arc::new(http))
            .unwrap()
            .with_clock(Arc::new(FixedClock::from_unix_seconds(FIXED_TIME)))
    }

    fn decode_claims(assertion: &str) -> serde_json::Value {
        let payload = assertion.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_assertion_matches_known_value() {
        let credentials = credentials(MockHttpRequester::new());
        let now = Timestamp::from_second(FIXED_TIME).unwrap();
        assert_eq!(credentials.create_assertion(now).unwrap(), EXPECTED_ASSERTION);
    }

    #[test]
    fn test_assertion_claims() {
        let credentials = credentials(MockHttpRequester::new());
        let now = Timestamp::from_second(FIXED_TIME).unwrap();
        let claims = decode_claims(&credentials.create_assertion(now).unwrap());

        assert_eq!(claims["iss"], CLIENT_EMAIL);
        assert_eq!(claims["aud"], GOOGLE_OAUTH_REFRESH_ENDPOINT);
        assert_eq!(claims["scope"], GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM);
        assert_eq!(claims["iat"], FIXED_TIME);
        assert_eq!(claims["exp"], FIXED_TIME + 3600);
        assert!(claims.get("sub").is_none());
    }

    #[test]
    fn test_with_scopes_and_subject() {
        let base = credentials(MockHttpRequester::new());
        let narrowed = base
            .with_scopes([
                GOOGLE_OAUTH_SCOPE_CLOUD_STORAGE_READ_ONLY,
                GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM,
            ])
            .with_service_account_user("user@example.com");

        assert_eq!(base.scope(), GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM);
        assert_eq!(
            narrowed.scope(),
            format!(
                "{} {}",
                GOOGLE_OAUTH_SCOPE_CLOUD_PLATFORM, GOOGLE_OAUTH_SCOPE_CLOUD_STORAGE_READ_ONLY
            )
        );
        assert_eq!(narrowed.subject(), Some("user@example.com"));

        let now = Timestamp::from_second(FIXED_TIME).unwrap();
        let claims = decode_claims(&narrowed.create_assertion(now).unwrap());
        assert_eq!(claims["sub"], "user@example.com");
    }

    #[tokio::test]
    async fn test_refresh_exchanges_assertion() {
        let mut http = MockHttpRequester::new();
        http.expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Post
                    && request.url == GOOGLE_OAUTH_REFRESH_ENDPOINT
                    && request.body.as_deref()
                        == Some(&*format!(
                            "grant_type={}&assertion={}",
                            GOOGLE_OAUTH_JWT_GRANT_TYPE, EXPECTED_ASSERTION
                        ))
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"token_type":"Bearer","access_token":"sa-token","expires_in":3600}"#,
                ))
            });

        let credentials = credentials(http);
        assert_eq!(
            credentials.authorization_header().await.unwrap(),
            "Bearer sa-token"
        );
        assert_eq!(
            credentials.authorization_header().await.unwrap(),
            "Bearer sa-token"
        );
    }

    #[tokio::test]
    async fn test_refresh_missing_access_token() {
        let mut http = MockHttpRequester::new();
        http.expect_execute().returning(|_| {
            Ok(HttpResponse::new(200, r#"{"token_type":"Bearer","expires_in":3600}"#))
        });

        let status = credentials(http).authorization_header().await.unwrap_err();
        assert!(!status.is_ok());
    }

    #[test]
    fn test_invalid_private_key() {
        let info = ServiceAccountCredentialsInfo {
            client_email: CLIENT_EMAIL.to_string(),
            private_key_id: "k".to_string(),
            private_key: "not a key".to_string(),
            token_uri: None,
        };
        let err = ServiceAccountCredentials::new(info, Arc::new(MockHttpRequester::new()))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Credentials(_)));
    }

    #[test]
    fn test_default_token_uri() {
        let mut info = parse_service_account_credentials(&key_file(), "test").unwrap();
        info.token_uri = None;
        let credentials =
            ServiceAccountCredentials::new(info, Arc::new(MockHttpRequester::new())).unwrap();
        assert_eq!(credentials.token_uri(), GOOGLE_OAUTH_REFRESH_ENDPOINT);
        assert_eq!(credentials.client_email(), CLIENT_EMAIL);
    }
}
