//! Cached access token shared by the refreshing credentials

use std::future::Future;
use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use tokio::sync::Mutex;

use super::http::HttpResponse;
use super::{ACCESS_TOKEN_EXPIRATION_SLACK, Clock};
use crate::status::{Status, StatusOr};

/// A bearer token and the moment it stops being usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AccessToken {
    pub header: String,
    pub expiration: Timestamp,
}

/// Valid/Invalid token state behind an async mutex.
///
/// The lock is held across the refresh, so concurrent callers that find the
/// token invalid queue up behind the first one and then observe its result.
pub(crate) struct TokenCache {
    token: Mutex<Option<AccessToken>>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            token: Mutex::new(None),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Return the cached header, running `refresh` first if the token is
    /// missing or within the expiration slack.
    pub async fn authorization_header<F, Fut>(&self, refresh: F) -> StatusOr<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StatusOr<AccessToken>>,
    {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref()
            && !is_expired(self.clock.now(), current.expiration)
        {
            return Ok(current.header.clone());
        }

        *token = None;
        match refresh().await {
            Ok(fresh) => {
                let header = fresh.header.clone();
                *token = Some(fresh);
                Ok(header)
            }
            Err(status) => {
                tracing::warn!(code = status.code(), "Access token refresh failed: {}", status);
                Err(status)
            }
        }
    }
}

fn is_expired(now: Timestamp, expiration: Timestamp) -> bool {
    match expiration.checked_sub(ACCESS_TOKEN_EXPIRATION_SLACK) {
        Ok(threshold) => now > threshold,
        Err(_) => true,
    }
}

/// Turn a token endpoint response into an [`AccessToken`].
///
/// Error responses become a status carrying the HTTP code. A success response
/// must contain every field in `required` (and always `access_token`,
/// `expires_in` and `token_type`), otherwise the refresh fails.
pub(crate) fn parse_token_response(
    response: HttpResponse,
    required: &[&str],
    now: Timestamp,
) -> StatusOr<AccessToken> {
    let code = i64::from(response.status_code);
    if response.status_code >= 300 {
        return Err(Status::new(code, response.payload.clone()).with_payload(response.payload));
    }

    let missing = |payload: String| {
        Status::new(
            code,
            format!(
                "Could not find all required fields in response ({}).",
                required.join(", ")
            ),
        )
        .with_payload(payload)
    };

    let Ok(body) = serde_json::from_str::<serde_json::Value>(&response.payload) else {
        return Err(missing(response.payload));
    };
    if required.iter().any(|field| body.get(field).is_none()) {
        return Err(missing(response.payload));
    }

    let access_token = body.get("access_token").and_then(|v| v.as_str());
    let token_type = body.get("token_type").and_then(|v| v.as_str());
    let expires_in = body.get("expires_in").and_then(|v| v.as_i64());
    let (Some(access_token), Some(token_type), Some(expires_in)) =
        (access_token, token_type, expires_in)
    else {
        return Err(missing(response.payload));
    };

    let expiration = now
        .checked_add(SignedDuration::from_secs(expires_in))
        .map_err(|e| Status::new(code, format!("Invalid token lifetime: {}", e)))?;

    Ok(AccessToken {
        header: format!("{} {}", token_type, access_token),
        expiration,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::credentials::FixedClock;

    const NOW: i64 = 1_530_060_324;

    fn token(header: &str, expires_in: i64) -> AccessToken {
        AccessToken {
            header: header.to_string(),
            expiration: Timestamp::from_second(NOW + expires_in).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_second_call_uses_cached_token() {
        let cache = TokenCache::new(Arc::new(FixedClock::from_unix_seconds(NOW)));
        let refreshes = AtomicUsize::new(0);

        for _ in 0..2 {
            let header = cache
                .authorization_header(|| async {
                    refreshes.fetch_add(1, Ordering::SeqCst);
                    Ok(token("Bearer abc", 3600))
                })
                .await
                .unwrap();
            assert_eq!(header, "Bearer abc");
        }
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_within_slack() {
        let clock = Arc::new(FixedClock::from_unix_seconds(NOW));
        let cache = TokenCache::new(clock.clone());

        cache
            .authorization_header(|| async { Ok(token("Bearer first", 3600)) })
            .await
            .unwrap();

        // 56 minutes later the token is inside the 5 minute slack.
        clock.advance(SignedDuration::from_secs(56 * 60));
        let header = cache
            .authorization_header(|| async { Ok(token("Bearer second", 7200)) })
            .await
            .unwrap();
        assert_eq!(header, "Bearer second");
    }

    #[tokio::test]
    async fn test_failed_refresh_stays_invalid() {
        let cache = TokenCache::new(Arc::new(FixedClock::from_unix_seconds(NOW)));

        let result = cache
            .authorization_header(|| async { Err(Status::new(401, "denied")) })
            .await;
        assert_eq!(result.unwrap_err().code(), 401);

        let refreshes = AtomicUsize::new(0);
        cache
            .authorization_header(|| async {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(token("Bearer ok", 3600))
            })
            .await
            .unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parse_token_response() {
        let now = Timestamp::from_second(NOW).unwrap();
        let response = HttpResponse::new(
            200,
            r#"{"access_token":"ya29.abc","expires_in":3600,"token_type":"Bearer"}"#,
        );
        let parsed =
            parse_token_response(response, &["access_token", "expires_in", "token_type"], now)
                .unwrap();
        assert_eq!(parsed.header, "Bearer ya29.abc");
        assert_eq!(parsed.expiration.as_second(), NOW + 3600);
    }

    #[test]
    fn test_parse_token_response_missing_field() {
        let now = Timestamp::from_second(NOW).unwrap();
        let response = HttpResponse::new(200, r#"{"expires_in":3600,"token_type":"Bearer"}"#);
        let status =
            parse_token_response(response, &["access_token", "expires_in", "token_type"], now)
                .unwrap_err();
        assert_eq!(status.code(), 200);
        assert!(!status.is_ok());
        assert!(status.message().contains("access_token, expires_in, token_type"));
    }

    #[test]
    fn test_parse_token_response_http_error() {
        let now = Timestamp::from_second(NOW).unwrap();
        let response = HttpResponse::new(400, r#"{"error":"invalid_grant"}"#);
        let status = parse_token_response(response, &["access_token"], now).unwrap_err();
        assert_eq!(status.code(), 400);
        assert_eq!(status.payload(), r#"{"error":"invalid_grant"}"#);
    }

    #[test]
    fn test_parse_token_response_not_json() {
        let now = Timestamp::from_second(NOW).unwrap();
        let status =
            parse_token_response(HttpResponse::new(200, "<html>"), &["access_token"], now)
                .unwrap_err();
        assert_eq!(status.payload(), "<html>");
    }
}
