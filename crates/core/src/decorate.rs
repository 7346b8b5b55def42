//! Decoration of a terminal raw client
//!
//! The stack is always `LoggingClient(RetryClient(raw))`: one log record per
//! logical operation, with per-attempt failures reported by the retry loop.

use std::sync::Arc;

use crate::logging_client::LoggingClient;
use crate::raw_client::RawClient;
use crate::retry::{BackoffPolicy, RetryPolicy, default_backoff_policy, default_retry_policy};
use crate::retry_client::RetryClient;

/// Wrap `raw` with retry and logging. Missing policies fall back to the
/// defaults (five minutes of retries, exponential backoff from one second).
pub fn decorate(
    raw: Arc<dyn RawClient>,
    retry_policy: Option<Box<dyn RetryPolicy>>,
    backoff_policy: Option<Box<dyn BackoffPolicy>>,
) -> Arc<dyn RawClient> {
    let retry = RetryClient::new(
        raw,
        retry_policy.unwrap_or_else(default_retry_policy),
        backoff_policy.unwrap_or_else(default_backoff_policy),
    );
    Arc::new(LoggingClient::new(Arc::new(retry)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::client_options::ClientOptions;
    use crate::credentials::AnonymousCredentials;
    use crate::raw_client::MockRawClient;
    use crate::requests::GetBucketMetadataRequest;
    use crate::resources::BucketMetadata;
    use crate::retry::{ExponentialBackoffPolicy, LimitedErrorCountRetryPolicy};
    use crate::status::Status;

    #[tokio::test(start_paused = true)]
    async fn test_decorated_client_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mock = MockRawClient::new();
        mock.expect_client_options()
            .return_const(ClientOptions::new(Arc::new(AnonymousCredentials::new())));
        mock.expect_get_bucket_metadata().returning(move |request| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Status::new(429, "rate limited"))
            } else {
                Ok(BucketMetadata::new(&request.bucket_name))
            }
        });

        let client = decorate(
            Arc::new(mock),
            Some(Box::new(LimitedErrorCountRetryPolicy::new(2))),
            Some(Box::new(ExponentialBackoffPolicy::new(
                Duration::from_millis(10),
                Duration::from_millis(100),
                2.0,
            ))),
        );

        let bucket = client
            .get_bucket_metadata(&GetBucketMetadataRequest::new("b"))
            .await
            .unwrap();
        assert_eq!(bucket.name, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_decorated_client_keeps_options() {
        let mut mock = MockRawClient::new();
        mock.expect_client_options().return_const(
            ClientOptions::new(Arc::new(AnonymousCredentials::new()))
                .with_endpoint("http://localhost:8080"),
        );
        let client = decorate(Arc::new(mock), None, None);
        assert_eq!(client.client_options().endpoint(), "http://localhost:8080");
    }
}
