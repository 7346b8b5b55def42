//! Retry decorator
//!
//! Wraps a [`RawClient`] and re-issues failed calls according to a
//! [`RetryPolicy`] and [`BackoffPolicy`]. Each call works on its own fresh
//! copy of both policies. The wait between attempts only suspends the calling
//! operation. Cancelling the client's token interrupts both the in-flight
//! attempt and the wait.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client_options::ClientOptions;
use crate::raw_client::{ObjectReadSource, ObjectWriteSink, RawClient, with_raw_operations};
use crate::requests::{InsertObjectStreamingRequest, ReadObjectRangeRequest};
use crate::retry::{BackoffPolicy, RetryPolicy};
use crate::status::{Status, StatusOr};

/// Status code used when the retry budget was spent before the first attempt.
const EXHAUSTED_BEFORE_FIRST_ATTEMPT: i64 = 504;

pub struct RetryClient {
    client: Arc<dyn RawClient>,
    retry_policy: Box<dyn RetryPolicy>,
    backoff_policy: Box<dyn BackoffPolicy>,
}

impl RetryClient {
    pub fn new(
        client: Arc<dyn RawClient>,
        retry_policy: Box<dyn RetryPolicy>,
        backoff_policy: Box<dyn BackoffPolicy>,
    ) -> Self {
        Self {
            client,
            retry_policy,
            backoff_policy,
        }
    }

    pub fn inner(&self) -> &Arc<dyn RawClient> {
        &self.client
    }

    fn cancellation_token(&self) -> &CancellationToken {
        self.client.client_options().cancellation_token()
    }

    /// Run `attempt` until it succeeds, fails permanently, or the retry
    /// budget is gone.
    async fn call<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> StatusOr<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StatusOr<T>>,
    {
        let mut retry = self.retry_policy.clone_box();
        let mut backoff = self.backoff_policy.clone_box();
        let cancel = self.cancellation_token();
        let mut attempts: u32 = 0;
        let mut last_status: Option<Status> = None;

        while !retry.is_exhausted() {
            attempts += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(operation, attempts)),
                result = attempt() => result,
            };

            let status = match result {
                Ok(value) => return Ok(value),
                Err(status) => status,
            };

            if !retry.on_failure(&status) {
                let message = if retry.is_exhausted() {
                    exhausted_message(operation, attempts, &status)
                } else {
                    format!(
                        "Permanent error in {} after {} attempt(s): {}",
                        operation,
                        attempts,
                        status.message()
                    )
                };
                return Err(status.with_message(message));
            }

            let delay = backoff.next_delay();
            tracing::warn!(
                operation,
                attempt = attempts,
                code = status.code(),
                delay_ms = delay.as_millis() as u64,
                "Transient failure, retrying: {}",
                status.message()
            );
            last_status = Some(status);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(operation, attempts)),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Err(match last_status {
            Some(status) => {
                let message = exhausted_message(operation, attempts, &status);
                status.with_message(message)
            }
            None => Status::new(
                EXHAUSTED_BEFORE_FIRST_ATTEMPT,
                format!("Retry policy exhausted before first attempt in {}", operation),
            ),
        })
    }
}

fn exhausted_message(operation: &str, attempts: u32, status: &Status) -> String {
    format!(
        "Retry policy exhausted in {} after {} attempts: {}",
        operation,
        attempts,
        status.message()
    )
}

fn cancelled(operation: &str, attempts: u32) -> Status {
    Status::cancelled(format!(
        "Operation {} cancelled during attempt {}",
        operation, attempts
    ))
}

macro_rules! retry_client_impl {
    ($($method:ident($request:ty) -> $response:ty, $name:literal;)*) => {
        #[async_trait::async_trait]
        impl RawClient for RetryClient {
            fn client_options(&self) -> &ClientOptions {
                self.client.client_options()
            }

            $(
                async fn $method(&self, request: &$request) -> StatusOr<$response> {
                    self.call($name, || self.client.$method(request)).await
                }
            )*

            async fn read_object(
                &self,
                request: &ReadObjectRangeRequest,
            ) -> StatusOr<Box<dyn ObjectReadSource>> {
                self.call("ReadObject", || self.client.read_object(request)).await
            }

            async fn write_object(
                &self,
                request: &InsertObjectStreamingRequest,
            ) -> StatusOr<Box<dyn ObjectWriteSink>> {
                self.call("WriteObject", || self.client.write_object(request)).await
            }
        }
    };
}

with_raw_operations!(retry_client_impl);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::credentials::AnonymousCredentials;
    use crate::raw_client::MockRawClient;
    use crate::requests::GetObjectMetadataRequest;
    use crate::resources::ObjectMetadata;
    use crate::retry::{ExponentialBackoffPolicy, LimitedErrorCountRetryPolicy, LimitedTimeRetryPolicy};

    fn options() -> ClientOptions {
        ClientOptions::new(Arc::new(AnonymousCredentials::new()))
    }

    fn backoff() -> Box<dyn BackoffPolicy> {
        Box::new(ExponentialBackoffPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
            2.0,
        ))
    }

    /// A mock that fails with the given codes, then succeeds.
    fn mock_with_failures(
        codes: Vec<i64>,
        calls: Arc<AtomicUsize>,
        options: ClientOptions,
    ) -> MockRawClient {
        let mut mock = MockRawClient::new();
        mock.expect_client_options().return_const(options);
        mock.expect_get_object_metadata().returning(move |request| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            match codes.get(n) {
                Some(code) => Err(Status::new(*code, format!("failure {}", n))),
                None => Ok(ObjectMetadata::new(&request.bucket_name, &request.object_name)),
            }
        });
        mock
    }

    fn request() -> GetObjectMetadataRequest {
        GetObjectMetadataRequest::new("test-bucket", "test-object")
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(vec![503, 503], calls.clone(), options());
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedErrorCountRetryPolicy::new(2)),
            backoff(),
        );

        let start = tokio::time::Instant::now();
        let object = client.get_object_metadata(&request()).await.unwrap();
        assert_eq!(object.name, "test-object");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two sleeps: [50, 100] ms then [100, 200] ms.
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(150), "waited {:?}", waited);
        assert!(waited <= Duration::from_millis(300), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(vec![404], calls.clone(), options());
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedErrorCountRetryPolicy::new(5)),
            backoff(),
        );

        let status = client.get_object_metadata(&request()).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(status.code(), 404);
        assert!(status.message().starts_with("Permanent error in GetObjectMetadata"));
        assert!(status.message().contains("failure 0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retry_budget() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(vec![503; 10], calls.clone(), options());
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedErrorCountRetryPolicy::new(2)),
            backoff(),
        );

        let status = client.get_object_metadata(&request()).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(status.code(), 503);
        assert!(status.message().starts_with("Retry policy exhausted in GetObjectMetadata"));
        assert!(!status.message().contains("Permanent"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_limited_policy_stops_retrying() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(vec![500; 1000], calls.clone(), options());
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedTimeRetryPolicy::new(Duration::from_secs(2))),
            backoff(),
        );

        let status = client.get_object_metadata(&request()).await.unwrap_err();
        assert!(status.message().contains("Retry policy exhausted"));
        let attempts = calls.load(Ordering::SeqCst);
        assert!(attempts > 1 && attempts < 1000, "attempts = {}", attempts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_call_gets_a_fresh_budget() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(vec![503, 503, 503, 503], calls.clone(), options());
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedErrorCountRetryPolicy::new(2)),
            backoff(),
        );

        // First call: three failures, budget of two retries.
        assert!(client.get_object_metadata(&request()).await.is_err());
        // Second call: one more failure, then success.
        assert!(client.get_object_metadata(&request()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(
            vec![503; 10],
            calls.clone(),
            options().with_cancellation_token(token.clone()),
        );
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedErrorCountRetryPolicy::new(10)),
            Box::new(ExponentialBackoffPolicy::new(
                Duration::from_secs(60),
                Duration::from_secs(60),
                1.0,
            )),
        );

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let status = client.get_object_metadata(&request()).await.unwrap_err();
        canceller.await.unwrap();
        assert!(status.is_cancelled());
        assert!(status.message().contains("GetObjectMetadata"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Retries every failure, permanent or not, up to a fixed count.
    #[derive(Debug, Clone)]
    struct RetryAnyFailure {
        remaining: u32,
        limit: u32,
    }

    impl RetryPolicy for RetryAnyFailure {
        fn clone_box(&self) -> Box<dyn RetryPolicy> {
            Box::new(Self {
                remaining: self.limit,
                limit: self.limit,
            })
        }

        fn on_failure(&mut self, _status: &Status) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            true
        }

        fn is_exhausted(&self) -> bool {
            self.remaining == 0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_exhaustion_is_not_reported_as_permanent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = mock_with_failures(vec![409; 10], calls.clone(), options());
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(RetryAnyFailure {
                remaining: 1,
                limit: 1,
            }),
            backoff(),
        );

        let status = client.get_object_metadata(&request()).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(status.code(), 409);
        assert!(
            status
                .message()
                .starts_with("Retry policy exhausted in GetObjectMetadata after 2 attempts"),
            "{}",
            status.message()
        );
        assert!(!status.message().contains("Permanent"));
    }

    #[tokio::test]
    async fn test_exhausted_before_first_attempt() {
        let mut mock = MockRawClient::new();
        mock.expect_client_options().return_const(options());
        mock.expect_get_object_metadata().never();
        let client = RetryClient::new(
            Arc::new(mock),
            Box::new(LimitedTimeRetryPolicy::new(Duration::ZERO)),
            backoff(),
        );

        let status = client.get_object_metadata(&request()).await.unwrap_err();
        assert_eq!(status.code(), EXHAUSTED_BEFORE_FIRST_ATTEMPT);
        assert!(status.message().contains("before first attempt"));
    }
}
