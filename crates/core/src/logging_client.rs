//! Logging decorator
//!
//! Emits a `tracing` debug event for every request and its result, then hands
//! the result back untouched. Long responses are cut to
//! [`MAX_LOGGED_RESPONSE_LEN`] characters. Download and upload handles are
//! wrapped so each chunk is logged as it passes through.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client_options::ClientOptions;
use crate::raw_client::{ObjectReadSource, ObjectWriteSink, RawClient, with_raw_operations};
use crate::requests::{InsertObjectStreamingRequest, ReadObjectRangeRequest};
use crate::resources::ObjectMetadata;
use crate::status::StatusOr;

pub const MAX_LOGGED_RESPONSE_LEN: usize = 1024;

pub struct LoggingClient {
    client: Arc<dyn RawClient>,
}

impl LoggingClient {
    pub fn new(client: Arc<dyn RawClient>) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Arc<dyn RawClient> {
        &self.client
    }
}

/// `Debug` output of `value`, shortened to at most `max_len` characters.
pub fn summarize(value: &impl Debug, max_len: usize) -> String {
    let text = format!("{:?}", value);
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...<truncated {} bytes>", &text[..cut], text.len() - cut),
        None => text,
    }
}

fn log_result<T: Debug>(operation: &str, result: &StatusOr<T>) {
    match result {
        Ok(response) => tracing::debug!(
            operation,
            response = %summarize(response, MAX_LOGGED_RESPONSE_LEN),
            ">> ok"
        ),
        Err(status) => tracing::debug!(operation, status = %status, ">> error"),
    }
}

macro_rules! logging_client_impl {
    ($($method:ident($request:ty) -> $response:ty, $name:literal;)*) => {
        #[async_trait]
        impl RawClient for LoggingClient {
            fn client_options(&self) -> &ClientOptions {
                self.client.client_options()
            }

            $(
                async fn $method(&self, request: &$request) -> StatusOr<$response> {
                    tracing::debug!(operation = $name, request = ?request, "<<");
                    let result = self.client.$method(request).await;
                    log_result($name, &result);
                    result
                }
            )*

            async fn read_object(
                &self,
                request: &ReadObjectRangeRequest,
            ) -> StatusOr<Box<dyn ObjectReadSource>> {
                tracing::debug!(operation = "ReadObject", request = ?request, "<<");
                match self.client.read_object(request).await {
                    Ok(source) => {
                        tracing::debug!(operation = "ReadObject", ">> stream opened");
                        Ok(Box::new(LoggingReadSource::new(source)))
                    }
                    Err(status) => {
                        tracing::debug!(operation = "ReadObject", status = %status, ">> error");
                        Err(status)
                    }
                }
            }

            async fn write_object(
                &self,
                request: &InsertObjectStreamingRequest,
            ) -> StatusOr<Box<dyn ObjectWriteSink>> {
                tracing::debug!(operation = "WriteObject", request = ?request, "<<");
                match self.client.write_object(request).await {
                    Ok(sink) => {
                        tracing::debug!(operation = "WriteObject", ">> stream opened");
                        Ok(Box::new(LoggingWriteSink::new(sink)))
                    }
                    Err(status) => {
                        tracing::debug!(operation = "WriteObject", status = %status, ">> error");
                        Err(status)
                    }
                }
            }
        }
    };
}

with_raw_operations!(logging_client_impl);

/// Logs the size of every chunk read from the wrapped source.
pub struct LoggingReadSource {
    inner: Box<dyn ObjectReadSource>,
    bytes_read: u64,
}

impl LoggingReadSource {
    pub fn new(inner: Box<dyn ObjectReadSource>) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }
}

#[async_trait]
impl ObjectReadSource for LoggingReadSource {
    async fn read(&mut self) -> StatusOr<Option<Bytes>> {
        let result = self.inner.read().await;
        match &result {
            Ok(Some(chunk)) => {
                self.bytes_read += chunk.len() as u64;
                tracing::debug!(
                    chunk_len = chunk.len(),
                    total = self.bytes_read,
                    "ReadObject chunk"
                );
            }
            Ok(None) => tracing::debug!(total = self.bytes_read, "ReadObject complete"),
            Err(status) => tracing::debug!(status = %status, "ReadObject chunk error"),
        }
        result
    }
}

/// Logs the size of every chunk written to the wrapped sink.
pub struct LoggingWriteSink {
    inner: Box<dyn ObjectWriteSink>,
    bytes_written: u64,
}

impl LoggingWriteSink {
    pub fn new(inner: Box<dyn ObjectWriteSink>) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }
}

#[async_trait]
impl ObjectWriteSink for LoggingWriteSink {
    async fn write(&mut self, chunk: Bytes) -> StatusOr<()> {
        let len = chunk.len();
        let result = self.inner.write(chunk).await;
        match &result {
            Ok(()) => {
                self.bytes_written += len as u64;
                tracing::debug!(chunk_len = len, total = self.bytes_written, "WriteObject chunk");
            }
            Err(status) => tracing::debug!(status = %status, "WriteObject chunk error"),
        }
        result
    }

    async fn close(&mut self) -> StatusOr<ObjectMetadata> {
        let result = self.inner.close().await;
        log_result("WriteObject", &result);
        result
    }
}
