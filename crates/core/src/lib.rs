//! gcs-core: Core library for the gcs Cloud Storage client
//!
//! This crate provides the transport-independent parts of the client:
//! - Typed requests and resources for every storage API operation
//! - The [`RawClient`] trait and its retry and logging decorators
//! - Retry and backoff policies
//! - OAuth 2.0 credentials (anonymous, user, service account, metadata server)
//! - The [`Client`] facade and configuration management
//!
//! The HTTP transport lives in `gcs-http`, so everything here can be tested
//! against mock raw clients.

pub mod client;
pub mod client_options;
pub mod config;
pub mod credentials;
pub mod decorate;
pub mod error;
pub mod logging_client;
pub mod raw_client;
pub mod request_options;
pub mod requests;
pub mod resources;
pub mod retry;
pub mod retry_client;
pub mod status;

pub use client::{Client, ClientBuilder, ObjectReadStream, ObjectWriteStream};
pub use client_options::ClientOptions;
pub use config::{Config, ConfigManager};
pub use credentials::Credentials;
pub use decorate::decorate;
pub use error::{Error, Result};
pub use logging_client::LoggingClient;
pub use raw_client::{BufferedReadSource, ObjectReadSource, ObjectWriteSink, RawClient};
pub use request_options::RequestOptions;
pub use retry::{
    BackoffPolicy, ExponentialBackoffPolicy, LimitedErrorCountRetryPolicy, LimitedTimeRetryPolicy,
    RetryConfig, RetryPolicy, is_transient_failure,
};
pub use retry_client::RetryClient;
pub use status::{Status, StatusOr};
