//! Error types for gcs-core
//!
//! The request pipeline itself reports failures as [`Status`] values. This
//! type is what the public [`Client`](crate::Client) and the construction
//! helpers return to applications.

use thiserror::Error;

use crate::status::Status;

/// Result type alias for gcs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the public API
#[derive(Error, Debug)]
pub enum Error {
    /// A storage operation failed; carries the final status of the call
    #[error("Request failed: {0}")]
    Status(#[from] Status),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials could not be constructed from the given material
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// The request could not be built from the given arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The service answered with something the client cannot interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// The status of a failed storage operation, if this error is one
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Whether the service reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        self.status().is_some_and(Status::is_not_found)
    }

    /// Process exit code for a command that failed with this error
    ///
    /// 1 general, 2 usage, 3 network, 4 auth, 5 not found, 6 conflict,
    /// 130 cancelled.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Status(status) => match status.code() {
                401 | 403 => 4,
                404 => 5,
                409 | 412 => 6,
                crate::status::CANCELLED => 130,
                code if code == 408 || code == 429 || code >= 500 => 3,
                _ => 1,
            },
            Error::Config(_) | Error::InvalidArgument(_) => 2,
            Error::Credentials(_) => 4,
            _ => 1,
        }
    }
}
