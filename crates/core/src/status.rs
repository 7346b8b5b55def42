//! Outcome of a single storage RPC attempt
//!
//! Every raw-client operation yields either its typed response or a
//! [`Status`] describing why the attempt failed. Codes follow HTTP
//! conventions: `0` is success and anything `>= 300` is a failure.

use std::fmt;

/// Code carried by a successful status.
pub const OK: i64 = 0;

/// Client closed the request before the server answered (cancellation).
pub const CANCELLED: i64 = 499;

/// The request never produced an HTTP response (DNS, connect, reset, TLS).
pub const TRANSPORT_FAILURE: i64 = 599;

/// Result of a raw-client operation.
pub type StatusOr<T> = std::result::Result<T, Status>;

/// Outcome of one RPC attempt: code, human readable message and raw payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    code: i64,
    message: String,
    payload: String,
}

impl Status {
    /// Create a status with the given code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            payload: String::new(),
        }
    }

    /// The success status.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A failure that happened before any HTTP response was received.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::new(TRANSPORT_FAILURE, message)
    }

    /// An operation abandoned because its cancellation token fired.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(CANCELLED, message)
    }

    /// Attach the raw response body that accompanied the failure.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Replace the message, keeping code and payload.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn is_ok(&self) -> bool {
        self.code == OK
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == CANCELLED
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "[{}]", self.code)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ok() {
        let status = Status::default();
        assert!(status.is_ok());
        assert_eq!(status.code(), OK);
        assert_eq!(status, Status::ok());
    }

    #[test]
    fn test_failure_codes() {
        assert!(!Status::new(404, "missing").is_ok());
        assert!(Status::new(404, "missing").is_not_found());
        assert!(Status::cancelled("stop").is_cancelled());
        assert_eq!(Status::transport_failure("reset").code(), TRANSPORT_FAILURE);
    }

    #[test]
    fn test_with_message_keeps_code_and_payload() {
        let status = Status::new(503, "try later")
            .with_payload("{\"error\":{}}")
            .with_message("wrapped");
        assert_eq!(status.code(), 503);
        assert_eq!(status.message(), "wrapped");
        assert_eq!(status.payload(), "{\"error\":{}}");
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::new(500, "boom").to_string(), "[500] boom");
        assert_eq!(Status::new(500, "").to_string(), "[500]");
    }
}
