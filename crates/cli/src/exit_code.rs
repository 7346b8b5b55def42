//! Process exit codes
//!
//! Scripts can branch on the failure category without parsing messages.

/// Exit code of a `gcs` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Any failure without a more specific category
    GeneralError = 1,
    /// Bad arguments or configuration
    UsageError = 2,
    /// Transport failure or a transient service error that outlasted retries
    NetworkError = 3,
    /// Missing or rejected credentials
    AuthError = 4,
    NotFound = 5,
    /// Precondition failed or the resource already exists
    Conflict = 6,
    /// Interrupted by the user
    Interrupted = 130,
}

impl ExitCode {
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::NetworkError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            6 => Some(Self::Conflict),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    pub fn from_error(error: &gcs_core::Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(Self::GeneralError)
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_core::Status;

    #[test]
    fn test_round_trip_known_codes() {
        for code in [0, 1, 2, 3, 4, 5, 6, 130] {
            assert_eq!(ExitCode::from_i32(code).map(ExitCode::as_i32), Some(code));
        }
        assert_eq!(ExitCode::from_i32(42), None);
    }

    #[test]
    fn test_from_error() {
        let not_found = gcs_core::Error::from(Status::new(404, "No such bucket"));
        assert_eq!(ExitCode::from_error(&not_found), ExitCode::NotFound);

        let unavailable = gcs_core::Error::from(Status::new(503, "Backend unavailable"));
        assert_eq!(ExitCode::from_error(&unavailable), ExitCode::NetworkError);

        let config = gcs_core::Error::Config("no project".into());
        assert_eq!(ExitCode::from_error(&config), ExitCode::UsageError);
    }
}
