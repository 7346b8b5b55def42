//! Output formatting
//!
//! Every command prints through [`Formatter`] so `--json`, `--quiet` and
//! `--no-color` behave the same everywhere.

mod formatter;

pub use formatter::Formatter;

/// Output switches shared by all commands
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Print machine-readable JSON instead of styled text
    pub json: bool,
    pub no_color: bool,
    /// Suppress everything but errors
    pub quiet: bool,
}

/// Human-readable size, binary units
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Timestamp rendered as `YYYY-MM-DD HH:MM:SS` in UTC
pub fn format_timestamp(timestamp: &jiff::Timestamp) -> String {
    timestamp.strftime("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(3 * 1024), "3 KiB");
    }

    #[test]
    fn test_format_timestamp() {
        let ts: jiff::Timestamp = "2024-03-01T12:34:56Z".parse().unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01 12:34:56");
    }
}
