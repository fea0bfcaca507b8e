//! CLI error type.
//!
//! Maps domain failures onto sysexits-style process exit codes.

use thiserror::Error;

use dlshelf_core::{HostError, SettingsError, ShelfError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl CliError {
    /// Exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Engine(_) => 1,
            Self::Arguments(_) => 2,
            Self::Render(_) => 70,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
        }
    }
}

impl From<ShelfError> for CliError {
    fn from(err: ShelfError) -> Self {
        Self::Engine(err.to_string())
    }
}

impl From<HostError> for CliError {
    fn from(err: HostError) -> Self {
        Self::Engine(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<image::ImageError> for CliError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => Self::Io(io.to_string()),
            other => Self::Render(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlshelf_core::DownloadId;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Engine(String::new()).exit_code(), 1);
        assert_eq!(CliError::Arguments(String::new()).exit_code(), 2);
        assert_eq!(CliError::Io(String::new()).exit_code(), 74);
        assert_eq!(CliError::Config(String::new()).exit_code(), 78);
    }

    #[test]
    fn test_domain_errors_convert() {
        let err: CliError = ShelfError::unknown_record(DownloadId::new(4)).into();
        assert!(matches!(err, CliError::Engine(ref msg) if msg.contains('4')));

        let err: CliError = SettingsError::ZeroListLimit.into();
        assert!(matches!(err, CliError::Config(_)));

        let err: CliError = std::io::Error::other("disk full").into();
        assert_eq!(err.to_string(), "I/O error: disk full");
    }
}
