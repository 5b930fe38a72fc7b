//! CLI-specific error types and exit code mapping

use logship_core::error::LogshipError;
use logship_serializer::SerializerError;

/// CLI-specific error type.
///
/// `exit_code()` maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// An input container could not be read.
    #[error("input error: {path}: {reason}")]
    Input { path: String, reason: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logship-core.
    #[error("{0}")]
    Core(#[from] LogshipError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                  |
    /// |------|--------------------------|
    /// | 0    | Success                  |
    /// | 1    | General / command error  |
    /// | 2    | Configuration error      |
    /// | 3    | Unreadable input file    |
    /// | 10   | IO error                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LogshipError::Config(_)) => 2,
            Self::Input { .. } => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<SerializerError> for CliError {
    fn from(e: SerializerError) -> Self {
        Self::Core(e.into())
    }
}
