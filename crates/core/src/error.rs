//! Structured error handling with codes, context and recovery suggestions
//!
//! Every crate in the workspace converts its own error enum into [`Error`]
//! so the binary can print a consistent report and pick an exit code.

use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // General errors (1xxx)
    /// Unexpected failure inside the tool
    Internal = 1001,

    // IO errors (2xxx)
    /// Other IO failure
    IoError = 2000,
    /// File does not exist
    FileNotFound = 2001,
    /// File cannot be read
    PermissionDenied = 2002,

    // Descriptor errors (3xxx)
    /// No descriptor in the searched locations
    ConfigNotFound = 3001,
    /// Missing, mistyped or invalid setting
    MalformedConfig = 3003,
    /// Setting the grammar does not define
    UnknownKey = 3004,

    // Resolution errors (4xxx)
    /// Variant name was never declared
    UnknownVariant = 4001,
    /// No single packaging candidate
    AmbiguousPackaging = 4002,

    // Validation errors (6xxx)
    /// Invalid command-line input
    ValidationError = 6000,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedConfig | Self::UnknownKey | Self::ValidationError => {
                exit_codes::VALIDATION_ERROR
            }
            Self::ConfigNotFound | Self::IoError | Self::FileNotFound | Self::PermissionDenied => {
                exit_codes::CONFIG_ERROR
            }
            Self::UnknownVariant => exit_codes::UNKNOWN_VARIANT,
            Self::AmbiguousPackaging => exit_codes::AMBIGUOUS_PACKAGING,
            Self::Internal => exit_codes::FAILURE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error reported by the buildspec binary
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    /// No descriptor in any of the searched locations
    pub fn config_not_found(searched: &[&str]) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("No build descriptor found (searched: {})", searched.join(", ")),
        )
        .with_suggestion("Create a buildspec.toml file or pass --descriptor <path>")
    }

    /// Setting that the descriptor grammar does not define
    pub fn unknown_key(path: &str) -> Self {
        Self::new(ErrorCode::UnknownKey, format!("Unknown setting: {}", path))
            .with_suggestion("Check the key for typos; unrecognized settings are never ignored")
    }

    /// Invalid command-line input
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
#[allow(missing_docs)]
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const UNKNOWN_VARIANT: i32 = 6;
    pub const AMBIGUOUS_PACKAGING: i32 = 7;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::Internal, format!("JSON error: {}", err)).with_source(err)
    }
}
