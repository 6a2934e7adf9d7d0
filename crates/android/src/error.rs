//! Error types for build descriptors.

use buildspec_core::validation::ValidationResult;
use buildspec_core::{Error, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for descriptor operations.
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Errors raised while loading or querying a build descriptor.
///
/// All variants are terminal: they describe a defect in the descriptor or in
/// the caller's request, never a transient condition.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// A required setting is missing, mistyped, or violates an invariant
    #[error("Malformed descriptor: {0}")]
    MalformedConfig(String),

    /// A setting that the descriptor grammar does not define
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    /// Variant lookup for a name that was never declared
    #[error("Unknown build variant: {name}")]
    UnknownVariant {
        /// Requested variant name
        name: String,
        /// Names that are declared
        declared: Vec<String>,
    },

    /// No single packaging candidate could be selected
    #[error("Ambiguous packaging for {pattern}: {reason}")]
    AmbiguousPackaging {
        /// Pick-first pattern being resolved
        pattern: String,
        /// Why no candidate could be chosen
        reason: String,
    },

    /// Descriptor file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Turn accumulated invariant violations into a single malformed-config error.
pub(crate) fn ensure(result: ValidationResult) -> Result<()> {
    if result.is_valid() {
        Ok(())
    } else {
        Err(DescriptorError::malformed(result.summary()))
    }
}

impl DescriptorError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedConfig(message.into())
    }

    pub(crate) fn ambiguous(pattern: &str, reason: impl Into<String>) -> Self {
        Self::AmbiguousPackaging {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    /// Error code used when reporting through [`buildspec_core::Error`]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedConfig(_) => ErrorCode::MalformedConfig,
            Self::UnknownKey(_) => ErrorCode::UnknownKey,
            Self::UnknownVariant { .. } => ErrorCode::UnknownVariant,
            Self::AmbiguousPackaging { .. } => ErrorCode::AmbiguousPackaging,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::FileNotFound
            }
            Self::Io { .. } => ErrorCode::IoError,
        }
    }
}

impl From<DescriptorError> for Error {
    fn from(err: DescriptorError) -> Self {
        let code = err.code();
        match err {
            DescriptorError::MalformedConfig(message) => Error::new(code, message),
            DescriptorError::UnknownKey(path) => Error::unknown_key(&path),
            DescriptorError::UnknownVariant { ref name, ref declared } => {
                let suggestion = if declared.is_empty() {
                    "Declare it under [android.build_types]".to_string()
                } else {
                    format!("Declared variants: {}", declared.join(", "))
                };
                Error::new(code, format!("Unknown build variant: {}", name))
                    .with_suggestion(suggestion)
            }
            DescriptorError::AmbiguousPackaging { pattern, reason } => {
                Error::new(code, format!("Ambiguous packaging for {}: {}", pattern, reason))
            }
            DescriptorError::Io { path, source } => {
                Error::new(code, format!("Failed to read {}", path.display()))
                    .with_source(source)
            }
        }
    }
}
