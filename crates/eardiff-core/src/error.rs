//! Unified error handling for eardiff
//!
//! Every failure that can abort a comparison run is expressed through
//! [`Error`]. Callers that only care about the broad category (unreadable
//! archive vs. failed extraction vs. bad invocation) use [`Error::kind`].

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all eardiff operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error while reading an archive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive file could not be opened
    #[error("Archive not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Archive Errors ====================

    /// Archive is missing, truncated, or structurally broken
    #[error("Archive unreadable: {message}")]
    ArchiveUnreadable {
        message: String,
    },

    /// Invalid record signature
    #[error("Invalid signature: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    /// Decompressed bytes do not match the recorded CRC-32
    #[error("Checksum mismatch for {entry}: expected {expected:08X}, got {actual:08X}")]
    ChecksumMismatch {
        entry: String,
        expected: u32,
        actual: u32,
    },

    /// Unsupported compression method
    #[error("Unsupported compression method {method} for {entry}")]
    UnsupportedCompression {
        entry: String,
        method: u16,
    },

    /// Decompression failed
    #[error("Decompression failed for {entry}: {message}")]
    DecompressionFailed {
        entry: String,
        message: String,
    },

    // ==================== Extraction Errors ====================

    /// A nested archive could not be materialized for scanning
    #[error("Extraction of {entry} failed: {message}")]
    ExtractionFailed {
        entry: String,
        message: String,
    },

    /// Encrypted entries cannot be extracted
    #[error("Entry {entry} is encrypted")]
    EncryptedEntry {
        entry: String,
    },

    /// Nested archives go deeper than the configured limit
    #[error("Nesting limit of {limit} exceeded at {entry}")]
    NestingTooDeep {
        entry: String,
        limit: u32,
    },

    // ==================== Invocation Errors ====================

    /// Wrong command-line usage
    #[error("Invalid invocation: {message}")]
    Invocation {
        message: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Broad failure categories reported to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File missing, not a valid container, or stream corruption
    ArchiveUnreadable,
    /// A nested archive's bytes could not be materialized
    ExtractionFailure,
    /// Wrong command-line usage
    Invocation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ArchiveUnreadable => "archive unreadable",
            ErrorKind::ExtractionFailure => "extraction failure",
            ErrorKind::Invocation => "invocation error",
        };
        f.write_str(name)
    }
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an archive unreadable error
    pub fn unreadable(message: impl Into<String>) -> Self {
        Error::ArchiveUnreadable {
            message: message.into(),
        }
    }

    /// Create an extraction error for a nested entry
    pub fn extraction(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ExtractionFailed {
            entry: entry.into(),
            message: message.into(),
        }
    }

    /// Classify this error into its broad category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_)
            | Error::FileNotFound(_)
            | Error::ArchiveUnreadable { .. }
            | Error::InvalidMagic { .. }
            | Error::ChecksumMismatch { .. }
            | Error::UnsupportedCompression { .. }
            | Error::DecompressionFailed { .. } => ErrorKind::ArchiveUnreadable,
            Error::ExtractionFailed { .. }
            | Error::EncryptedEntry { .. }
            | Error::NestingTooDeep { .. } => ErrorKind::ExtractionFailure,
            Error::Invocation { .. } => ErrorKind::Invocation,
            Error::WithContext { source, .. } => source.kind(),
        }
    }

    /// The innermost error, skipping context wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::FileNotFound(PathBuf::from("/test.ear"));
        let contextualized = err.with_context("while scanning first archive");

        assert!(contextualized.to_string().contains("while scanning first archive"));
        assert!(contextualized.to_string().contains("/test.ear"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::unreadable("truncated").kind(), ErrorKind::ArchiveUnreadable);
        assert_eq!(
            Error::ChecksumMismatch { entry: "a.jar".into(), expected: 1, actual: 2 }.kind(),
            ErrorKind::ArchiveUnreadable
        );
        assert_eq!(Error::extraction("a.jar", "disk full").kind(), ErrorKind::ExtractionFailure);
        assert_eq!(
            Error::NestingTooDeep { entry: "a.jar".into(), limit: 4 }.kind(),
            ErrorKind::ExtractionFailure
        );
        assert_eq!(Error::Invocation { message: "two paths".into() }.kind(), ErrorKind::Invocation);
    }

    #[test]
    fn test_kind_looks_through_context() {
        let err = Error::extraction("lib/inner.jar", "permission denied")
            .with_context("scanning app.ear")
            .with_context("comparing");

        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
        assert!(matches!(err.root_cause(), Error::ExtractionFailed { .. }));
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::FileNotFound(PathBuf::from("/test.ear")));
        let with_context = result.context("opening archive");

        assert!(with_context.is_err());
        assert!(with_context.unwrap_err().to_string().contains("opening archive"));
    }
}
