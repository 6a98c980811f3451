//! Error types for pdfweave.
//!
//! Every failure the engine can report is a [`WeaveError`]. Variants map
//! one-to-one onto the messages a host shows to the user, so no two kinds
//! share a rendering.
//!
//! # Error Categories
//!
//! - **Input Errors**: bytes that are not a document, or a broken document
//! - **State Errors**: unknown ids, merging nothing, splitting without a source
//! - **Composition Errors**: codec failures while building an output
//! - **Configuration Errors**: invalid engine settings

use std::io;

use thiserror::Error;

use crate::codec::CodecFailure;

/// Result type alias for pdfweave operations.
pub type Result<T> = std::result::Result<T, WeaveError>;

/// Main error type for pdfweave operations.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Input bytes are not a recognized document container.
    #[error("Unsupported document: {name}\n  Reason: {reason}")]
    UnsupportedFormat {
        /// Display name of the rejected input.
        name: String,
        /// What the container check found.
        reason: String,
    },

    /// Input has the right signature but cannot be parsed.
    #[error("Corrupted or invalid document: {name}\n  Details: {reason}")]
    CorruptInput {
        /// Display name of the broken input.
        name: String,
        /// Parser diagnostics.
        reason: String,
    },

    /// Merge was requested with zero sources.
    #[error("No source documents to merge\n  Hint: add at least one PDF first")]
    EmptyInput,

    /// An operation referenced an id that is not in the collection.
    #[error("No entry with id {id}")]
    NotFound {
        /// The id that was looked up, rendered as text.
        id: String,
    },

    /// Decoding, copying or serializing failed during a composition.
    #[error("Failed to compose from '{source_name}'\n  Reason: {reason}")]
    CodecError {
        /// The source (or output) the failure is attributed to.
        source_name: String,
        /// Codec diagnostics.
        reason: String,
    },

    /// A range operation was attempted before a split source was loaded.
    #[error("No document loaded for splitting")]
    NoSplitSource,

    /// Invalid engine configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// A blocking composition task panicked or was cancelled by the runtime.
    #[error("Composition task failed: {reason}")]
    TaskFailed {
        /// Join error reported by the runtime.
        reason: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },
}

impl From<tokio::task::JoinError> for WeaveError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl WeaveError {
    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a CorruptInput error.
    pub fn corrupt_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error for any displayable id.
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create a CodecError attributed to `source_name`.
    pub fn codec(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CodecError {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Classify a codec failure raised while importing an input.
    ///
    /// A missing signature is an unsupported format; anything else the codec
    /// rejects is a corrupt input.
    pub fn from_load_failure(name: impl Into<String>, failure: CodecFailure) -> Self {
        match failure {
            CodecFailure::Unsupported(reason) => Self::unsupported_format(name, reason),
            other => Self::corrupt_input(name, other.to_string()),
        }
    }

    /// Wrap a codec failure raised while composing an output.
    pub fn from_compose_failure(source_name: impl Into<String>, failure: CodecFailure) -> Self {
        Self::codec(source_name, failure.to_string())
    }

    /// Check if this error only affects one input or one output unit.
    ///
    /// Returns true for errors a host can report and move past, such as a
    /// single rejected file during import or a single failed split range.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::CorruptInput { .. } | Self::CodecError { .. }
        )
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::InvalidConfig { .. }
                | Self::TaskFailed { .. }
                | Self::Io { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedFormat { .. } => 3,
            Self::CorruptInput { .. } => 3,
            Self::EmptyInput => 1,
            Self::NotFound { .. } => 1,
            Self::CodecError { .. } => 6,
            Self::NoSplitSource => 1,
            Self::InvalidConfig { .. } => 1,
            Self::TaskFailed { .. } => 6,
            Self::Io { .. } => 5,
        }
    }
}
