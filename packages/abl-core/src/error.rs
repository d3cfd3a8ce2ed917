//! Front-end error types.

use thiserror::Error;

/// Errors raised by schema loading, configuration, and cache builds.
///
/// Lookups never produce these; they report "not found" through `Option`,
/// `bool` or an empty string instead.
#[derive(Error, Debug, Clone)]
pub enum ProparseError {
    /// Malformed line in a schema description
    #[error("Schema format error at line {line}: {message}")]
    SchemaFormat { line: usize, message: String },

    /// Data type name not recognised in a schema description
    #[error("Unknown data type '{name}'")]
    UnknownDataType { name: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Disk full while writing an artifact
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    /// String too long for the artifact's length-prefixed encoding
    #[error("String of {len} bytes exceeds the 65535 byte limit")]
    StringTooLong { len: usize },

    /// Artifact bytes do not follow the expected layout
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unit parser failure
    #[error("Failed to parse '{unit}': {message}")]
    Parse { unit: String, message: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProparseError>;
