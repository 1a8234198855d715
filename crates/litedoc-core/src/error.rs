//! Error types for LiteDoc operations
//!
//! Every fallible operation returns a [`DocResult`]. Path misses and
//! create-on-existing conditions are ordinary variants the caller can branch
//! on; file, codec and parse failures mean the in-memory document can no
//! longer be trusted to match disk.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// LiteDoc error types with detailed context
#[derive(Debug, Clone)]
pub enum DocError {
    /// Key path does not resolve to a value
    NotFound {
        /// The key path that was looked up
        path: String,
    },

    /// Create operation targeted a key path that already holds a value
    AlreadyExists {
        /// The key path that already resolves
        path: String,
    },

    /// A written value does not match the pattern registered for its key
    Validation {
        /// Field key the pattern is registered under
        key: String,
        /// The registered pattern
        pattern: String,
        /// String form of the rejected value
        value: String,
    },

    /// A validation pattern failed to compile
    InvalidPattern {
        /// Field key the pattern was meant for
        key: String,
        /// The offending pattern text
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Key path text cannot be used to address the document
    InvalidPath {
        /// The rejected path text
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// On-disk content is not a valid document
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Obfuscated content could not be decoded
    Codec {
        /// File being decoded, when known
        path: Option<PathBuf>,
        /// Decoder message
        message: String,
    },

    /// I/O operation failed
    Io {
        /// The file path where the error occurred
        path: Option<PathBuf>,
        /// The underlying I/O error kind
        kind: std::io::ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// Restored file does not match the backup it was copied from
    ChecksumMismatch {
        /// File where checksum failed
        path: PathBuf,
        /// Checksum of the backup bytes
        expected: u32,
        /// Checksum of the bytes found on disk
        actual: u32,
    },

    /// Backup name cannot be used as a sibling file name
    InvalidBackupName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Store configuration is incomplete or inconsistent
    Config {
        /// Description of the problem
        reason: String,
    },
}

impl DocError {
    /// True for [`DocError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocError::NotFound { .. })
    }

    /// True for [`DocError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, DocError::AlreadyExists { .. })
    }

    /// True for [`DocError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, DocError::Validation { .. })
    }

    pub(crate) fn not_found(path: impl fmt::Display) -> Self {
        DocError::NotFound { path: path.to_string() }
    }

    pub(crate) fn io(path: &std::path::Path, err: std::io::Error, what: &str) -> Self {
        DocError::Io {
            path: Some(path.to_path_buf()),
            kind: err.kind(),
            message: format!("{}: {}", what, err),
        }
    }
}

impl fmt::Display for DocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocError::NotFound { path } => {
                write!(f, "Key '{}' does not exist (use set_data to create it)", path)
            }

            DocError::AlreadyExists { path } => {
                write!(f, "Key '{}' already exists (use edit_data to modify it)", path)
            }

            DocError::Validation { key, pattern, value } => {
                write!(f, "Value '{}' for field '{}' does not match pattern '{}'",
                       value, key, pattern)
            }

            DocError::InvalidPattern { key, pattern, reason } => {
                write!(f, "Invalid pattern '{}' for field '{}': {}", pattern, key, reason)
            }

            DocError::InvalidPath { path, reason } => {
                write!(f, "Invalid key path '{}': {} (use a path like 'users/1')", path, reason)
            }

            DocError::Parse { path, message } => {
                write!(f, "Failed to parse document {}: {}", path.display(), message)
            }

            DocError::Codec { path, message } => {
                if let Some(path) = path {
                    write!(f, "Failed to decode {}: {} (check the obfuscation key)",
                           path.display(), message)
                } else {
                    write!(f, "Failed to decode: {} (check the obfuscation key)", message)
                }
            }

            DocError::Io { path, kind, message } => {
                if let Some(path) = path {
                    write!(f, "I/O error in {}: {} ({})", path.display(), message, kind)
                } else {
                    write!(f, "I/O error: {} ({})", message, kind)
                }
            }

            DocError::ChecksumMismatch { path, expected, actual } => {
                write!(f, "Checksum mismatch in {}: expected 0x{:08x}, got 0x{:08x}",
                       path.display(), expected, actual)
            }

            DocError::InvalidBackupName { name, reason } => {
                write!(f, "Invalid backup name '{}': {}", name, reason)
            }

            DocError::Config { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
        }
    }
}

impl Error for DocError {}

/// Convert std::io::Error to DocError::Io
impl From<std::io::Error> for DocError {
    fn from(err: std::io::Error) -> Self {
        DocError::Io {
            path: None,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for LiteDoc operations
pub type DocResult<T> = Result<T, DocError>;
