//! Error types
//!
//! Every failure the library reports is a `TreeringError`. Parsing either
//! succeeds completely for a file or aborts with one of these.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, transforming or writing ring-width records
#[derive(Error, Debug)]
pub enum TreeringError {
    /// Malformed Heidelberg content (dates, zero block, payload lengths, markers)
    #[error("Format error in {}{}: {message}", file.display(), key_suffix(key))]
    Format {
        file: PathBuf,
        key: Option<String>,
        message: String,
    },

    /// Payload encoding that is recognised but not implemented
    #[error("Unsupported encoding '{encoding}' for series {key} in {}", file.display())]
    UnsupportedEncoding {
        file: PathBuf,
        key: String,
        encoding: String,
    },

    /// A caller violated an operation's precondition
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Reading or writing a file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal consistency check failed while writing
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    /// CSV or JSON export failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<csv::Error> for TreeringError {
    fn from(err: csv::Error) -> Self {
        TreeringError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TreeringError {
    fn from(err: serde_json::Error) -> Self {
        TreeringError::Serialization(err.to_string())
    }
}

fn key_suffix(key: &Option<String>) -> String {
    match key {
        Some(k) => format!(" (series {k})"),
        None => String::new(),
    }
}

impl TreeringError {
    /// Build a format error for a file, optionally tied to a record key
    pub fn format(
        file: impl Into<PathBuf>,
        key: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        TreeringError::Format {
            file: file.into(),
            key: key.map(str::to_string),
            message: message.into(),
        }
    }

    /// Build an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreeringError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for library operations
pub type TreeringResult<T> = Result<T, TreeringError>;
