//! Record store error types.

use std::path::PathBuf;

/// Errors from reading, writing, or locating records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Filesystem error while reading or writing a record.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record document is not valid.
    #[error("invalid record document {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A tag string could not be parsed.
    #[error("invalid tag '{0}': expected GGGG,EEEE in hex")]
    InvalidTag(String),

    /// A file-name glob could not be compiled.
    #[error("invalid record pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The directory to search does not exist.
    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),
}
