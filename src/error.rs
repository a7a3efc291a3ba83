//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Result`]. The variants follow
//! the failure classes a dataset reader or writer can run into:
//!
//! - **configuration**: [`DatasetError::Config`], [`DatasetError::NotADirectory`],
//!   [`DatasetError::NoShards`]. Raised synchronously at construction.
//! - **I/O**: [`DatasetError::Io`]. Raised where it happens and always names the file.
//! - **decode**: [`DatasetError::Decode`]. Governed by `skip_on_error` on the reader.
//! - **serialization**: [`DatasetError::Serialize`]. Raised by the writer before any
//!   byte reaches the shard.
//! - **worker**: I/O failures inside a parallel reader job surface unchanged as
//!   [`DatasetError::Io`]; a job that panics surfaces as [`DatasetError::WorkerPanic`].

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors raised while reading or writing a sharded JSONL dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Invalid option value or strategy name.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The reader was pointed at something that is not a directory.
    #[error("'{}' is not a valid directory", .0.display())]
    NotADirectory(PathBuf),

    /// The directory exists but holds no `*.jsonl` / `*.jsonl.gz` shards.
    #[error("no .jsonl files found in '{}'", .0.display())]
    NoShards(PathBuf),

    /// Opening, reading, writing or syncing a file failed.
    #[error("{context} {}: {source}", path.display())]
    Io {
        /// Short verb phrase describing the failed step (`"open"`, `"read"`, ...).
        context: &'static str,
        /// File or directory the operation targeted.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line did not parse as JSON.
    #[error("malformed JSON line {line:?}: {source}")]
    Decode {
        /// The offending line, terminator stripped.
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized to JSON.
    #[error("serialize record: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A parallel reader job panicked while reading the given file.
    #[error("reader job for '{}' panicked", .0.display())]
    WorkerPanic(PathBuf),

    /// The worker pool for a parallel reader could not be built.
    #[error("build reader thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DatasetError {
    pub(crate) fn io(context: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        DatasetError::Io {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// `true` for errors raised while validating options or locating shards.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DatasetError::Config(_) | DatasetError::NotADirectory(_) | DatasetError::NoShards(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_file() {
        let err = DatasetError::io(
            "open",
            "/tmp/shard_00000.jsonl",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("open /tmp/shard_00000.jsonl"), "{msg}");
        assert!(!err.is_config());
    }

    #[test]
    fn config_classification() {
        assert!(DatasetError::Config("x".into()).is_config());
        assert!(DatasetError::NoShards(PathBuf::from("d")).is_config());
        assert!(DatasetError::NotADirectory(PathBuf::from("d")).is_config());
    }
}
