//! Reader and writer options.
//!
//! Both option structs are plain data with `Default` values and serde support, so a
//! caller can embed them in whatever configuration file format it already loads.
//!
//! ```
//! use jsonl_shards::{ReadStrategy, ReaderOptions};
//!
//! let opts: ReaderOptions =
//!     serde_json::from_str(r#"{"strategy":"round_robin","skip_on_error":true}"#).unwrap();
//! assert_eq!(opts.strategy, ReadStrategy::RoundRobin);
//! assert_eq!(opts.queue_capacity, 10_000);
//! ```

use crate::error::{DatasetError, Result};
use crate::io::compression::Compression;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default bound on in-flight lines for the parallel reader.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default number of records per shard for the writer.
pub const DEFAULT_MAX_SHARD_SIZE: usize = 1_000_000;

/// Default shard file name prefix.
pub const DEFAULT_SHARD_PREFIX: &str = "shard_";

/// How lines from several shard files are merged into one stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Files end-to-end, in discovery order.
    #[default]
    Sequential,
    /// One line from every non-exhausted file per round, in discovery order.
    RoundRobin,
    /// One job per file on a worker pool; no ordering across files.
    Parallel,
}

impl ReadStrategy {
    /// The snake_case name used by `FromStr`, `Display` and serde.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReadStrategy::Sequential => "sequential",
            ReadStrategy::RoundRobin => "round_robin",
            ReadStrategy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadStrategy {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential" => Ok(ReadStrategy::Sequential),
            "round_robin" => Ok(ReadStrategy::RoundRobin),
            "parallel" => Ok(ReadStrategy::Parallel),
            other => Err(DatasetError::Config(format!(
                "read strategy must be 'sequential', 'round_robin' or 'parallel', got '{other}'"
            ))),
        }
    }
}

/// Options for [`DatasetReader`](crate::DatasetReader).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Merge strategy across shard files.
    pub strategy: ReadStrategy,
    /// Drop malformed lines instead of failing.
    pub skip_on_error: bool,
    /// Parallel worker count; `None` resolves automatically
    /// (see [`resolve_workers`](crate::readers::parallel::resolve_workers)).
    pub workers: Option<usize>,
    /// Bound on lines buffered between parallel jobs and the consumer.
    pub queue_capacity: usize,
    /// Stop after this many records.
    pub limit: Option<usize>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            strategy: ReadStrategy::default(),
            skip_on_error: false,
            workers: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            limit: None,
        }
    }
}

impl ReaderOptions {
    #[must_use]
    pub fn with_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_skip_on_error(mut self, skip: bool) -> Self {
        self.skip_on_error = skip;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reject option values no reader can honour.
    ///
    /// # Errors
    /// [`DatasetError::Config`] for `workers == Some(0)` or `queue_capacity == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(DatasetError::Config("workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(DatasetError::Config("queue_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// Options for [`ShardedWriter`](crate::ShardedWriter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Records per shard before rotating.
    pub max_shard_size: usize,
    /// File name prefix; shards are named `{prefix}{index:05}.jsonl[.gz]`.
    pub shard_prefix: String,
    /// Write gzip shards (`.jsonl.gz`).
    pub compress: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_shard_size: DEFAULT_MAX_SHARD_SIZE,
            shard_prefix: DEFAULT_SHARD_PREFIX.to_string(),
            compress: false,
        }
    }
}

impl WriterOptions {
    #[must_use]
    pub fn with_max_shard_size(mut self, max: usize) -> Self {
        self.max_shard_size = max;
        self
    }

    #[must_use]
    pub fn with_shard_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shard_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[must_use]
    pub fn compression(&self) -> Compression {
        if self.compress {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    /// # Errors
    /// [`DatasetError::Config`] when `max_shard_size` is zero or the prefix contains a
    /// path separator.
    pub fn validate(&self) -> Result<()> {
        if self.max_shard_size == 0 {
            return Err(DatasetError::Config("max_shard_size must be at least 1".into()));
        }
        if self.shard_prefix.contains(['/', '\\']) {
            return Err(DatasetError::Config(format!(
                "shard_prefix must not contain a path separator: '{}'",
                self.shard_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip() {
        for s in [
            ReadStrategy::Sequential,
            ReadStrategy::RoundRobin,
            ReadStrategy::Parallel,
        ] {
            assert_eq!(s.to_string().parse::<ReadStrategy>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let err = "invalid".parse::<ReadStrategy>().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn reader_defaults_fill_missing_fields() {
        let opts: ReaderOptions = serde_json::from_str(r#"{"strategy":"parallel"}"#).unwrap();
        assert_eq!(opts.strategy, ReadStrategy::Parallel);
        assert!(!opts.skip_on_error);
        assert_eq!(opts.workers, None);
        assert_eq!(opts.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn reader_rejects_zero_workers_and_capacity() {
        assert!(ReaderOptions::default().with_workers(0).validate().is_err());
        assert!(ReaderOptions::default().with_queue_capacity(0).validate().is_err());
        assert!(ReaderOptions::default().with_workers(3).validate().is_ok());
    }

    #[test]
    fn writer_defaults_and_validation() {
        let opts = WriterOptions::default();
        assert_eq!(opts.max_shard_size, 1_000_000);
        assert_eq!(opts.shard_prefix, "shard_");
        assert_eq!(opts.compression(), Compression::None);
        assert!(opts.validate().is_ok());

        assert!(WriterOptions::default().with_max_shard_size(0).validate().is_err());
        assert!(WriterOptions::default().with_shard_prefix("a/b").validate().is_err());
        assert_eq!(
            WriterOptions::default().with_compress(true).compression(),
            Compression::Gzip
        );
    }
}
