//! # jsonl-shards
//!
//! Read and write **JSON Lines datasets split across many files** ("shards"), the
//! layout distributed data-generation jobs typically produce.
//!
//! ## Key Features
//!
//! - **Directory reader**: every `*.jsonl` / `*.jsonl.gz` file below a directory,
//!   discovered recursively and ordered reproducibly
//! - **Three merge strategies**: sequential, round-robin, or parallel (one job per
//!   file, bounded queue for backpressure, cooperative cancellation)
//! - **Decode policy**: fail on the first malformed line, or skip malformed lines
//! - **Sharded writer**: size-bounded shard files that rotate automatically and
//!   resume safely after a restart
//! - **Transparent gzip** on both sides (feature `compression-gzip`, on by default)
//!
//! ## Quick Start
//!
//! ```no_run
//! use jsonl_shards::{DatasetReader, ReadStrategy, ReaderOptions, ShardedWriter, WriterOptions};
//! use serde_json::{Value, json};
//!
//! # fn main() -> jsonl_shards::Result<()> {
//! // Write 2.5 shards worth of records
//! let mut writer = ShardedWriter::create("out", WriterOptions::default().with_max_shard_size(2))?;
//! for i in 0..5 {
//!     writer.write_line(&json!({ "id": i }))?;
//! }
//! writer.close()?;
//!
//! // Read them back, interleaving the shards
//! let opts = ReaderOptions::default().with_strategy(ReadStrategy::RoundRobin);
//! let reader: DatasetReader<Value> = DatasetReader::open("out", opts)?;
//! let records = reader.read_all()?;
//! assert_eq!(records.len(), 5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading
//!
//! A [`DatasetReader`] is built from a directory and [`ReaderOptions`]. Each call to
//! [`iter`](DatasetReader::iter) starts a fresh pass:
//!
//! - [`ReadStrategy::Sequential`]: file after file, line after line.
//! - [`ReadStrategy::RoundRobin`]: one line from each non-exhausted file per round.
//! - [`ReadStrategy::Parallel`]: see [`readers::parallel`]. Order is kept within a
//!   file only. Dropping the iterator stops and joins every job.
//!
//! ## Writing
//!
//! A [`ShardedWriter`] owns the shard sequence `{prefix}{index:05}.jsonl[.gz]` in one
//! directory. See [`writers`] for the rotation and resume rules.
//!
//! ## Errors
//!
//! All operations return [`Result`] with a [`DatasetError`]; see [`error`] for how the
//! variants map onto configuration, I/O, decode and worker failures.
//!
//! ## Logging
//!
//! Diagnostic events are emitted through [`tracing`]; install a subscriber to see
//! them. Skipped malformed lines are never logged.
//!
//! ## Module Overview
//!
//! - [`readers`] - Dataset reader, merge strategies and record decoding
//! - [`writers`] - Sharded writer and shard layout
//! - [`io`] - Line sources, gzip handling and shard discovery
//! - [`config`] - Reader and writer options
//! - [`error`] - Error type
//! - [`testing`] - Fixtures for tests over shard directories

pub mod config;
pub mod error;
pub mod io;
pub mod readers;
pub mod testing;
pub mod writers;

pub use config::{ReadStrategy, ReaderOptions, WriterOptions};
pub use error::{DatasetError, Result};
pub use io::compression::Compression;
pub use io::lines::{LineSource, Lines};
pub use readers::decode::RecordDecoder;
pub use readers::ordered::RoundRobin;
pub use readers::parallel::ParallelLineReader;
pub use readers::{DatasetReader, LineStream, Records};
pub use writers::ShardedWriter;
pub use writers::layout::{ResumePoint, ShardLayout};
