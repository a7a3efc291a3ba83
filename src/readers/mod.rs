//! Reading records from a directory of JSONL shards.
//!
//! [`DatasetReader`] discovers shard files once at construction and can then be
//! iterated any number of times. Each pass builds a fresh line stream using the
//! configured [`ReadStrategy`]:
//!
//! | strategy       | merge                                   | threads |
//! |----------------|-----------------------------------------|---------|
//! | `sequential`   | file after file                         | none    |
//! | `round_robin`  | one line per active file per round      | none    |
//! | `parallel`     | [`ParallelLineReader`](parallel::ParallelLineReader), no cross-file order | pool |
//!
//! and decodes it with [`RecordDecoder`](decode::RecordDecoder).

pub mod decode;
pub mod ordered;
pub mod parallel;

use crate::config::{ReadStrategy, ReaderOptions};
use crate::error::Result;
use crate::io::glob::discover_shards;
use crate::io::lines::LineSource;
use decode::RecordDecoder;
use ordered::RoundRobin;
use parallel::ParallelLineReader;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A merged stream of raw lines from every shard.
pub type LineStream = Box<dyn Iterator<Item = Result<String>> + Send>;

/// The record iterator returned by [`DatasetReader::iter`].
pub type Records<T> = RecordDecoder<LineStream, T>;

/// Reader over every `*.jsonl` / `*.jsonl.gz` file below a directory.
///
/// Records decode to `T`, which defaults to [`serde_json::Value`].
///
/// # Example
/// ```no_run
/// use jsonl_shards::{DatasetReader, ReadStrategy, ReaderOptions};
///
/// # fn main() -> jsonl_shards::Result<()> {
/// let opts = ReaderOptions::default().with_strategy(ReadStrategy::Parallel);
/// let reader: DatasetReader = DatasetReader::open("data/train", opts)?;
/// for record in reader.iter()? {
///     let record = record?;
///     println!("{record}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct DatasetReader<T = Value> {
    directory: PathBuf,
    files: Vec<PathBuf>,
    options: ReaderOptions,
    len: Option<usize>,
    _t: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> DatasetReader<T> {
    /// Validate `options` and discover the shards under `directory`.
    ///
    /// # Errors
    /// Configuration errors ([`DatasetError::is_config`](crate::DatasetError::is_config))
    /// for invalid options, a missing directory, or a directory without shards.
    pub fn open(directory: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        options.validate()?;
        let directory = directory.as_ref().to_path_buf();
        let files = discover_shards(&directory)?;
        debug!(
            directory = %directory.display(),
            files = files.len(),
            strategy = %options.strategy,
            "discovered shards"
        );
        Ok(Self {
            directory,
            files,
            options,
            len: None,
            _t: PhantomData,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Shard files in read order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Start a pass over every record.
    ///
    /// With the parallel strategy this starts the reader's jobs; dropping the returned
    /// iterator stops and joins them.
    ///
    /// # Errors
    /// [`DatasetError::ThreadPool`](crate::DatasetError::ThreadPool) if the parallel
    /// worker pool cannot be built.
    pub fn iter(&self) -> Result<Records<T>> {
        let lines: LineStream = match self.options.strategy {
            ReadStrategy::Sequential => Box::new(ordered::sequential(self.sources())),
            ReadStrategy::RoundRobin => Box::new(RoundRobin::from_sources(self.sources())),
            ReadStrategy::Parallel => Box::new(ParallelLineReader::spawn(
                self.files.clone(),
                self.options.workers,
                self.options.queue_capacity,
            )?),
        };
        Ok(RecordDecoder::new(lines, self.options.skip_on_error).with_limit(self.options.limit))
    }

    /// Collect every record of one pass.
    ///
    /// # Errors
    /// The first error of the pass.
    pub fn read_all(&self) -> Result<Vec<T>> {
        self.iter()?.collect()
    }

    /// Total number of records, counted by a full pass on the first call and cached
    /// afterwards. Files added to the directory later are not picked up.
    ///
    /// # Errors
    /// Any error raised during the counting pass; nothing is cached in that case.
    pub fn len(&mut self) -> Result<usize> {
        if let Some(len) = self.len {
            return Ok(len);
        }
        let mut count = 0;
        for record in self.iter()? {
            record?;
            count += 1;
        }
        self.len = Some(count);
        Ok(count)
    }

    /// # Errors
    /// See [`len`](Self::len).
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn sources(&self) -> Vec<LineSource> {
        self.files.iter().map(LineSource::new).collect()
    }
}
