//! Shard file naming and the resume decision.
//!
//! Shard files are named `{prefix}{index:05}.jsonl` (or `.jsonl.gz`). On start-up the
//! writer reconciles with whatever is already on disk:
//!
//! 1. list the files matching prefix and extension, ordered by index;
//! 2. no files: start at shard 0 with 0 records;
//! 3. otherwise count the records in the highest-indexed file; if it is already
//!    full, start the next index empty, else resume appending to it.
//!
//! The pure part of that decision is [`plan_resume`]; [`ShardLayout::resume_point`]
//! does the directory listing and counting around it.

use crate::error::{DatasetError, Result};
use crate::io::compression::Compression;
use crate::io::lines::LineSource;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the writer should continue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumePoint {
    /// Shard index to append to next.
    pub index: usize,
    /// Records already present in that shard.
    pub count: usize,
}

/// Decide the resume point from the last existing shard `(index, records)`.
///
/// A full shard is never appended to again, and no shard beyond `last + 1` is chosen.
pub fn plan_resume(last: Option<(usize, usize)>, max_shard_size: usize) -> ResumePoint {
    match last {
        None => ResumePoint { index: 0, count: 0 },
        Some((index, count)) if count >= max_shard_size => ResumePoint {
            index: index + 1,
            count: 0,
        },
        Some((index, count)) => ResumePoint { index, count },
    }
}

/// Naming scheme of one writer's shards inside a directory.
#[derive(Clone, Debug)]
pub struct ShardLayout {
    directory: PathBuf,
    prefix: String,
    compression: Compression,
    matcher: Regex,
}

impl ShardLayout {
    /// # Errors
    /// [`DatasetError::Config`] if the name pattern cannot be built.
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        compression: Compression,
    ) -> Result<Self> {
        let prefix = prefix.into();
        let ext = regex::escape(compression.extension());
        let matcher = Regex::new(&format!(r"^{}(\d+)\.{}$", regex::escape(&prefix), ext))
            .map_err(|e| DatasetError::Config(format!("shard name pattern: {e}")))?;
        Ok(Self {
            directory: directory.into(),
            prefix,
            compression,
            matcher,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// `{prefix}{index:05}.{ext}`
    pub fn file_name(&self, index: usize) -> String {
        format!("{}{index:05}.{}", self.prefix, self.compression.extension())
    }

    pub fn path(&self, index: usize) -> PathBuf {
        self.directory.join(self.file_name(index))
    }

    /// Index encoded in a file name, if it belongs to this layout.
    pub fn parse_index(&self, file_name: &str) -> Option<usize> {
        let caps = self.matcher.captures(file_name)?;
        caps.get(1)?.as_str().parse().ok()
    }

    /// Existing shards of this layout, ordered by index.
    ///
    /// # Errors
    /// [`DatasetError::Io`] if the directory cannot be listed.
    pub fn existing(&self) -> Result<Vec<(usize, PathBuf)>> {
        let entries = fs::read_dir(&self.directory)
            .map_err(|e| DatasetError::io("list", &self.directory, e))?;
        let mut shards = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DatasetError::io("list", &self.directory, e))?;
            let name = entry.file_name();
            let Some(index) = name.to_str().and_then(|n| self.parse_index(n)) else {
                continue;
            };
            if entry.path().is_file() {
                shards.push((index, entry.path()));
            }
        }
        shards.sort_by_key(|(index, _)| *index);
        Ok(shards)
    }

    /// Inspect the directory and decide where writing continues.
    ///
    /// # Errors
    /// [`DatasetError::Io`] if listing the directory or reading the last shard fails.
    pub fn resume_point(&self, max_shard_size: usize) -> Result<ResumePoint> {
        let last = match self.existing()?.pop() {
            Some((index, path)) => Some((index, count_records(&path)?)),
            None => None,
        };
        Ok(plan_resume(last, max_shard_size))
    }
}

/// Number of lines in a shard. The writer never emits blank lines, so this is the
/// record count of any shard it produced.
fn count_records(path: &Path) -> Result<usize> {
    let mut count = 0;
    for line in LineSource::new(path).lines() {
        line?;
        count += 1;
    }
    Ok(count)
}
