//! Fixtures for tests that read or write shard directories.
//!
//! ```
//! use jsonl_shards::testing::*;
//! use jsonl_shards::{DatasetReader, ReaderOptions};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ds = TempDataset::new()?;
//! ds.add_shard("a.jsonl", &[json!({"a": 1}), json!({"a": 2})])?;
//! ds.add_shard("b.jsonl", &numbered_records("b", 0..3))?;
//!
//! let reader: DatasetReader = DatasetReader::open(ds.path(), ReaderOptions::default())?;
//! assert_eq!(reader.read_all()?.len(), 5);
//! # Ok(())
//! # }
//! ```

use crate::error::{DatasetError, Result};
use crate::io::compression::open_reader;
use crate::io::lines::LineSource;
use serde_json::{Value, json};
use std::fmt::Debug;
use std::fs;
use std::io::{self, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A dataset directory that is deleted when dropped.
pub struct TempDataset {
    dir: TempDir,
}

impl TempDataset {
    /// # Errors
    /// If the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `records` to `name` (relative, parents created), one per line with a
    /// trailing newline, the way most external JSONL producers do.
    ///
    /// # Errors
    /// If the file cannot be written.
    pub fn add_shard(&self, name: &str, records: &[Value]) -> io::Result<PathBuf> {
        let mut text = String::new();
        for record in records {
            text.push_str(&record.to_string());
            text.push('\n');
        }
        self.add_raw(name, text.as_bytes())
    }

    /// Write raw bytes to `name`, for malformed or hand-crafted shards.
    ///
    /// # Errors
    /// If the file cannot be written.
    pub fn add_raw(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Like [`add_shard`](Self::add_shard), gzip-compressed.
    ///
    /// # Errors
    /// If the file cannot be written.
    #[cfg(feature = "compression-gzip")]
    pub fn add_gzip_shard(&self, name: &str, records: &[Value]) -> io::Result<PathBuf> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        for record in records {
            enc.write_all(record.to_string().as_bytes())?;
            enc.write_all(b"\n")?;
        }
        let bytes = enc.finish()?;
        self.add_raw(name, &bytes)
    }

    /// Shard files directly in the directory, sorted by name.
    ///
    /// # Errors
    /// If the directory cannot be listed.
    pub fn file_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.dir.path())? {
            let entry = entry?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// `{"<key>": i}` for every `i` in `range`.
#[must_use]
pub fn numbered_records(key: &str, range: Range<usize>) -> Vec<Value> {
    range.map(|i| json!({ key: i })).collect()
}

/// Decoded contents of one shard file, plain or gzip.
///
/// # Errors
/// I/O or decode errors from the file.
pub fn read_shard(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    LineSource::new(path.as_ref())
        .lines()
        .map(|line| {
            let line = line?;
            serde_json::from_str(&line).map_err(|source| DatasetError::Decode { line, source })
        })
        .collect()
}

/// Full decompressed text of one shard file.
///
/// # Errors
/// If the file cannot be opened or is not UTF-8.
pub fn shard_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut text = String::new();
    open_reader(path)?
        .read_to_string(&mut text)
        .map_err(|e| DatasetError::io("read", path, e))?;
    Ok(text)
}

/// Assert two record lists hold the same records, ignoring order.
///
/// # Panics
/// If the multisets differ.
pub fn assert_same_records<T: Debug + Ord + Clone>(actual: &[T], expected: &[T]) {
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort();
    e.sort();
    assert_eq!(
        a, e,
        "record multisets differ:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// [`assert_same_records`] for JSON values, compared by their serialized form.
///
/// # Panics
/// If the multisets differ.
pub fn assert_same_values(actual: &[Value], expected: &[Value]) {
    let a: Vec<String> = actual.iter().map(Value::to_string).collect();
    let e: Vec<String> = expected.iter().map(Value::to_string).collect();
    assert_same_records(&a, &e);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shards_round_trip_through_fixtures() {
        let ds = TempDataset::new().unwrap();
        let records = numbered_records("id", 0..3);
        let path = ds.add_shard("nested/x.jsonl", &records).unwrap();
        assert_eq!(read_shard(&path).unwrap(), records);
        assert_eq!(
            shard_text(&path).unwrap(),
            "{\"id\":0}\n{\"id\":1}\n{\"id\":2}\n"
        );
    }

    #[test]
    fn unordered_comparison() {
        assert_same_values(
            &[json!({"b": 1}), json!({"a": 1})],
            &[json!({"a": 1}), json!({"b": 1})],
        );
    }
}
