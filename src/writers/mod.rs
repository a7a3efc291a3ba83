//! Resumable, size-rotating JSONL shard writer.
//!
//! [`ShardedWriter`] appends one JSON record per line to the current shard and moves
//! to the next shard once `max_shard_size` records are in it. The rotation check runs
//! *before* each write, so no shard ever receives more than `max_shard_size` records
//! and no empty trailing shard is ever created.
//!
//! Records are separated by `\n`, which is written *before* every record except a
//! shard's first. Shards therefore never start or end with a blank line.
//!
//! A writer opened on a directory that already holds shards picks up where the last
//! session stopped (see [`layout`]). Two writers on the same directory at the same
//! time are not supported.

pub mod layout;

use crate::config::WriterOptions;
use crate::error::{DatasetError, Result};
use crate::io::compression::{AppendStream, open_appender};
use layout::ShardLayout;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes records into `{prefix}{index:05}.jsonl[.gz]` shard files.
///
/// Close the writer with [`close`](Self::close) to observe errors from the final
/// flush; dropping it closes as well but can only log a failure.
///
/// # Example
/// ```no_run
/// use jsonl_shards::{ShardedWriter, WriterOptions};
/// use serde_json::json;
///
/// # fn main() -> jsonl_shards::Result<()> {
/// let mut writer = ShardedWriter::create("out", WriterOptions::default().with_max_shard_size(1))?;
/// writer.write_line(&json!({"a": 1}))?; // out/shard_00000.jsonl
/// writer.write_line(&json!({"b": 2}))?; // out/shard_00001.jsonl
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
pub struct ShardedWriter {
    layout: ShardLayout,
    max_shard_size: usize,
    index: usize,
    count: usize,
    stream: Option<AppendStream>,
}

impl ShardedWriter {
    /// Create `directory` if needed and resume after any shards already in it.
    ///
    /// When the last existing shard still has room it is opened for appending right
    /// away. A fresh shard file is only created by the first write into it.
    ///
    /// # Errors
    /// [`DatasetError::Config`] for invalid options; [`DatasetError::Io`] if the
    /// directory cannot be created or listed, or the resumed shard cannot be read or
    /// opened. A shard that does not exist yet is only created by the first
    /// [`write_line`](Self::write_line), so failing to create it is reported there.
    pub fn create(directory: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        let directory = directory.as_ref();
        fs::create_dir_all(directory)
            .map_err(|e| DatasetError::io("create directory", directory, e))?;

        let layout = ShardLayout::new(directory, &options.shard_prefix, options.compression())?;
        let resume = layout.resume_point(options.max_shard_size)?;
        debug!(
            directory = %directory.display(),
            shard = resume.index,
            count = resume.count,
            "resuming sharded writer"
        );

        let mut writer = Self {
            layout,
            max_shard_size: options.max_shard_size,
            index: resume.index,
            count: resume.count,
            stream: None,
        };
        if writer.count > 0 {
            writer.open_stream()?;
        }
        Ok(writer)
    }

    /// Serialize `record` and append it to the current shard, rotating first when the
    /// shard is full.
    ///
    /// Serialization happens before anything else, so a record that cannot be
    /// serialized leaves the writer untouched. The record count only advances after
    /// the bytes were handed to the stream.
    ///
    /// # Errors
    /// [`DatasetError::Serialize`] for unserializable records; [`DatasetError::Io`]
    /// if rotating, opening or writing the shard fails.
    pub fn write_line<R: Serialize + ?Sized>(&mut self, record: &R) -> Result<()> {
        let payload = serde_json::to_vec(record).map_err(DatasetError::Serialize)?;
        if self.count >= self.max_shard_size {
            self.rotate()?;
        }
        let separate = self.count > 0;
        let written = append(self.stream()?, separate, &payload);
        written.map_err(|e| DatasetError::io("write", self.current_path(), e))?;
        self.count += 1;
        Ok(())
    }

    /// Flush buffered bytes of the current shard and sync them to disk.
    ///
    /// # Errors
    /// [`DatasetError::Io`] if flushing or syncing fails.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream
                .sync()
                .map_err(|e| DatasetError::io("flush", self.layout.path(self.index), e))?;
        }
        Ok(())
    }

    /// Finish and release the current shard.
    ///
    /// # Errors
    /// [`DatasetError::Io`] if the final flush fails.
    pub fn close(mut self) -> Result<()> {
        self.finish_stream()
    }

    /// Index of the shard the next record goes to (before any rotation it triggers).
    pub fn current_shard(&self) -> usize {
        self.index
    }

    /// Records in the current shard.
    pub fn samples_in_shard(&self) -> usize {
        self.count
    }

    pub fn current_path(&self) -> PathBuf {
        self.layout.path(self.index)
    }

    pub fn max_shard_size(&self) -> usize {
        self.max_shard_size
    }

    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    fn rotate(&mut self) -> Result<()> {
        self.finish_stream()?;
        self.index += 1;
        self.count = 0;
        debug!(shard = self.index, "rotating to new shard");
        self.open_stream()
    }

    fn open_stream(&mut self) -> Result<()> {
        self.stream = Some(open_appender(
            &self.current_path(),
            self.layout.compression(),
        )?);
        Ok(())
    }

    fn stream(&mut self) -> Result<&mut AppendStream> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => open_appender(&self.current_path(), self.layout.compression())?,
        };
        Ok(self.stream.insert(stream))
    }

    fn finish_stream(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            stream
                .finish()
                .map_err(|e| DatasetError::io("close", self.current_path(), e))?;
        }
        Ok(())
    }
}

impl Drop for ShardedWriter {
    fn drop(&mut self) {
        if let Err(err) = self.finish_stream() {
            warn!(error = %err, "failed to close shard on drop");
        }
    }
}

/// Separator and record go out in a single `write_all`.
fn append(stream: &mut impl Write, separate: bool, payload: &[u8]) -> io::Result<()> {
    if !separate {
        return stream.write_all(payload);
    }
    let mut framed = Vec::with_capacity(payload.len() + 1);
    framed.push(b'\n');
    framed.extend_from_slice(payload);
    stream.write_all(&framed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts `calls` write calls, then fails every later one.
    struct Budget {
        calls: usize,
        written: Vec<u8>,
    }

    impl Write for Budget {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.calls == 0 {
                return Err(io::Error::other("out of budget"));
            }
            self.calls -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn separator_and_record_are_written_together() {
        let mut sink = Budget {
            calls: 1,
            written: Vec::new(),
        };
        append(&mut sink, true, b"{\"a\":1}").unwrap();
        assert_eq!(sink.written, b"\n{\"a\":1}");

        // a failed append leaves no stray separator behind
        assert!(append(&mut sink, true, b"{\"b\":2}").is_err());
        assert_eq!(sink.written, b"\n{\"a\":1}");
    }

    #[test]
    fn first_record_has_no_separator() {
        let mut sink = Budget {
            calls: 1,
            written: Vec::new(),
        };
        append(&mut sink, false, b"1").unwrap();
        assert_eq!(sink.written, b"1");
    }
}
