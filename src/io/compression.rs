//! Transparent gzip support for shard files.
//!
//! Reading detects compression from the file extension first and falls back to the
//! gzip magic bytes, so a compressed shard without a `.gz` suffix still decodes.
//! Writing never sniffs: the caller states the [`Compression`] it wants.
//!
//! ## Multi-member gzip
//! The sharded writer resumes a compressed shard by opening it in append mode and
//! starting a fresh gzip member. [`open_reader`] therefore decodes with
//! `MultiGzDecoder`, which reads every member rather than stopping after the first.
//!
//! ## Feature flag
//! Gzip requires the `compression-gzip` feature (on by default). Without it, opening
//! a compressed shard fails with [`DatasetError::Config`].

use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression applied to a shard file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Plain UTF-8 text.
    #[default]
    None,
    /// Gzip (`.gz`).
    Gzip,
}

impl Compression {
    /// Detect compression from the path's extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        if name.ends_with(".gz") || name.ends_with(".gzip") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    /// Shard file extension, without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Compression::None => "jsonl",
            Compression::Gzip => "jsonl.gz",
        }
    }
}

/// Peek at the head of the stream without consuming it.
fn starts_with_gzip_magic<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    let head = reader.fill_buf()?;
    Ok(head.starts_with(&GZIP_MAGIC))
}

/// Open `path` for line reading, decompressing when needed.
///
/// # Errors
/// [`DatasetError::Io`] if the file cannot be opened or its first block cannot be
/// read; [`DatasetError::Config`] for a gzip file when gzip support is compiled out.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| DatasetError::io("open", path, e))?;
    let mut reader = BufReader::new(file);

    let compression = match Compression::from_path(path) {
        Compression::None => {
            if starts_with_gzip_magic(&mut reader).map_err(|e| DatasetError::io("read", path, e))? {
                Compression::Gzip
            } else {
                Compression::None
            }
        }
        detected => detected,
    };

    match compression {
        Compression::None => Ok(Box::new(reader)),
        #[cfg(feature = "compression-gzip")]
        Compression::Gzip => Ok(Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(
            reader,
        )))),
        #[cfg(not(feature = "compression-gzip"))]
        Compression::Gzip => Err(gzip_disabled(path)),
    }
}

/// Open `path` for appending, creating it if absent.
///
/// # Errors
/// [`DatasetError::Io`] if the file cannot be opened; [`DatasetError::Config`] when
/// gzip is requested but compiled out.
pub fn open_appender(path: &Path, compression: Compression) -> Result<AppendStream> {
    #[cfg(not(feature = "compression-gzip"))]
    if compression == Compression::Gzip {
        return Err(gzip_disabled(path));
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DatasetError::io("open for append", path, e))?;
    let buffered = BufWriter::new(file);

    match compression {
        Compression::None => Ok(AppendStream::Plain(buffered)),
        #[cfg(feature = "compression-gzip")]
        Compression::Gzip => Ok(AppendStream::Gzip(flate2::write::GzEncoder::new(
            buffered,
            flate2::Compression::default(),
        ))),
        #[cfg(not(feature = "compression-gzip"))]
        Compression::Gzip => Err(gzip_disabled(path)),
    }
}

#[cfg(not(feature = "compression-gzip"))]
fn gzip_disabled(path: &Path) -> DatasetError {
    DatasetError::Config(format!(
        "'{}' is gzip-compressed but the `compression-gzip` feature is disabled",
        path.display()
    ))
}

/// Append-mode byte sink for one shard file.
pub enum AppendStream {
    Plain(BufWriter<File>),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::write::GzEncoder<BufWriter<File>>),
}

impl AppendStream {
    fn file_mut(&mut self) -> &mut File {
        match self {
            AppendStream::Plain(w) => w.get_mut(),
            #[cfg(feature = "compression-gzip")]
            AppendStream::Gzip(w) => w.get_mut().get_mut(),
        }
    }

    /// Flush every buffer layer and sync the file's data to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.file_mut().sync_data()
    }

    /// Write any compression trailer and flush. Consumes the stream.
    pub fn finish(self) -> io::Result<()> {
        match self {
            AppendStream::Plain(mut w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            AppendStream::Gzip(w) => w.finish()?.flush(),
        }
    }
}

impl Write for AppendStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            AppendStream::Plain(w) => w.write(buf),
            #[cfg(feature = "compression-gzip")]
            AppendStream::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            AppendStream::Plain(w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            AppendStream::Gzip(w) => w.flush(),
        }
    }
}
