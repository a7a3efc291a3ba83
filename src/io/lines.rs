//! Lazy line iteration over a single shard file.

use crate::error::{DatasetError, Result};
use crate::io::compression::open_reader;
use std::io::{self, BufRead};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

/// A re-openable source of text lines for one shard file.
///
/// Each call to [`lines`](LineSource::lines) starts a fresh pass from the top of
/// the file, so iterating twice yields the same sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineSource {
    path: PathBuf,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a new pass over the file.
    ///
    /// Nothing is opened until the first call to `next`; an unreadable file shows
    /// up as the first item rather than here.
    pub fn lines(&self) -> Lines {
        Lines {
            path: self.path.clone(),
            state: State::Pending,
        }
    }
}

enum State {
    Pending,
    Reading(io::Lines<Box<dyn BufRead + Send>>),
    Finished,
}

/// Iterator over the UTF-8 lines of one file, terminators (`\n` or `\r\n`) stripped.
///
/// The first error ends the iteration.
pub struct Lines {
    path: PathBuf,
    state: State,
}

impl Lines {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for Lines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Pending => match open_reader(&self.path) {
                    Ok(reader) => self.state = State::Reading(reader.lines()),
                    Err(err) => {
                        self.state = State::Finished;
                        return Some(Err(err));
                    }
                },
                State::Reading(lines) => {
                    let next = lines.next();
                    return match next {
                        Some(Ok(line)) => Some(Ok(line)),
                        Some(Err(err)) => {
                            self.state = State::Finished;
                            Some(Err(DatasetError::io("read", &self.path, err)))
                        }
                        None => {
                            self.state = State::Finished;
                            None
                        }
                    };
                }
                State::Finished => return None,
            }
        }
    }
}

impl FusedIterator for Lines {}
