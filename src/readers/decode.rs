//! JSON decoding on top of a line stream.

use crate::error::{DatasetError, Result};
use serde::de::DeserializeOwned;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Parses each line of an underlying stream as a JSON record of type `T`.
///
/// - A malformed line (including an empty or whitespace-only one) fails with [`DatasetError::Decode`] and ends iteration, unless
///   `skip_on_error` is set, in which case it is dropped silently.
/// - Errors coming from the line stream itself always end iteration.
/// - With a `limit`, iteration stops after that many records; the underlying stream
///   is dropped at that point so any resources behind it are released early.
pub struct RecordDecoder<I, T> {
    lines: Option<I>,
    skip_on_error: bool,
    limit: Option<usize>,
    emitted: usize,
    _t: PhantomData<fn() -> T>,
}

impl<I, T> RecordDecoder<I, T>
where
    I: Iterator<Item = Result<String>>,
    T: DeserializeOwned,
{
    pub fn new(lines: I, skip_on_error: bool) -> Self {
        Self {
            lines: Some(lines),
            skip_on_error,
            limit: None,
            emitted: 0,
            _t: PhantomData,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        if limit == Some(0) {
            self.lines = None;
        }
        self
    }

    /// Records produced so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn stop(&mut self) {
        self.lines = None;
    }
}

impl<I, T> Iterator for RecordDecoder<I, T>
where
    I: Iterator<Item = Result<String>>,
    T: DeserializeOwned,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.as_mut()?.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    self.stop();
                    return Some(Err(err));
                }
                None => {
                    self.stop();
                    return None;
                }
            };
            match serde_json::from_str::<T>(&line) {
                Ok(record) => {
                    self.emitted += 1;
                    if self.limit.is_some_and(|limit| self.emitted >= limit) {
                        self.stop();
                    }
                    return Some(Ok(record));
                }
                Err(_) if self.skip_on_error => continue,
                Err(source) => {
                    self.stop();
                    return Some(Err(DatasetError::Decode { line, source }));
                }
            }
        }
    }
}

impl<I, T> FusedIterator for RecordDecoder<I, T>
where
    I: Iterator<Item = Result<String>>,
    T: DeserializeOwned,
{
}
