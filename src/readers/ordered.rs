//! Deterministic, single-threaded merges of several line sequences.
//!
//! - [`sequential`]: each source end-to-end, in the order given.
//! - [`RoundRobin`]: one item from every still-active source per round.
//!
//! Both are generic over any iterator, so they merge [`Lines`](crate::io::lines::Lines)
//! from shard files as readily as in-memory vectors. Errors are passed through as
//! ordinary items and never reordered.

use crate::io::lines::{LineSource, Lines};
use std::iter::FusedIterator;

/// Concatenate the lines of each source in the given order.
pub fn sequential(sources: Vec<LineSource>) -> impl Iterator<Item = crate::Result<String>> + Send {
    sources.into_iter().flat_map(|source| source.lines())
}

/// Round-robin interleaving of several iterators.
///
/// Every round visits the active iterators in their original order and takes one item
/// from each. An iterator that returns `None` is evicted on the spot and the round
/// continues with the next one, so line `j` of source `i` appears after line `j` of
/// every earlier source that has one, and before line `j` of every later source.
pub struct RoundRobin<I> {
    active: Vec<I>,
    cursor: usize,
}

impl<I: Iterator> RoundRobin<I> {
    pub fn new(iters: impl IntoIterator<Item = I>) -> Self {
        Self {
            active: iters.into_iter().collect(),
            cursor: 0,
        }
    }

    /// Number of sources not yet exhausted.
    pub fn active(&self) -> usize {
        self.active.len()
    }
}

impl RoundRobin<Lines> {
    /// Interleave the lines of shard files.
    pub fn from_sources(sources: Vec<LineSource>) -> Self {
        Self::new(sources.iter().map(LineSource::lines))
    }
}

impl<I: Iterator> Iterator for RoundRobin<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.active.is_empty() {
            if self.cursor >= self.active.len() {
                self.cursor = 0;
            }
            match self.active[self.cursor].next() {
                Some(item) => {
                    self.cursor += 1;
                    return Some(item);
                }
                // the next source slides into `cursor`
                None => {
                    self.active.remove(self.cursor);
                }
            }
        }
        None
    }
}

impl<I: Iterator> FusedIterator for RoundRobin<I> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_lengths_alternate() {
        let out: Vec<_> =
            RoundRobin::new(vec![vec!["a1", "a2"].into_iter(), vec!["b3", "b4"].into_iter()])
                .collect();
        assert_eq!(out, vec!["a1", "b3", "a2", "b4"]);
    }

    #[test]
    fn exhausted_sources_are_skipped() {
        let out: Vec<_> = RoundRobin::new(vec![
            vec![1, 2, 3, 4].into_iter(),
            vec![].into_iter(),
            vec![10].into_iter(),
            vec![20, 21, 22].into_iter(),
        ])
        .collect();
        assert_eq!(out, vec![1, 10, 20, 2, 21, 3, 22, 4]);
    }

    #[test]
    fn position_rule_holds_for_uneven_sources() {
        let lens = [3usize, 0, 5, 1, 2];
        let sources: Vec<_> = lens
            .iter()
            .enumerate()
            .map(|(i, &n)| (0..n).map(move |j| (i, j)).collect::<Vec<_>>().into_iter())
            .collect();
        let out: Vec<(usize, usize)> = RoundRobin::new(sources).collect();

        let mut expected = Vec::new();
        for j in 0..5 {
            for (i, &n) in lens.iter().enumerate() {
                if j < n {
                    expected.push((i, j));
                }
            }
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn no_sources_yields_nothing() {
        let mut rr = RoundRobin::new(Vec::<std::vec::IntoIter<u8>>::new());
        assert_eq!(rr.active(), 0);
        assert!(rr.next().is_none());
    }
}
