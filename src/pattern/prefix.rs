//! Sliding window over the literal fragments emitted since the last tag.
//!
//! Before an input can be typed, the driver must recognise enough of the
//! output that precedes it. The window tracks the most recent literal and
//! whitespace fragments and their weights; the prefix of an input is the
//! shortest run of newest fragments whose weight reaches the maximum, or the
//! whole window if it is lighter than that.

use std::collections::VecDeque;

use itertools::Itertools;

use crate::syntax::PrefixRange;

#[derive(Debug, Clone)]
struct Entry {
    offset: usize,
    pattern: String,
    weight: usize,
}

/// The synchronisation prefix chosen for an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    /// Offset of the oldest fragment in the prefix, if there is one.
    pub offset: Option<usize>,
    pub pattern: String,
    pub weight: usize,
}

#[derive(Debug, Default)]
pub struct PrefixWindow {
    entries: VecDeque<Entry>,
    weight: usize,
}

impl PrefixWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; a tag or an anchor breaks the literal context.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.weight = 0;
    }

    /// Record an emitted fragment, dropping the oldest ones that are no
    /// longer needed to reach `range.max()`.
    pub fn push(&mut self, offset: usize, pattern: &str, weight: usize, range: PrefixRange) {
        self.entries.push_back(Entry {
            offset,
            pattern: pattern.to_string(),
            weight,
        });
        self.weight += weight;
        self.trim(range.max());
    }

    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Drop oldest entries while the remainder still weighs at least `keep`.
    fn trim(&mut self, keep: usize) {
        while let Some(front) = self.entries.front() {
            if self.weight - front.weight < keep {
                break;
            }
            self.weight -= front.weight;
            self.entries.pop_front();
        }
    }

    /// The newest fragments, oldest dropped first, stopping as soon as the
    /// accumulated weight reaches `range.max()`. `None` if the whole window
    /// weighs less than `range.min()`.
    pub fn prefix(&self, range: PrefixRange) -> Option<Prefix> {
        if self.weight < range.min() {
            return None;
        }
        let mut weight = 0;
        let mut taken = 0;
        for entry in self.entries.iter().rev() {
            weight += entry.weight;
            taken += 1;
            if weight >= range.max() {
                break;
            }
        }
        let first = self.entries.len() - taken;
        let pattern = self.entries.range(first..).map(|e| &e.pattern).join("");
        Some(Prefix {
            offset: self.entries.get(first).map(|e| e.offset),
            pattern,
            weight,
        })
    }
}
