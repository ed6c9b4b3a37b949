//! The output of a compilation: regex fragments and their metadata.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use super::token::Warning;

/// One piece of the matching program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Character offset in the expected string this fragment comes from.
    pub offset: usize,
    /// Regex source.
    pub pattern: String,
    /// Guaranteed literal characters the fragment contributes.
    pub weight: usize,
    /// Whether emitting it cleared the input prefix window.
    pub resets_prefix: bool,
}

/// Text to type into an interactive session once `prefix` was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputRecord {
    /// Offset of the input marker.
    pub offset: usize,
    /// Regex source matching the output that precedes the input.
    pub prefix: String,
    pub text: String,
}

/// A compiled expected string.
///
/// The first fragment is always the `\A` anchor and the last one the
/// trailing whitespace (or newlines) anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledPattern {
    fragments: Vec<Fragment>,
    tags_by_idx: BTreeMap<usize, Option<String>>,
    inputs: Vec<InputRecord>,
    warnings: Vec<Warning>,
}

impl CompiledPattern {
    pub(crate) fn new(
        fragments: Vec<Fragment>,
        tags_by_idx: BTreeMap<usize, Option<String>>,
        inputs: Vec<InputRecord>,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            fragments,
            tags_by_idx,
            inputs,
            warnings,
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.pattern.as_str()).collect()
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.fragments.iter().map(|f| f.offset).collect()
    }

    pub fn weights(&self) -> Vec<usize> {
        self.fragments.iter().map(|f| f.weight).collect()
    }

    /// Tag name by fragment index; `None` for the anonymous tag.
    pub fn tags_by_idx(&self) -> &BTreeMap<usize, Option<String>> {
        &self.tags_by_idx
    }

    pub fn inputs(&self) -> &[InputRecord] {
        &self.inputs
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of fragments, anchors included.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The whole program as one regex source, without flags.
    pub fn source(&self) -> String {
        self.fragments.iter().map(|f| &f.pattern).join("")
    }

    /// Names of the named tags, in order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.tags_by_idx.values().flatten().map(String::as_str)
    }
}
