//! Running a compiled pattern against real output.
//!
//! Fragments need lookaround, so matching goes through `fancy_regex`. Every
//! fragment is a self-contained regex, which allows matching incrementally:
//! the first `k` fragments form a valid program on their own.

use std::collections::BTreeMap;

use fancy_regex::Regex;
use itertools::Itertools;
use tracing::{Level, event};

use crate::syntax::tag_name_as_group_name;

use super::compiled::CompiledPattern;

/// Multi-line, dot-matches-newline.
pub const MATCH_FLAGS: &str = "(?ms)";

/// Errors from building or running a matcher.
#[derive(Debug)]
pub enum MatchError {
    Regex(fancy_regex::Error),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regex(e) => write!(f, "Failed to run the expected pattern: {e}"),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<fancy_regex::Error> for MatchError {
    fn from(e: fancy_regex::Error) -> Self {
        Self::Regex(e)
    }
}

/// Values captured by the named tags, keyed by tag name. A tag that took
/// part in an optional group that did not match maps to `None`.
pub type Captures = BTreeMap<String, Option<String>>;

/// How far the output follows the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialMatch {
    /// Number of leading fragments (anchors included) that match.
    pub fragments_matched: usize,
    /// Offset in the expected string of the first fragment that does not
    /// match; `None` when the whole pattern matches.
    pub failed_at: Option<usize>,
}

impl PartialMatch {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }
}

fn build(fragments: &[&str]) -> Result<Regex, MatchError> {
    let source = format!("{MATCH_FLAGS}{}", fragments.iter().join(""));
    Ok(Regex::new(&source)?)
}

/// A compiled pattern ready to be matched.
pub struct Matcher<'p> {
    pattern: &'p CompiledPattern,
    regex: Regex,
}

impl CompiledPattern {
    pub fn matcher(&self) -> Result<Matcher<'_>, MatchError> {
        Ok(Matcher {
            pattern: self,
            regex: build(&self.patterns())?,
        })
    }
}

impl Matcher<'_> {
    pub fn is_match(&self, output: &str) -> Result<bool, MatchError> {
        Ok(self.regex.is_match(output)?)
    }

    /// Named captures of a full match, or `None` if the output does not
    /// match.
    pub fn captures(&self, output: &str) -> Result<Option<Captures>, MatchError> {
        let Some(caps) = self.regex.captures(output)? else {
            return Ok(None);
        };
        let values = self
            .pattern
            .capture_names()
            .map(|name| {
                let value = caps
                    .name(&tag_name_as_group_name(name))
                    .map(|m| m.as_str().to_string());
                (name.to_string(), value)
            })
            .collect();
        Ok(Some(values))
    }

    /// Find the longest run of leading fragments that matches `output`.
    ///
    /// A match of `k` fragments implies a match of fewer, so the boundary is
    /// found by bisection.
    pub fn partial_match(&self, output: &str) -> Result<PartialMatch, MatchError> {
        let patterns = self.pattern.patterns();
        if self.regex.is_match(output)? {
            return Ok(PartialMatch {
                fragments_matched: patterns.len(),
                failed_at: None,
            });
        }

        let (mut lo, mut hi) = (0, patterns.len());
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if build(&patterns[..mid])?.is_match(output)? {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let failed_at = self.pattern.fragments().get(lo).map(|f| f.offset);
        event!(Level::DEBUG, matched = lo, ?failed_at, "partial match");
        Ok(PartialMatch {
            fragments_matched: lo,
            failed_at,
        })
    }
}
