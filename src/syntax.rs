//! Lexical rules for capture tags and input markers, and the compiler
//! configuration built from them.
//!
//! The compiler is parametric over the surface syntax: a [`TagSyntax`] is any
//! regex with a `name` group, an [`InputSyntax`] is a pair of regexes with an
//! `input` group (and a `trailing` group for the end-of-line form).

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters allowed in a tag name. The first one cannot be a digit or `-`.
const TAG_NAME_PATTERN: &str = r"[A-Za-z.][A-Za-z0-9:.-]*";

/// Spelling of the anonymous (non-binding) capture tag name.
pub const DEFAULT_ELLIPSIS_MARKER: &str = "...";

/// Errors raised while building a [`CompilerConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidRegex(regex::Error),
    MissingGroup {
        rule: &'static str,
        group: &'static str,
    },
    InvalidPrefixRange {
        min: usize,
        max: usize,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegex(e) => write!(f, "Invalid lexical rule: {e}"),
            Self::MissingGroup { rule, group } => {
                write!(f, "The {rule} rule must define a group named '{group}'")
            }
            Self::InvalidPrefixRange { min, max } => write!(
                f,
                "Invalid input prefix range: the minimum ({min}) is greater than the maximum ({max})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<regex::Error> for ConfigError {
    fn from(e: regex::Error) -> Self {
        Self::InvalidRegex(e)
    }
}

fn has_group(regex: &Regex, group: &str) -> bool {
    regex.capture_names().flatten().any(|n| n == group)
}

/// Build one of the stock rules. The patterns are constants, so failing here
/// is a bug in this file.
fn stock_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(r) => r,
        Err(e) => panic!("'{pattern}' is not a valid regular expression: {e}"),
    }
}

/// Map a tag name onto a valid regex group name: every character that is
/// not alphanumeric becomes `_`.
pub fn tag_name_as_group_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Recognizer for capture tags such as `<name>` or `<...>`.
#[derive(Debug, Clone)]
pub struct TagSyntax {
    regex: Regex,
}

impl TagSyntax {
    /// Tags delimited by `open` and `close`, e.g. `TagSyntax::new('<', '>')`.
    pub fn new(open: char, close: char) -> Result<Self, ConfigError> {
        let pattern = format!(
            "{}(?P<name>{TAG_NAME_PATTERN}){}",
            regex::escape(&open.to_string()),
            regex::escape(&close.to_string()),
        );
        Self::from_regex(Regex::new(&pattern)?)
    }

    /// Use a custom rule. The whole match is the tag; the `name` group is its
    /// name.
    pub fn from_regex(regex: Regex) -> Result<Self, ConfigError> {
        if !has_group(&regex, "name") {
            return Err(ConfigError::MissingGroup {
                rule: "capture tag",
                group: "name",
            });
        }
        Ok(Self { regex })
    }

    /// Byte ranges of every tag found in `text`, left to right.
    pub fn find_iter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.regex.find_iter(text).map(|m| (m.start(), m.end()))
    }

    /// Byte offset of the first tag in `text`.
    pub fn find(&self, text: &str) -> Option<usize> {
        self.regex.find(text).map(|m| m.start())
    }

    /// Name of the tag `tag`, which must be a complete tag.
    pub fn name_of<'t>(&self, tag: &'t str) -> Option<&'t str> {
        let caps = self.regex.captures(tag)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != tag.len() {
            return None;
        }
        caps.name("name").map(|m| m.as_str())
    }
}

impl Default for TagSyntax {
    fn default() -> Self {
        Self {
            regex: stock_regex(&format!("<(?P<name>{TAG_NAME_PATTERN})>")),
        }
    }
}

/// An input marker found at the end of a line body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingInput<'t> {
    /// Byte offset of the marker within the line body.
    pub start: usize,
    /// Text between the markers.
    pub input: &'t str,
    /// Spacing between the closing marker and the end of the line.
    pub trailing: &'t str,
}

/// Recognizer for input markers such as `[text]`.
#[derive(Debug, Clone)]
pub struct InputSyntax {
    check: Regex,
    capture: Regex,
}

impl InputSyntax {
    /// Inputs delimited by `open` and `close`; `\` escapes a `close` inside.
    pub fn new(open: char, close: char) -> Result<Self, ConfigError> {
        let (check, capture) = Self::patterns(open, close);
        Self::from_regexes(Regex::new(&check)?, Regex::new(&capture)?)
    }

    /// Use custom rules. `check` finds an input anywhere in a line; `capture`
    /// must only match an input at the end of a line and define the `input`
    /// and `trailing` groups.
    pub fn from_regexes(check: Regex, capture: Regex) -> Result<Self, ConfigError> {
        for group in ["input", "trailing"] {
            if !has_group(&capture, group) {
                return Err(ConfigError::MissingGroup {
                    rule: "input marker",
                    group,
                });
            }
        }
        Ok(Self { check, capture })
    }

    fn patterns(open: char, close: char) -> (String, String) {
        let open = regex::escape(&open.to_string());
        let close = regex::escape(&close.to_string());
        let check = format!(r"{open}(?P<input>[^{close}\\]*(?:\\.[^{close}\\]*)*){close}");
        let capture = format!(r"{check}(?P<trailing>[ ]*)$");
        (check, capture)
    }

    /// Byte offset of the first input-shaped span in `line`.
    pub fn find(&self, line: &str) -> Option<usize> {
        self.check.find(line).map(|m| m.start())
    }

    /// The input marker closing `line`, if any.
    pub fn trailing_input<'t>(&self, line: &'t str) -> Option<TrailingInput<'t>> {
        let caps = self.capture.captures(line)?;
        let whole = caps.get(0)?;
        Some(TrailingInput {
            start: whole.start(),
            input: caps.name("input").map_or("", |m| m.as_str()),
            trailing: caps.name("trailing").map_or("", |m| m.as_str()),
        })
    }
}

impl Default for InputSyntax {
    fn default() -> Self {
        let (check, capture) = Self::patterns('[', ']');
        Self {
            check: stock_regex(&check),
            capture: stock_regex(&capture),
        }
    }
}

/// Bounds on the weight of the literal text that must precede an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRange {
    min: usize,
    max: usize,
}

impl PrefixRange {
    pub fn new(min: usize, max: usize) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidPrefixRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for PrefixRange {
    fn default() -> Self {
        Self { min: 6, max: 12 }
    }
}

/// Everything a [`Compiler`](crate::Compiler) needs besides the expected
/// string itself.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    pub tags: TagSyntax,
    pub inputs: InputSyntax,
    pub ellipsis_marker: EllipsisMarker,
    pub prefix_range: PrefixRange,
}

/// The tag name that captures without binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EllipsisMarker(pub String);

impl EllipsisMarker {
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl Default for EllipsisMarker {
    fn default() -> Self {
        Self(DEFAULT_ELLIPSIS_MARKER.to_string())
    }
}
