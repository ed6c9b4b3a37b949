//! Token types produced by the tokenizer.

use serde::Serialize;

/// A piece of the expected string, with the character offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub offset: usize,
    pub kind: TokenKind,
    /// Source text of the token. Empty for `End` and `Warn`; for `Input` it
    /// is the text between the markers.
    pub text: String,
}

impl Token {
    pub fn new(offset: usize, kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            offset,
            kind,
            text: text.into(),
        }
    }

    /// Whitespace or newlines.
    pub fn is_space(&self) -> bool {
        matches!(self.kind, TokenKind::Wspaces | TokenKind::Newlines)
    }

    /// Text that is matched verbatim: literals or an input echo.
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Literals | TokenKind::Input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Newlines,
    Wspaces,
    Literals,
    Tag,
    Input,
    Warn(WarningKind),
    End,
}

/// Something suspicious the tokenizer noticed. Compilation carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// An input marker that does not close its line; it is read as literals.
    InputNotAtTheEnd,
    /// A capture tag inside an input marker; it is typed as-is.
    TagInsideInput,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputNotAtTheEnd => write!(f, "input-not-at-the-end"),
            Self::TagInsideInput => write!(f, "tag-inside-input"),
        }
    }
}

/// A warning as surfaced on a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub offset: usize,
    pub kind: WarningKind,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            WarningKind::InputNotAtTheEnd => write!(
                f,
                "input marker at character {} is not at the end of its line and will be matched literally",
                self.offset
            ),
            WarningKind::TagInsideInput => write!(
                f,
                "capture tag found inside an input marker near character {}",
                self.offset
            ),
        }
    }
}
