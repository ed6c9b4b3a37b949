//! State machine compiler from expected strings to regex fragments.
//!
//! The machine reads one token at a time, keeping the tokens it cannot turn
//! into fragments yet in a small [`Stash`]. The transition tables live in
//! [`norm_ws`](super::norm_ws) and [`literal_ws`](super::literal_ws); this
//! module holds the state shared by both and the emission primitives.

use std::collections::{BTreeMap, HashSet};

use tracing::{Level, event};

use crate::syntax::{CompilerConfig, tag_name_as_group_name};

use super::compiled::{CompiledPattern, Fragment, InputRecord};
use super::prefix::PrefixWindow;
use super::stash::Stash;
use super::token::{Token, TokenKind, Warning};
use super::tokenizer::Tokenizer;

/// Errors that abort a compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Two capture tags with nothing between them.
    AmbiguousTags { offset: usize },
    /// The same capture name used twice.
    DuplicateName { name: String, offset: usize },
    /// Not enough literal text before an input marker.
    InsufficientPrefix {
        offset: usize,
        weight: usize,
        min: usize,
    },
    /// The machine was driven past its terminal state or ran out of tokens.
    Internal(&'static str),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmbiguousTags { offset } => write!(
                f,
                "Two consecutive capture tags were found at character {offset}. This is ambiguous."
            ),
            Self::DuplicateName { name, offset } => write!(
                f,
                "The same capture tag cannot be used twice and '{name}' is repeated at character {offset}."
            ),
            Self::InsufficientPrefix {
                offset,
                weight,
                min,
            } => write!(
                f,
                "There are too few characters before the input tag at character {offset} to proceed \
                 ({weight} found, at least {min} needed)."
            ),
            Self::Internal(msg) => write!(f, "Internal compiler error: {msg}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// How whitespace in the expected string is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespacePolicy {
    /// Any whitespace run matches any non-empty whitespace run.
    Normalize,
    /// Spacing is matched as written; only newline runs are special.
    #[default]
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Init,
    Ws,
    Lit,
    Tag,
    WsTag,
    End,
    Exhausted,
    Error,
}

/// What surrounds a tag; decides the shape of its fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TagContext {
    Bare,
    LeftWs,
    RightWs,
    BothWs,
    Newline,
}

/// What the final anchor tolerates at the end of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EndAnchor {
    Whitespace,
    Newlines,
}

/// Mutable state of one compilation.
#[derive(Debug)]
pub(super) struct Machine {
    pub(super) state: State,
    pub(super) stash: Stash,
    fragments: Vec<Fragment>,
    tags_by_idx: BTreeMap<usize, Option<String>>,
    group_names: HashSet<String>,
    window: PrefixWindow,
    inputs: Vec<InputRecord>,
    warnings: Vec<Warning>,
}

impl Machine {
    fn new() -> Self {
        let mut machine = Self {
            state: State::Init,
            stash: Stash::new(),
            fragments: Vec::new(),
            tags_by_idx: BTreeMap::new(),
            group_names: HashSet::new(),
            window: PrefixWindow::new(),
            inputs: Vec::new(),
            warnings: Vec::new(),
        };
        machine.reset();
        machine
    }

    fn reset(&mut self) {
        self.state = State::Init;
        self.stash.clear();
        self.fragments.clear();
        self.tags_by_idx.clear();
        self.group_names.clear();
        self.window.clear();
        self.inputs.clear();
        self.warnings.clear();
        self.fragments.push(Fragment {
            offset: 0,
            pattern: r"\A".to_string(),
            weight: 0,
            resets_prefix: true,
        });
    }

    pub(super) fn ended(&self) -> bool {
        matches!(self.state, State::Exhausted | State::Error)
    }

    fn take_result(&mut self) -> CompiledPattern {
        CompiledPattern::new(
            std::mem::take(&mut self.fragments),
            std::mem::take(&mut self.tags_by_idx),
            std::mem::take(&mut self.inputs),
            std::mem::take(&mut self.warnings),
        )
    }

    pub(super) fn pull(&mut self) -> Result<Token, CompileError> {
        self.stash
            .pop_front()
            .ok_or(CompileError::Internal("lookahead buffer is empty"))
    }

    pub(super) fn drop_last(&mut self) -> Result<Token, CompileError> {
        self.stash
            .pop_back()
            .ok_or(CompileError::Internal("lookahead buffer is empty"))
    }

    fn emit(
        &mut self,
        offset: usize,
        pattern: String,
        weight: usize,
        resets_prefix: bool,
        cfg: &CompilerConfig,
    ) {
        if resets_prefix {
            self.window.clear();
        } else {
            self.window.push(offset, &pattern, weight, cfg.prefix_range);
        }
        event!(
            Level::DEBUG,
            index = self.fragments.len(),
            offset,
            weight,
            pattern = pattern.as_str(),
            "emit fragment"
        );
        self.fragments.push(Fragment {
            offset,
            pattern,
            weight,
            resets_prefix,
        });
    }

    /// Emit the oldest buffered token as an escaped literal.
    pub(super) fn emit_literals(&mut self, cfg: &CompilerConfig) -> Result<(), CompileError> {
        let token = self.pull()?;
        let pattern = fancy_regex::escape(&token.text).into_owned();
        let weight = token.text.chars().count();
        self.emit(token.offset, pattern, weight, false, cfg);
        Ok(())
    }

    /// Emit the oldest buffered token, a whitespace run, as a generic
    /// whitespace matcher. `just_one` is used before a tag that may match
    /// empty and absorbs the rest of the run itself.
    pub(super) fn emit_ws(
        &mut self,
        just_one: bool,
        cfg: &CompilerConfig,
    ) -> Result<(), CompileError> {
        let token = self.pull()?;
        let pattern = if just_one { r"\s" } else { r"\s+(?!\s)" };
        self.emit(token.offset, pattern.to_string(), 1, false, cfg);
        Ok(())
    }

    /// Emit the oldest buffered token, a capture tag.
    ///
    /// Tags are lazy unless anonymous and at the end of a line: those are
    /// expected to swallow long unwanted output.
    pub(super) fn emit_tag(
        &mut self,
        ctx: TagContext,
        endline: bool,
        cfg: &CompilerConfig,
    ) -> Result<(), CompileError> {
        let token = self.pull()?;
        let name = cfg
            .tags
            .name_of(&token.text)
            .ok_or(CompileError::Internal("capture tag without a name"))?;
        let name = (!cfg.ellipsis_marker.is(name)).then(|| name.to_string());

        let capture = match &name {
            Some(name) => {
                let group = tag_name_as_group_name(name);
                if !self.group_names.insert(group.clone()) {
                    return Err(CompileError::DuplicateName {
                        name: name.clone(),
                        offset: token.offset,
                    });
                }
                format!("?P<{group}>")
            }
            None => "?:".to_string(),
        };
        let lazy = if name.is_none() && endline { "" } else { "?" };

        let pattern = match ctx {
            TagContext::Bare | TagContext::LeftWs => format!("({capture}.*{lazy})"),
            TagContext::RightWs => format!(r"({capture}.*{lazy})(?<!\s)"),
            TagContext::BothWs => format!(r"(?:\s*(?!\s)({capture}.+{lazy})(?<!\s))?"),
            TagContext::Newline => format!(r"(?:({capture}.+{lazy})(?<!\n))?"),
        };

        self.tags_by_idx.insert(self.fragments.len(), name);
        self.emit(token.offset, pattern, 0, true, cfg);
        Ok(())
    }

    /// Emit the final anchor for the end token at the front of the stash.
    pub(super) fn emit_eof(
        &mut self,
        anchor: EndAnchor,
        cfg: &CompilerConfig,
    ) -> Result<(), CompileError> {
        let token = self.pull()?;
        let pattern = match anchor {
            EndAnchor::Whitespace => r"\s*\z",
            EndAnchor::Newlines => r"\n*\z",
        };
        self.emit(token.offset, pattern.to_string(), 0, true, cfg);
        Ok(())
    }

    /// Schedule the oldest buffered token, an input, for typing.
    ///
    /// The token goes back to the stash as a literal: the session echoes
    /// what is typed, so the echo is expected in the output.
    pub(super) fn emit_input(&mut self, cfg: &CompilerConfig) -> Result<(), CompileError> {
        let token = self.pull()?;
        let min = cfg.prefix_range.min();
        let Some(prefix) = self.window.prefix(cfg.prefix_range) else {
            return Err(CompileError::InsufficientPrefix {
                offset: token.offset,
                weight: self.window.weight(),
                min,
            });
        };
        event!(
            Level::DEBUG,
            offset = token.offset,
            prefix = prefix.pattern.as_str(),
            prefix_offset = ?prefix.offset,
            prefix_weight = prefix.weight,
            input = token.text.as_str(),
            "schedule input"
        );
        self.inputs.push(InputRecord {
            offset: token.offset,
            prefix: prefix.pattern,
            text: token.text.clone(),
        });
        self.stash.push(Token::new(token.offset, TokenKind::Literals, token.text));
        Ok(())
    }

    /// Reject the second of two adjacent tags; the first one is the oldest
    /// tag in the stash.
    pub(super) fn reject_double_tag(&mut self) -> Result<(), CompileError> {
        let offset = self
            .stash
            .peek()
            .map(|first| first.offset)
            .ok_or(CompileError::Internal("lookahead buffer is empty"))?;
        self.stash.clear();
        Err(CompileError::AmbiguousTags { offset })
    }

    fn warn(&mut self, warning: Warning) {
        event!(Level::WARN, offset = warning.offset, kind = %warning.kind, "{warning}");
        self.warnings.push(warning);
    }
}

/// Compiles expected strings under one configuration and whitespace policy.
///
/// A compiler is reset at the start of every [`parse`](Self::parse), so it
/// can be reused for any number of strings, one at a time.
#[derive(Debug)]
pub struct Compiler {
    config: CompilerConfig,
    policy: WhitespacePolicy,
    machine: Machine,
}

impl Compiler {
    pub fn new(policy: WhitespacePolicy, config: CompilerConfig) -> Self {
        Self {
            config,
            policy,
            machine: Machine::new(),
        }
    }

    /// Compiler with the normalizing whitespace policy.
    pub fn normalizing(config: CompilerConfig) -> Self {
        Self::new(WhitespacePolicy::Normalize, config)
    }

    /// Compiler with the literal whitespace policy.
    pub fn literal(config: CompilerConfig) -> Self {
        Self::new(WhitespacePolicy::Literal, config)
    }

    /// Clear all state left by a previous compilation.
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Compile `expected`. With `tags_enabled` false, tags are literals;
    /// with `input_enabled` false, input markers are literals.
    pub fn parse(
        &mut self,
        expected: &str,
        tags_enabled: bool,
        input_enabled: bool,
    ) -> Result<CompiledPattern, CompileError> {
        self.reset();
        let expected = match self.policy {
            WhitespacePolicy::Normalize => expected,
            WhitespacePolicy::Literal => expected.trim_end_matches('\n'),
        };

        let mut tokens = Tokenizer::new(expected, &self.config, tags_enabled, input_enabled);
        while !self.machine.ended() {
            let token = tokens.next();
            if let Some(Token {
                offset,
                kind: TokenKind::Warn(kind),
                ..
            }) = token
            {
                self.machine.warn(Warning { offset, kind });
                continue;
            }

            let stream_done = token.is_none();
            let step = match self.policy {
                WhitespacePolicy::Normalize => self.machine.feed_normalized(token, &self.config),
                WhitespacePolicy::Literal => self.machine.feed_literal(token, &self.config),
            };
            if let Err(e) = step {
                self.machine.state = State::Error;
                event!(Level::DEBUG, error = %e, "compilation failed");
                return Err(e);
            }
            if stream_done && !self.machine.ended() {
                self.machine.state = State::Error;
                return Err(CompileError::Internal("token stream ended early"));
            }
        }
        Ok(self.machine.take_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CompilerConfig {
        CompilerConfig::default()
    }

    fn machine_with(tokens: &[(usize, TokenKind, &str)]) -> Machine {
        let mut machine = Machine::new();
        for &(offset, kind, text) in tokens {
            machine.stash.push(Token::new(offset, kind, text));
        }
        machine
    }

    fn last_pattern(machine: &Machine) -> &str {
        machine.fragments.last().map(|f| f.pattern.as_str()).unwrap_or("")
    }

    #[test]
    fn literals_are_escaped() {
        let cfg = config();
        let mut m = machine_with(&[(1, TokenKind::Literals, "zaz+")]);
        m.emit_literals(&cfg).unwrap();
        let f = m.fragments.last().unwrap();
        assert_eq!(f.pattern, r"zaz\+");
        assert_eq!(f.weight, 4);
        assert_eq!(f.offset, 1);
    }

    #[test]
    fn tag_shapes_by_context() {
        let cfg = config();
        let cases = [
            ("<...>", TagContext::Bare, false, "(?:.*?)"),
            ("<foo-bar>", TagContext::Bare, false, "(?P<foo_bar>.*?)"),
            ("<bar>", TagContext::LeftWs, false, "(?P<bar>.*?)"),
            ("<baz>", TagContext::RightWs, false, r"(?P<baz>.*?)(?<!\s)"),
            ("<zaz>", TagContext::Newline, false, r"(?:(?P<zaz>.+?)(?<!\n))?"),
            ("<sax>", TagContext::BothWs, false, r"(?:\s*(?!\s)(?P<sax>.+?)(?<!\s))?"),
            ("<...>", TagContext::Bare, true, "(?:.*)"),
            ("<named>", TagContext::Bare, true, "(?P<named>.*?)"),
        ];
        for (tag, ctx, endline, expected) in cases {
            let mut m = machine_with(&[(0, TokenKind::Tag, tag)]);
            m.emit_tag(ctx, endline, &cfg).unwrap();
            assert_eq!(last_pattern(&m), expected, "tag {tag} in {ctx:?}");
            assert_eq!(m.fragments.last().unwrap().weight, 0);
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let cfg = config();
        let mut m = machine_with(&[(5, TokenKind::Tag, "<sax>"), (6, TokenKind::Tag, "<sax>")]);
        m.emit_tag(TagContext::Bare, false, &cfg).unwrap();
        let err = m.emit_tag(TagContext::Bare, false, &cfg).unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateName {
                name: "sax".to_string(),
                offset: 6
            }
        );
    }

    #[test]
    fn anonymous_tags_can_repeat() {
        let cfg = config();
        let mut m = machine_with(&[(0, TokenKind::Tag, "<...>"), (9, TokenKind::Tag, "<...>")]);
        m.emit_tag(TagContext::Bare, false, &cfg).unwrap();
        m.emit_tag(TagContext::Bare, false, &cfg).unwrap();
        assert_eq!(m.tags_by_idx.values().filter(|n| n.is_none()).count(), 2);
    }

    #[test]
    fn eof_anchors() {
        let cfg = config();
        let mut m = machine_with(&[(0, TokenKind::End, "")]);
        m.emit_eof(EndAnchor::Whitespace, &cfg).unwrap();
        assert_eq!(last_pattern(&m), r"\s*\z");

        let mut m = machine_with(&[(0, TokenKind::End, "")]);
        m.emit_eof(EndAnchor::Newlines, &cfg).unwrap();
        assert_eq!(last_pattern(&m), r"\n*\z");
    }

    #[test]
    fn inputs_need_a_prefix_and_are_echoed() {
        let cfg = config();
        let mut m = machine_with(&[(0, TokenKind::Literals, "username:")]);
        m.emit_literals(&cfg).unwrap();

        m.stash.push(Token::new(9, TokenKind::Input, "jdoe"));
        m.emit_input(&cfg).unwrap();
        assert_eq!(m.inputs.len(), 1);
        assert_eq!(m.inputs[0].prefix, "username:");
        assert_eq!(m.inputs[0].text, "jdoe");

        m.emit_literals(&cfg).unwrap();
        assert_eq!(last_pattern(&m), "jdoe");
        assert_eq!(m.fragments.last().unwrap().offset, 9);
    }

    #[test]
    fn a_tag_breaks_the_prefix() {
        let cfg = config();
        let mut m = machine_with(&[(0, TokenKind::Literals, "username:")]);
        m.emit_literals(&cfg).unwrap();
        m.stash.push(Token::new(9, TokenKind::Tag, "<...>"));
        m.emit_tag(TagContext::Bare, false, &cfg).unwrap();
        m.stash.push(Token::new(14, TokenKind::Literals, "pas"));
        m.emit_literals(&cfg).unwrap();

        m.stash.push(Token::new(17, TokenKind::Input, "admin123"));
        let err = m.emit_input(&cfg).unwrap_err();
        assert_eq!(
            err,
            CompileError::InsufficientPrefix {
                offset: 17,
                weight: 3,
                min: 6
            }
        );
    }

    #[test]
    fn prefixes_are_rebuilt_after_a_failure() {
        let cfg = config();
        let mut m = machine_with(&[(0, TokenKind::Literals, "username:")]);
        m.emit_literals(&cfg).unwrap();
        m.stash.push(Token::new(9, TokenKind::Input, "jdoe"));
        m.emit_input(&cfg).unwrap();
        m.emit_literals(&cfg).unwrap();

        m.stash.push(Token::new(1, TokenKind::Tag, "<...>"));
        m.emit_tag(TagContext::Bare, false, &cfg).unwrap();
        m.stash.push(Token::new(1, TokenKind::Literals, "pas"));
        m.emit_literals(&cfg).unwrap();
        m.stash.push(Token::new(4, TokenKind::Input, "admin123"));
        assert!(m.emit_input(&cfg).is_err());

        for (offset, text) in [(4, "sw"), (6, "ord:")] {
            m.stash.push(Token::new(offset, TokenKind::Literals, text));
            m.emit_literals(&cfg).unwrap();
        }
        m.stash.push(Token::new(10, TokenKind::Input, "admin123"));
        m.emit_input(&cfg).unwrap();
        m.emit_literals(&cfg).unwrap();

        // Longer prefixes keep only the newest fragments reaching the maximum.
        m.stash.push(Token::new(1, TokenKind::Tag, "<...>"));
        m.emit_tag(TagContext::Bare, false, &cfg).unwrap();
        for (offset, text) in [(1, "What is"), (8, "your real"), (17, " name?")] {
            m.stash.push(Token::new(offset, TokenKind::Literals, text));
            m.emit_literals(&cfg).unwrap();
        }
        m.stash.push(Token::new(22, TokenKind::Input, "john doe"));
        m.emit_input(&cfg).unwrap();

        let inputs: Vec<_> = m
            .inputs
            .iter()
            .map(|i| (i.prefix.as_str(), i.text.as_str()))
            .collect();
        assert_eq!(
            inputs,
            [
                ("username:", "jdoe"),
                ("password:", "admin123"),
                (r"your real name\?", "john doe")
            ]
        );
    }

    #[test]
    fn first_fragment_is_the_start_anchor() {
        let m = Machine::new();
        assert_eq!(m.fragments.len(), 1);
        assert_eq!(m.fragments[0].pattern, r"\A");
        assert!(m.fragments[0].resets_prefix);
    }
}
