//! Lazy tokenizer for expected strings.
//!
//! Works one line at a time: a line body is split into whitespace runs,
//! literal runs and tags, with an input marker at the end of the line pulled
//! out first. Offsets are **character** (not byte) indices.

use std::collections::VecDeque;

use itertools::Itertools;
use tracing::{Level, event};

use crate::syntax::CompilerConfig;

use super::token::{Token, TokenKind, WarningKind};

/// Iterator over the tokens of an expected string. Always ends with exactly
/// one [`TokenKind::End`].
pub struct Tokenizer<'a> {
    config: &'a CompilerConfig,
    tags_enabled: bool,
    input_enabled: bool,
    /// Text not tokenized yet; `None` once the last line body was consumed.
    rest: Option<&'a str>,
    offset: usize,
    pending: VecDeque<Token>,
    ended: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(
        text: &'a str,
        config: &'a CompilerConfig,
        tags_enabled: bool,
        input_enabled: bool,
    ) -> Self {
        Self {
            config,
            tags_enabled,
            input_enabled,
            rest: Some(text),
            offset: 0,
            pending: VecDeque::new(),
            ended: false,
        }
    }

    /// Queue a token at the current offset and move past it.
    fn push(&mut self, kind: TokenKind, text: &str) {
        self.pending.push_back(Token::new(self.offset, kind, text));
        self.offset += text.chars().count();
    }

    fn warn(&mut self, offset: usize, kind: WarningKind) {
        self.pending
            .push_back(Token::new(offset, TokenKind::Warn(kind), ""));
    }

    /// Tokenize the next line body and the newline run that follows it.
    fn advance_line(&mut self) {
        let Some(rest) = self.rest else {
            self.pending
                .push_back(Token::new(self.offset, TokenKind::End, ""));
            self.ended = true;
            return;
        };
        match rest.find('\n') {
            Some(ix) => {
                let (body, tail) = rest.split_at(ix);
                self.tokenize_line(body);
                let after = tail.trim_start_matches('\n');
                let newlines = &tail[..tail.len() - after.len()];
                self.push(TokenKind::Newlines, newlines);
                self.rest = Some(after);
            }
            None => {
                self.tokenize_line(rest);
                self.rest = None;
            }
        }
    }

    fn tokenize_line(&mut self, line: &str) {
        let line_start = self.offset;
        let mut body = line;

        let mut trailing_input = None;
        if self.input_enabled {
            trailing_input = self.config.inputs.trailing_input(line);
            if let Some(input) = trailing_input {
                body = &line[..input.start];
            }
            if let Some(ix) = self.config.inputs.find(body) {
                self.warn(
                    line_start + body[..ix].chars().count(),
                    WarningKind::InputNotAtTheEnd,
                );
            }
        }

        let mut chars = body.chars().peekable();
        while let Some(&first) = chars.peek() {
            let space = first.is_whitespace();
            let run: String = chars
                .peeking_take_while(|c| c.is_whitespace() == space)
                .collect();
            if space {
                self.push(TokenKind::Wspaces, &run);
            } else {
                self.push_word(&run);
            }
        }

        if let Some(input) = trailing_input {
            if let Some(ix) = self.config.tags.find(input.input) {
                self.warn(
                    self.offset + input.input[..ix].chars().count(),
                    WarningKind::TagInsideInput,
                );
            }
            self.pending
                .push_back(Token::new(self.offset, TokenKind::Input, input.input));

            let line_end = line_start + line.chars().count();
            self.offset = line_end - input.trailing.chars().count();
            if !input.trailing.is_empty() {
                self.push(TokenKind::Wspaces, input.trailing);
            }
        }
    }

    /// Split a run of non-whitespace into literals and tags.
    fn push_word(&mut self, word: &str) {
        if !self.tags_enabled {
            self.push(TokenKind::Literals, word);
            return;
        }
        let tags: Vec<(usize, usize)> = self.config.tags.find_iter(word).collect();
        let mut last = 0;
        for (start, end) in tags {
            if start > last {
                self.push(TokenKind::Literals, &word[last..start]);
            }
            self.push(TokenKind::Tag, &word[start..end]);
            last = end;
        }
        if last < word.len() {
            self.push(TokenKind::Literals, &word[last..]);
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                if let TokenKind::Warn(kind) = token.kind {
                    event!(Level::TRACE, offset = token.offset, %kind, "tokenizer warning");
                }
                return Some(token);
            }
            if self.ended {
                return None;
            }
            self.advance_line();
        }
    }
}
