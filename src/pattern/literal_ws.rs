//! Transitions of the literal whitespace policy.
//!
//! Spacing is matched character for character, so whitespace and newlines
//! are literals like any other text. Only tags need a state of their own.

use tracing::{Level, event};

use crate::syntax::CompilerConfig;

use super::compiler::{CompileError, EndAnchor, Machine, State, TagContext};
use super::token::{Token, TokenKind};

impl Machine {
    pub(super) fn feed_literal(
        &mut self,
        token: Option<Token>,
        cfg: &CompilerConfig,
    ) -> Result<(), CompileError> {
        let Some(token) = token else {
            if self.state != State::End {
                return Err(CompileError::Internal("tokens ran out before the end marker"));
            }
            self.emit_eof(EndAnchor::Newlines, cfg)?;
            self.state = State::Exhausted;
            return Ok(());
        };

        let kind = token.kind;
        let is_text = token.is_space() || token.is_literal();
        let endline = kind == TokenKind::Newlines;
        self.stash.push(token);

        let next = match self.state {
            State::Init => match kind {
                _ if is_text => State::Lit,
                TokenKind::Tag => State::Tag,
                TokenKind::End => State::End,
                _ => return Err(CompileError::Internal("unexpected token")),
            },
            State::Lit => match kind {
                _ if is_text => {
                    self.emit_literals(cfg)?;
                    State::Lit
                }
                TokenKind::Tag => {
                    self.emit_literals(cfg)?;
                    State::Tag
                }
                TokenKind::End => {
                    self.emit_literals(cfg)?;
                    State::End
                }
                _ => return Err(CompileError::Internal("unexpected token")),
            },
            State::Tag => match kind {
                _ if is_text => {
                    self.emit_tag(TagContext::Bare, endline, cfg)?;
                    State::Lit
                }
                TokenKind::Tag => return self.reject_double_tag(),
                TokenKind::End => {
                    self.emit_tag(TagContext::Newline, true, cfg)?;
                    State::End
                }
                _ => return Err(CompileError::Internal("unexpected token")),
            },
            State::Ws | State::WsTag => {
                return Err(CompileError::Internal("whitespace state under the literal policy"));
            }
            State::End | State::Exhausted | State::Error => {
                return Err(CompileError::Internal("token after the end marker"));
            }
        };

        event!(Level::TRACE, from = ?self.state, to = ?next, ?kind, "transition");
        self.state = next;

        if kind == TokenKind::Input {
            self.emit_input(cfg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pattern::{CompileError, Compiler};
    use crate::syntax::CompilerConfig;

    fn compiler() -> Compiler {
        Compiler::literal(CompilerConfig::default())
    }

    #[test]
    fn tags_between_literals() {
        let compiled = compiler().parse("a<foo>b<b-b>c<...>d", true, true).unwrap();
        assert_eq!(
            compiled.patterns(),
            [
                r"\A",
                "a",
                "(?P<foo>.*?)",
                "b",
                "(?P<b_b>.*?)",
                "c",
                "(?:.*?)",
                "d",
                r"\n*\z"
            ]
        );
        assert_eq!(compiled.offsets(), [0, 0, 1, 6, 7, 12, 13, 18, 19]);
        assert_eq!(compiled.weights(), [0, 1, 0, 1, 0, 1, 0, 1, 0]);
        let tags: Vec<_> = compiled
            .tags_by_idx()
            .iter()
            .map(|(i, n)| (*i, n.as_deref()))
            .collect();
        assert_eq!(tags, [(2, Some("foo")), (4, Some("b-b")), (6, None)]);
    }

    #[test]
    fn fragments_split_on_newlines() {
        let compiled = compiler()
            .parse("a\n<foo>bcd\nefg<bar>hi", true, true)
            .unwrap();
        assert_eq!(
            compiled.patterns(),
            [
                r"\A",
                "a",
                "\n",
                "(?P<foo>.*?)",
                "bcd",
                "\n",
                "efg",
                "(?P<bar>.*?)",
                "hi",
                r"\n*\z"
            ]
        );
        assert_eq!(compiled.weights(), [0, 1, 1, 0, 3, 1, 3, 0, 2, 0]);
    }

    #[test]
    fn spaces_are_literal() {
        let compiled = compiler().parse("a  b", true, true).unwrap();
        assert_eq!(compiled.patterns(), [r"\A", "a", "  ", "b", r"\n*\z"]);
        assert_eq!(compiled.weights(), [0, 1, 2, 1, 0]);
    }

    #[test]
    fn anonymous_tag_before_a_newline_is_greedy() {
        let compiled = compiler().parse("a<...>\nb<...>c", true, true).unwrap();
        assert_eq!(
            compiled.patterns(),
            [r"\A", "a", "(?:.*)", "\n", "b", "(?:.*?)", "c", r"\n*\z"]
        );
    }

    #[test]
    fn consecutive_tags_are_ambiguous() {
        assert_eq!(
            compiler().parse("a<foo><bar>c", true, true),
            Err(CompileError::AmbiguousTags { offset: 1 })
        );
    }

    #[test]
    fn repeated_names_are_rejected() {
        assert_eq!(
            compiler().parse("a<foo>b<foo>c", true, true),
            Err(CompileError::DuplicateName {
                name: "foo".to_string(),
                offset: 7
            })
        );
    }

    #[test]
    fn tags_disabled() {
        let compiled = compiler().parse("a<foo>b<bar>c", false, true).unwrap();
        assert_eq!(compiled.patterns(), [r"\A", "a<foo>b<bar>c", r"\n*\z"]);
        assert!(compiled.tags_by_idx().is_empty());
    }

    #[test]
    fn trailing_newlines_are_ignored() {
        let compiled = compiler().parse("<foo>\n\n\n", true, true).unwrap();
        assert_eq!(
            compiled.patterns(),
            [r"\A", r"(?:(?P<foo>.+?)(?<!\n))?", r"\n*\z"]
        );

        let compiled = compiler().parse("\n<foo>", true, true).unwrap();
        assert_eq!(
            compiled.patterns(),
            [r"\A", "\n", r"(?:(?P<foo>.+?)(?<!\n))?", r"\n*\z"]
        );
    }

    #[test]
    fn inputs_keep_their_spacing() {
        let compiled = compiler()
            .parse("user: [john]\npass: [doe]", true, true)
            .unwrap();
        assert_eq!(
            compiled.patterns(),
            [r"\A", "user:", " ", "john", "\n", "pass:", " ", "doe", r"\n*\z"]
        );
        let inputs: Vec<_> = compiled
            .inputs()
            .iter()
            .map(|i| (i.offset, i.prefix.as_str(), i.text.as_str()))
            .collect();
        assert_eq!(inputs, [(6, "user: ", "john"), (19, " john\npass: ", "doe")]);
    }

    #[test]
    fn long_prefixes_are_truncated_to_the_maximum() {
        let compiled = compiler()
            .parse("What is your real name? [john doe]", true, true)
            .unwrap();
        let inputs: Vec<_> = compiled
            .inputs()
            .iter()
            .map(|i| (i.prefix.as_str(), i.text.as_str()))
            .collect();
        assert_eq!(inputs, [(r" real name\? ", "john doe")]);
    }

    #[test]
    fn inputs_without_enough_prefix_fail() {
        assert_eq!(
            compiler().parse("pw: [secret]", true, true),
            Err(CompileError::InsufficientPrefix {
                offset: 4,
                weight: 4,
                min: 6
            })
        );
    }
}
