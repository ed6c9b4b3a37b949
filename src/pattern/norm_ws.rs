//! Transitions of the normalizing whitespace policy.
//!
//! Whitespace width is discarded: a run of spaces and newlines becomes a
//! single "one or more whitespace" matcher. Next to a tag the run is instead
//! folded into the tag's guards, so the `(WS, TAG)` state defers the decision
//! until the token after the tag is known.

use tracing::{Level, event};

use crate::syntax::CompilerConfig;

use super::compiler::{CompileError, EndAnchor, Machine, State, TagContext};
use super::token::{Token, TokenKind};

impl Machine {
    pub(super) fn feed_normalized(
        &mut self,
        token: Option<Token>,
        cfg: &CompilerConfig,
    ) -> Result<(), CompileError> {
        let Some(token) = token else {
            if self.state != State::End {
                return Err(CompileError::Internal("tokens ran out before the end marker"));
            }
            self.emit_eof(EndAnchor::Whitespace, cfg)?;
            self.state = State::Exhausted;
            return Ok(());
        };

        let kind = token.kind;
        let is_space = token.is_space();
        let is_literal = token.is_literal();
        let endline = kind == TokenKind::Newlines;
        self.stash.push(token);

        let next = match self.state {
            State::Init => match kind {
                _ if is_space => State::Ws,
                _ if is_literal => State::Lit,
                TokenKind::Tag => State::Tag,
                TokenKind::End => State::End,
                _ => return Err(CompileError::Internal("unexpected token")),
            },
            State::Ws => match kind {
                _ if is_space => {
                    self.drop_last()?;
                    State::Ws
                }
                _ if is_literal => {
                    self.emit_ws(false, cfg)?;
                    State::Lit
                }
                TokenKind::Tag => State::WsTag,
                TokenKind::End => {
                    // Trailing whitespace is left to the end anchor, which
                    // takes the offset of the whitespace run.
                    let ws = self.pull()?;
                    let mut end = self.pull()?;
                    end.offset = ws.offset;
                    self.stash.push(end);
                    State::End
                }
                _ => return Err(CompileError::Internal("unexpected token")),
            },
            State::Lit => match kind {
                _ if is_space => {
                    self.emit_literals(cfg)?;
                    State::Ws
                }
                _ if is_literal => {
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
                _ if is_space => {
                    self.emit_tag(TagContext::RightWs, endline, cfg)?;
                    State::Ws
                }
                _ if is_literal => {
                    self.emit_tag(TagContext::Bare, false, cfg)?;
                    State::Lit
                }
                TokenKind::Tag => return self.reject_double_tag(),
                TokenKind::End => {
                    self.emit_tag(TagContext::RightWs, true, cfg)?;
                    State::End
                }
                _ => return Err(CompileError::Internal("unexpected token")),
            },
            State::WsTag => match kind {
                _ if is_space => {
                    self.emit_ws(true, cfg)?;
                    self.emit_tag(TagContext::BothWs, endline, cfg)?;
                    State::Ws
                }
                _ if is_literal => {
                    self.emit_ws(false, cfg)?;
                    self.emit_tag(TagContext::LeftWs, false, cfg)?;
                    State::Lit
                }
                TokenKind::Tag => {
                    self.pull()?;
                    return self.reject_double_tag();
                }
                TokenKind::End => {
                    self.emit_ws(true, cfg)?;
                    self.emit_tag(TagContext::BothWs, true, cfg)?;
                    State::End
                }
                _ => return Err(CompileError::Internal("unexpected token")),
            },
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
