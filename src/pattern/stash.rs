//! Lookahead buffer of the compiler state machine.

use std::collections::VecDeque;

use super::token::Token;

/// The longest lookahead needed: whitespace, tag, and the token after them.
pub const STASH_CAPACITY: usize = 3;

/// Small ordered buffer of tokens not yet turned into fragments.
#[derive(Debug, Default)]
pub struct Stash {
    tokens: VecDeque<Token>,
}

impl Stash {
    pub fn new() -> Self {
        Self {
            tokens: VecDeque::with_capacity(STASH_CAPACITY),
        }
    }

    pub fn push(&mut self, token: Token) {
        debug_assert!(
            self.tokens.len() < STASH_CAPACITY,
            "stash overflow pushing {token:?}"
        );
        self.tokens.push_back(token);
    }

    /// Take the oldest token.
    pub fn pop_front(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    /// Take the newest token.
    pub fn pop_back(&mut self) -> Option<Token> {
        self.tokens.pop_back()
    }

    /// The oldest token.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::token::TokenKind;

    #[test]
    fn pops_from_both_ends() {
        let mut stash = Stash::new();
        stash.push(Token::new(0, TokenKind::Wspaces, " "));
        stash.push(Token::new(1, TokenKind::Tag, "<a>"));
        stash.push(Token::new(4, TokenKind::Literals, "b"));
        assert_eq!(stash.peek().map(|t| t.offset), Some(0));
        assert_eq!(stash.pop_back().map(|t| t.offset), Some(4));
        assert_eq!(stash.pop_front().map(|t| t.offset), Some(0));
        assert_eq!(stash.pop_front().map(|t| t.offset), Some(1));
        assert!(stash.pop_front().is_none());
        stash.push(Token::new(5, TokenKind::End, ""));
        stash.clear();
        assert!(stash.pop_back().is_none());
    }
}
