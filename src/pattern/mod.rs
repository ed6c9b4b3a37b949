//! Expected-output pattern compiler.
//!
//! An expected string is what a snippet is supposed to print, written as
//! plain text with a little markup:
//!
//! | Markup        | Meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `<name>`      | Capture whatever appears here under `name`           |
//! | `<...>`       | Match anything here without capturing                |
//! | `[text]`      | At the end of a line: type `text` into the session   |
//!
//! A [`Compiler`] splits the string into tokens and turns them into regex
//! [`Fragment`]s following a [`WhitespacePolicy`]. The resulting
//! [`CompiledPattern`] can be run with a [`Matcher`].

mod compiled;
mod compiler;
mod literal_ws;
mod matcher;
mod norm_ws;
mod prefix;
mod stash;
mod token;
mod tokenizer;


pub use compiled::{CompiledPattern, Fragment, InputRecord};
pub use compiler::{CompileError, Compiler, WhitespacePolicy};
pub use matcher::{Captures, MATCH_FLAGS, MatchError, Matcher, PartialMatch};
pub use token::{Warning, WarningKind};
