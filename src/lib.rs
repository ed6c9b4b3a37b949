//! Compile expected program output into regular expressions.
//!
//! An expected string is matched against what a snippet really printed.
//! Capture tags like `<name>` stand for variable text, and input markers
//! like `[text]` at the end of a line describe what to type in an
//! interactive session.
//!
//! # Example
//!
//! ```rust
//! use outmatch::{CompilerConfig, Options, compile};
//!
//! let options = Options::default();
//! let compiled = compile("Hello <who>!\n", &options, &CompilerConfig::default()).unwrap();
//!
//! let captures = compiled.matcher().unwrap().captures("Hello world!").unwrap().unwrap();
//! assert_eq!(captures["who"].as_deref(), Some("world"));
//! ```

mod options;
pub mod pattern;
pub mod syntax;

pub use options::{Options, compile};
pub use pattern::{
    CompileError, CompiledPattern, Compiler, Fragment, InputRecord, MatchError, Matcher,
    PartialMatch, WhitespacePolicy,
};
pub use syntax::{CompilerConfig, ConfigError, PrefixRange};
