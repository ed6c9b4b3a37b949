//! Per-example options and the top-level compile entry point.

use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use crate::pattern::{CompileError, CompiledPattern, Compiler, WhitespacePolicy};
use crate::syntax::CompilerConfig;

/// Switches that change how one expected string is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Recognise capture tags.
    pub tags: bool,
    /// Recognise input markers.
    pub input: bool,
    /// Use the normalizing whitespace policy.
    pub norm_ws: bool,
    /// Substrings deleted from the expected text before compiling.
    pub rm: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tags: true,
            input: false,
            norm_ws: false,
            rm: Vec::new(),
        }
    }
}

impl Options {
    pub fn policy(&self) -> WhitespacePolicy {
        if self.norm_ws {
            WhitespacePolicy::Normalize
        } else {
            WhitespacePolicy::Literal
        }
    }

    /// `expected` with every `rm` substring removed, in order.
    pub fn strip(&self, expected: &str) -> String {
        self.rm
            .iter()
            .filter(|r| !r.is_empty())
            .fold(expected.to_string(), |text, r| text.replace(r.as_str(), ""))
    }
}

/// Compile `expected` under `options`.
pub fn compile(
    expected: &str,
    options: &Options,
    config: &CompilerConfig,
) -> Result<CompiledPattern, CompileError> {
    let expected = options.strip(expected);
    event!(
        Level::DEBUG,
        policy = ?options.policy(),
        tags = options.tags,
        input = options.input,
        "compile expected"
    );
    Compiler::new(options.policy(), config.clone()).parse(&expected, options.tags, options.input)
}
