//! Typed error hierarchy for codeteach.
//!
//! Three enums cover the places where a caller needs to match on the cause:
//! - `ModelError`: language-model service faults (request, status, stream)
//! - `ExampleFormatError`: example input strings the argument parser rejects
//! - `HarnessError`: run/submit failures that are not ordinary test failures
//!
//! Everything else (config files, CLI plumbing) uses `anyhow`.

use thiserror::Error;

/// Faults raised by the model service.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model stream error: {0}")]
    Stream(String),

    #[error("Model stream closed before the response completed")]
    Interrupted,

    #[error("Could not decode model stream chunk: {0}")]
    Decode(String),
}

/// A malformed LeetCode-style example input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExampleFormatError {
    #[error("unbalanced '{bracket}' at offset {offset}")]
    UnbalancedBracket { bracket: char, offset: usize },

    #[error("unclosed {open} bracket(s)")]
    UnclosedBrackets { open: usize },

    #[error("unterminated {quote} string starting at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
}

/// Failures of the test harness itself (a failing example is not one of these).
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("No test cases available for this problem")]
    NoExamples,

    #[error("A run is already in progress")]
    Busy,

    #[error("Interpreter could not be started: {0}")]
    InterpreterUnavailable(#[source] std::io::Error),
}
