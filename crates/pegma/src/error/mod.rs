//! # Error Types
//!
//! Error taxonomy for grammar construction and parsing.
//!
//! Three distinct failure classes exist, and callers are expected to be able
//! to tell them apart:
//!
//! - [`GrammarBuildError`]: the rule graph itself is malformed (unsupported
//!   recursion shape, undefined reference, bad pattern). Surfaced by
//!   [`GrammarBuilder::build`](crate::GrammarBuilder::build), before any
//!   parse attempt.
//! - [`ParseError::Mismatch`]: an ordinary PEG failure: the input did not
//!   match the grammar. Carries the furthest failure offset plus the
//!   expectation labels collected there.
//! - [`ParseError::Semantic`]: the syntax matched but a semantic action
//!   rejected its input (malformed number, duplicate key, ...). Aborts the
//!   parse immediately and is never retried.
//!
//! When the `diagnostics` feature is enabled, the public error types also
//! derive [`miette::Diagnostic`] for rich reporting.

pub(crate) mod expectations;

pub(crate) use expectations::Expectations;

use crate::span::line_col;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// A grammar that cannot be parsed with, rejected at build time.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarBuildError {
    #[error("reference to undefined rule `{name}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::undefined_reference)))]
    UndefinedReference { name: String },

    #[error("rule `{name}` is defined more than once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::duplicate_rule)))]
    DuplicateRule { name: String },

    #[error("invalid pattern in rule `{rule}`: {source}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::invalid_pattern)))]
    InvalidPattern {
        rule: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("repeat item in rule `{rule}` can match empty input")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::empty_repeat)))]
    EmptyRepeat { rule: String },

    #[error("unsupported recursion involving {}: {reason}", .cycle.join(" -> "))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::unsupported_recursion)))]
    UnsupportedRecursion { cycle: Vec<String>, reason: String },

    #[error("no entry point declared")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::missing_entry)))]
    MissingEntry,

    #[error("entry point `{name}` is not a defined rule")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::unknown_entry)))]
    UnknownEntry { name: String },
}

/// A failed parse invocation.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// Ordinary PEG mismatch: every alternative at the top level was
    /// exhausted. Exactly one diagnostic, at the furthest offset any
    /// attempt reached.
    #[error("syntax error at offset {offset}: expected {}", format_expected(.expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::mismatch)))]
    Mismatch {
        offset: usize,
        expected: Vec<String>,
    },

    /// A semantic action rejected its input. The syntax up to `offset`
    /// matched; the semantics did not.
    #[error("semantic error at offset {offset}: {source}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::semantic)))]
    Semantic {
        offset: usize,
        #[source]
        source: ActionError,
    },

    /// The entry rule matched a proper prefix and
    /// [`require_full_consumption`](crate::ParseConfig::require_full_consumption)
    /// was set.
    #[error("trailing input: parse consumed {consumed} of {total} bytes")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(pegma::trailing_input)))]
    TrailingInput { consumed: usize, total: usize },
}

impl ParseError {
    /// Byte offset the error points at.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Mismatch { offset, .. } | Self::Semantic { offset, .. } => *offset,
            Self::TrailingInput { consumed, .. } => *consumed,
        }
    }

    /// Format this error with a `line:column` location resolved against the
    /// original input.
    #[must_use]
    pub fn display_with_source(&self, source: &str) -> String {
        format!("{}: {self}", line_col(source, self.offset()))
    }
}

fn format_expected(expected: &[String]) -> String {
    match expected {
        [] => "valid input".to_string(),
        [one] => one.clone(),
        many => format!("one of: {}", many.join(", ")),
    }
}

/// Non-fatal conditions noticed during a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("trailing input was not parsed: consumed {consumed} of {total} bytes")]
    TrailingInput { consumed: usize, total: usize },
}

/// Failure produced by a semantic action.
///
/// Distinct from a grammar mismatch: the input was syntactically valid, but
/// the attached transform rejected it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_display_single_expectation() {
        let err = ParseError::Mismatch {
            offset: 4,
            expected: vec!["\";\"".to_string()],
        };
        assert_eq!(err.to_string(), "syntax error at offset 4: expected \";\"");
    }

    #[test]
    fn mismatch_display_multiple_expectations() {
        let err = ParseError::Mismatch {
            offset: 6,
            expected: vec!["\",\"".to_string(), "\"}\"".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "syntax error at offset 6: expected one of: \",\", \"}\""
        );
    }

    #[test]
    fn display_with_source_resolves_line_col() {
        let err = ParseError::Mismatch {
            offset: 5,
            expected: vec!["\"b\"".to_string()],
        };
        let rendered = err.display_with_source("ab\ncd\n");
        assert!(rendered.starts_with("2:3:"), "got: {rendered}");
    }
}
