//! # Pegma
//!
//! A grammar-driven parsing engine: describe a recursive grammar with rule
//! combinators, match it against an input string using PEG (Parsing
//! Expression Grammar) semantics, and assemble caller-defined semantic
//! values in the same pass.
//!
//! ## Overview
//!
//! - **Ordered choice**: alternation is deterministic: the first
//!   alternative that matches wins, in declaration order.
//! - **Packrat memoization**: results are cached per `(rule, position)`,
//!   keeping total work linear-ish instead of exponential under
//!   backtracking.
//! - **Left recursion**: rules shaped like
//!   `Expression := Expression op Production | Production` are resolved
//!   with the seed-growing algorithm and associate left; unsupported
//!   recursion shapes are rejected when the grammar is built, not at parse
//!   time.
//! - **Semantic actions**: any rule may carry a transform from its capture
//!   to a domain value, invoked as matches finalize without a second tree walk.
//! - **One diagnostic per failure**: the furthest failure offset plus the
//!   expectation labels collected there.
//!
//! ## Quick Start
//!
//! A left-recursive sum grammar that evaluates as it parses:
//!
//! ```
//! use pegma::{ActionError, Capture, GrammarBuilder, Rule};
//!
//! let grammar = GrammarBuilder::new()
//!     .define(
//!         "Sum",
//!         Rule::choice([
//!             (
//!                 "add",
//!                 Rule::sequence([
//!                     Rule::reference("Sum").named("lhs"),
//!                     Rule::literal("+"),
//!                     Rule::reference("Number").named("rhs"),
//!                 ]),
//!             ),
//!             ("number", Rule::reference("Number")),
//!         ])
//!         .map(|b| match b.variant()? {
//!             ("add", fields) => {
//!                 let lhs = fields.field("lhs").and_then(Capture::value).copied();
//!                 let rhs = fields.field("rhs").and_then(Capture::value).copied();
//!                 match (lhs, rhs) {
//!                     (Some(lhs), Some(rhs)) => Ok(lhs + rhs),
//!                     _ => Err(ActionError::new("missing operand")),
//!                 }
//!             }
//!             (_, inner) => inner
//!                 .value()
//!                 .copied()
//!                 .ok_or_else(|| ActionError::new("missing operand")),
//!         }),
//!     )
//!     .define(
//!         "Number",
//!         Rule::pattern("[0-9]+").map(|b| {
//!             b.text()
//!                 .parse::<i64>()
//!                 .map_err(|e| ActionError::new(e.to_string()))
//!         }),
//!     )
//!     .entry("Sum")
//!     .build()
//!     .expect("grammar is well-formed");
//!
//! let outcome = grammar.parse("1 + 2 + 3").expect("input matches");
//! assert_eq!(outcome.value.into_value(), Some(6));
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Rule combinators, the grammar builder, and validation
//! - [`parser`] - Parse drivers, configuration, outcome and metrics
//! - [`capture`] - Capture trees and semantic action binding
//! - [`input`] - Whitespace-skipping policy
//! - [`error`] - Error taxonomy and diagnostics
//! - [`span`] - Byte-offset spans and line/column resolution

pub mod capture;
pub mod error;
pub mod grammar;
pub mod input;
pub mod parser;
pub mod span;

// Re-export commonly used types
pub use capture::{Action, Binding, Capture};
pub use error::{ActionError, GrammarBuildError, ParseError, ParseWarning};
pub use grammar::{Grammar, GrammarBuilder, Rule, RuleId};
pub use input::SkipPolicy;
pub use parser::{ParseConfig, ParseMetrics, ParseOutcome};
pub use span::{line_col, LineCol, Span};
