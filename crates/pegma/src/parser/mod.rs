//! # Parser Module
//!
//! Parse drivers and per-invocation configuration.
//!
//! A parse invocation wires together the engine's per-parse state (cursor,
//! memoization table, diagnostics), runs the entry rule from offset zero,
//! and packages either a [`ParseOutcome`] or a
//! [`ParseError`](crate::ParseError). The grammar itself is immutable and
//! shared; everything mutable lives for exactly one invocation.

pub(crate) mod engine;
pub(crate) mod memo;

use crate::capture::Capture;
use crate::error::{ParseError, ParseWarning};
use crate::grammar::Grammar;
use crate::input::SkipPolicy;
use crate::parser::engine::{Engine, Match};
use std::time::{Duration, Instant};

/// Per-invocation parse options.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Whitespace policy applied before every terminal match attempt.
    pub skip: SkipPolicy,

    /// Cache final results per `(rule, position)` (packrat parsing).
    ///
    /// Disabling trades speed for memory; left-recursion bookkeeping stays
    /// active regardless, since termination depends on it.
    pub memoization: bool,

    /// Upper bound on cached entries before new ones are dropped.
    pub max_memo_entries: usize,

    /// Treat trailing unparsed input as an error instead of a warning.
    pub require_full_consumption: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            skip: SkipPolicy::whitespace(),
            memoization: true,
            max_memo_entries: 8192,
            require_full_consumption: false,
        }
    }
}

/// A successful parse: consumed length, assembled value, warnings, metrics.
#[derive(Debug)]
pub struct ParseOutcome<V> {
    /// Byte length of input the entry rule consumed. Less than the input
    /// length means trailing unparsed input (see
    /// [`ParseConfig::require_full_consumption`]).
    pub consumed: usize,
    /// Capture tree of the entry rule; [`Capture::Value`] when the entry
    /// rule carries a semantic action.
    pub value: Capture<V>,
    pub warnings: Vec<ParseWarning>,
    pub metrics: ParseMetrics,
}

/// Counters from one parse invocation.
#[derive(Debug, Clone, Default)]
pub struct ParseMetrics {
    pub parse_time: Duration,
    /// Rule-node evaluations, including memo hits.
    pub rules_evaluated: usize,
    pub memo_hits: usize,
    /// Entries resident in the memo table when the parse finished.
    pub memo_entries: usize,
    /// Left-recursion growth iterations.
    pub seed_growths: usize,
}

impl<V: Clone> Grammar<V> {
    /// Parse `input` with default options: whitespace skipping, memoization
    /// on, trailing input tolerated (reported as a warning).
    ///
    /// # Errors
    ///
    /// See [`parse_with`](Self::parse_with).
    pub fn parse(&self, input: &str) -> Result<ParseOutcome<V>, ParseError> {
        self.parse_with(input, &ParseConfig::default())
    }

    /// Parse `input` with explicit options.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Mismatch`] when the entry rule does not match; carries
    ///   the furthest failure offset and the expectations collected there.
    /// - [`ParseError::Semantic`] when a semantic action rejects its input.
    /// - [`ParseError::TrailingInput`] when input remains after the entry
    ///   rule and [`ParseConfig::require_full_consumption`] is set.
    pub fn parse_with(
        &self,
        input: &str,
        config: &ParseConfig,
    ) -> Result<ParseOutcome<V>, ParseError> {
        let started = Instant::now();
        let mut engine = Engine::new(self, input, config);
        let result = engine.eval(self.entry, 0);

        let Engine {
            cursor,
            memo,
            expectations,
            mut metrics,
            ..
        } = engine;
        metrics.memo_entries = memo.len();
        metrics.parse_time = started.elapsed();

        match result {
            Err(halt) => Err(ParseError::Semantic {
                offset: halt.offset,
                source: halt.source,
            }),
            Ok(Match::Failure { .. }) => Err(expectations.into_mismatch()),
            Ok(Match::Success(success)) => {
                let consumed = success.end;
                // Trailing whitespace alone does not count as unparsed input.
                let fully_consumed = cursor.skip(consumed) >= input.len();
                if !fully_consumed && config.require_full_consumption {
                    return Err(ParseError::TrailingInput {
                        consumed,
                        total: input.len(),
                    });
                }
                let mut warnings = Vec::new();
                if !fully_consumed {
                    warnings.push(ParseWarning::TrailingInput {
                        consumed,
                        total: input.len(),
                    });
                }
                Ok(ParseOutcome {
                    consumed,
                    value: success.capture,
                    warnings,
                    metrics,
                })
            }
        }
    }
}
