//! The match engine: recursive evaluation of rules against the input.
//!
//! `eval(rule, pos)` returns a success (consumed span plus capture) or a
//! failure position; ordinary mismatches are values, never errors. Only a
//! semantic action rejecting its input aborts evaluation, via [`Halt`].
//!
//! Named rules are memoized by `(rule, offset)`. Left-recursive rules use
//! the seed-growing algorithm: on re-entering a rule at the same offset the
//! engine answers with the current seed (initially failure), then re-evaluates
//! the rule body, replacing the seed as long as each result consumes strictly
//! more input. Each growth step strictly advances the end offset, bounded by
//! the input length, so the loop terminates.

use crate::capture::{Binding, Capture};
use crate::error::{ActionError, Expectations};
use crate::grammar::{ChoiceAlt, Expr, Grammar, RuleId, RuleNode, SeqElem};
use crate::input::Cursor;
use crate::parser::memo::{MemoEntry, MemoTable};
use crate::parser::{ParseConfig, ParseMetrics};
use crate::span::Span;

/// Result of evaluating one rule at one position.
#[derive(Debug)]
pub(crate) enum Match<V> {
    Success(Success<V>),
    Failure { pos: usize },
}

#[derive(Debug)]
pub(crate) struct Success<V> {
    /// Post-skip start offset of the matched span.
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) capture: Capture<V>,
}

impl<V: Clone> Clone for Match<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Success(s) => Self::Success(s.clone()),
            Self::Failure { pos } => Self::Failure { pos: *pos },
        }
    }
}

impl<V: Clone> Clone for Success<V> {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            end: self.end,
            capture: self.capture.clone(),
        }
    }
}

/// Abort raised by a failing semantic action. Distinct from a grammar
/// mismatch: it is not retried and unwinds the whole parse.
pub(crate) struct Halt {
    pub(crate) offset: usize,
    pub(crate) source: ActionError,
}

type EvalResult<V> = Result<Match<V>, Halt>;

pub(crate) struct Engine<'g, 'i, 'c, V> {
    pub(crate) grammar: &'g Grammar<V>,
    pub(crate) cursor: Cursor<'i, 'c>,
    pub(crate) memo: MemoTable<V>,
    pub(crate) expectations: Expectations,
    pub(crate) metrics: ParseMetrics,
    pub(crate) memoize: bool,
}

impl<'g, 'i, 'c, V: Clone> Engine<'g, 'i, 'c, V> {
    pub(crate) fn new(grammar: &'g Grammar<V>, input: &'i str, config: &'c ParseConfig) -> Self {
        Self {
            grammar,
            cursor: Cursor::new(input, &config.skip),
            memo: MemoTable::new(config.max_memo_entries),
            expectations: Expectations::new(),
            metrics: ParseMetrics::default(),
            memoize: config.memoization,
        }
    }

    /// Evaluate `id` at `pos`, dispatching by rule kind.
    pub(crate) fn eval(&mut self, id: RuleId, pos: usize) -> EvalResult<V> {
        self.metrics.rules_evaluated += 1;
        let grammar = self.grammar;
        if grammar.node(id).is_head {
            self.eval_head(id, pos)
        } else {
            self.eval_node(id, pos)
        }
    }

    /// Evaluate a named rule through the memoization table, with
    /// seed-growing for left-recursive rules.
    fn eval_head(&mut self, id: RuleId, pos: usize) -> EvalResult<V> {
        let start = self.cursor.skip(pos);
        let key = (id, start);
        match self.memo.lookup(&key) {
            Some(MemoEntry::Done(result)) => {
                self.metrics.memo_hits += 1;
                return Ok(result.clone());
            }
            Some(MemoEntry::InProgress { seed }) => {
                // Re-entered the same rule at the same offset without
                // consuming input: answer with the current seed.
                return Ok(seed.clone().unwrap_or(Match::Failure { pos: start }));
            }
            None => {}
        }

        self.memo.store(key, MemoEntry::InProgress { seed: None });
        let mut result = match self.eval_node(id, start) {
            Ok(result) => result,
            Err(halt) => {
                self.memo.remove(&key);
                return Err(halt);
            }
        };

        if self.grammar.node(id).left_recursive {
            // Grow the seed until re-evaluation stops consuming more input.
            loop {
                let best_end = match &result {
                    Match::Success(s) => s.end,
                    Match::Failure { .. } => break,
                };
                self.memo
                    .store(key, MemoEntry::InProgress { seed: Some(result.clone()) });
                self.metrics.seed_growths += 1;
                let next = match self.eval_node(id, start) {
                    Ok(next) => next,
                    Err(halt) => {
                        self.memo.remove(&key);
                        return Err(halt);
                    }
                };
                match next {
                    Match::Success(ref s) if s.end > best_end => result = next,
                    _ => break,
                }
            }
        }

        if self.memoize {
            self.memo.store(key, MemoEntry::Done(result.clone()));
        } else {
            self.memo.remove(&key);
        }
        Ok(result)
    }

    /// Evaluate a node's expression and apply its semantic action, if any.
    fn eval_node(&mut self, id: RuleId, pos: usize) -> EvalResult<V> {
        match self.eval_expr(id, pos)? {
            Match::Failure { pos } => Ok(Match::Failure { pos }),
            Match::Success(mut success) => {
                let grammar = self.grammar;
                let node = grammar.node(id);
                if let Some(action) = &node.action {
                    let text = self.cursor.slice(success.start, success.end);
                    let span = Span::new(success.start, success.end);
                    let binding = Binding::new(success.capture, text, span);
                    let value = action(binding).map_err(|source| Halt {
                        offset: success.start,
                        source,
                    })?;
                    success.capture = Capture::Value(value);
                }
                Ok(Match::Success(success))
            }
        }
    }

    fn eval_expr(&mut self, id: RuleId, pos: usize) -> EvalResult<V> {
        let grammar = self.grammar;
        let node = grammar.node(id);
        match &node.expr {
            Expr::Literal(text) => Ok(self.eval_literal(node, text, pos)),
            Expr::Pattern { regex, source } => {
                let start = self.cursor.skip(pos);
                match self.cursor.match_pattern(start, regex) {
                    Some((end, matched)) => Ok(Match::Success(Success {
                        start,
                        end,
                        capture: Capture::Text(matched.into()),
                    })),
                    None => {
                        let label = expectation_label(node, || format!("/{source}/"));
                        self.expectations.record(start, &label);
                        Ok(Match::Failure { pos: start })
                    }
                }
            }
            Expr::Sequence(elems) => self.eval_sequence(elems, pos),
            Expr::Choice(alts) => self.eval_choice(alts, pos),
            Expr::Optional(inner) => self.eval_optional(*inner, pos),
            Expr::Repeat {
                item,
                separator,
                min,
            } => self.eval_repeat(*item, *separator, *min, pos),
            Expr::Reference(target) => self.eval(*target, pos),
            Expr::Eof => Ok(self.eval_eof(pos)),
            Expr::Not(inner) => self.eval_not(*inner, pos),
        }
    }

    fn eval_literal(&mut self, node: &RuleNode<V>, text: &str, pos: usize) -> Match<V> {
        let start = self.cursor.skip(pos);
        match self.cursor.match_literal(start, text) {
            Some(end) => Match::Success(Success {
                start,
                end,
                capture: Capture::Text(self.cursor.slice(start, end).into()),
            }),
            None => {
                let label = expectation_label(node, || format!("\"{text}\""));
                self.expectations.record(start, &label);
                Match::Failure { pos: start }
            }
        }
    }

    /// All elements must match consecutively; the first sub-failure aborts
    /// the sequence at the sub-failure's position. Named captures merge
    /// into a field map.
    fn eval_sequence(&mut self, elems: &'g [SeqElem], pos: usize) -> EvalResult<V> {
        let mut cur = pos;
        let mut first_start: Option<usize> = None;
        let mut fields = Vec::new();
        for elem in elems {
            match self.eval(elem.rule, cur)? {
                Match::Success(s) => {
                    if first_start.is_none() {
                        first_start = Some(s.start);
                    }
                    cur = s.end;
                    if let Some(name) = &elem.name {
                        fields.push((name.clone(), s.capture));
                    }
                }
                Match::Failure { pos: failed } => return Ok(Match::Failure { pos: failed }),
            }
        }
        Ok(Match::Success(Success {
            start: first_start.unwrap_or(pos),
            end: cur,
            capture: Capture::Fields(fields),
        }))
    }

    /// PEG ordered choice: alternatives in declaration order, first success
    /// wins outright. If all fail, the choice fails at the furthest position
    /// reached among its attempts.
    fn eval_choice(&mut self, alts: &'g [ChoiceAlt], pos: usize) -> EvalResult<V> {
        let mut furthest = pos;
        for alt in alts {
            match self.eval(alt.rule, pos)? {
                Match::Success(s) => {
                    return Ok(Match::Success(Success {
                        start: s.start,
                        end: s.end,
                        capture: Capture::Variant {
                            tag: alt.tag.clone(),
                            value: Box::new(s.capture),
                        },
                    }));
                }
                Match::Failure { pos: failed } => furthest = furthest.max(failed),
            }
        }
        Ok(Match::Failure { pos: furthest })
    }

    /// An optional never fails: absence is a zero-width success.
    fn eval_optional(&mut self, inner: RuleId, pos: usize) -> EvalResult<V> {
        match self.eval(inner, pos)? {
            Match::Success(s) => Ok(Match::Success(Success {
                start: s.start,
                end: s.end,
                capture: Capture::Present(Box::new(s.capture)),
            })),
            Match::Failure { .. } => Ok(Match::Success(Success {
                start: pos,
                end: pos,
                capture: Capture::Absent,
            })),
        }
    }

    /// Greedy repetition: loop until the item (or the separator before it)
    /// fails, keeping every accumulated success. A separator with no
    /// following item is not consumed. An iteration that consumes nothing
    /// ends the loop.
    fn eval_repeat(
        &mut self,
        item: RuleId,
        separator: Option<RuleId>,
        min: u32,
        pos: usize,
    ) -> EvalResult<V> {
        let mut items: Vec<Capture<V>> = Vec::new();
        let mut cur = pos;
        let mut first_start: Option<usize> = None;
        let mut fail_pos = pos;
        loop {
            let item_pos = if items.is_empty() {
                cur
            } else if let Some(sep) = separator {
                match self.eval(sep, cur)? {
                    Match::Success(s) => s.end,
                    Match::Failure { pos: failed } => {
                        fail_pos = failed;
                        break;
                    }
                }
            } else {
                cur
            };
            match self.eval(item, item_pos)? {
                Match::Success(s) => {
                    if s.end == cur {
                        break;
                    }
                    if first_start.is_none() {
                        first_start = Some(s.start);
                    }
                    items.push(s.capture);
                    cur = s.end;
                }
                Match::Failure { pos: failed } => {
                    fail_pos = failed;
                    break;
                }
            }
        }
        if items.len() as u32 >= min {
            Ok(Match::Success(Success {
                start: first_start.unwrap_or(pos),
                end: cur,
                capture: Capture::List(items),
            }))
        } else {
            Ok(Match::Failure { pos: fail_pos })
        }
    }

    fn eval_eof(&mut self, pos: usize) -> Match<V> {
        let start = self.cursor.skip(pos);
        if start >= self.cursor.len() {
            Match::Success(Success {
                start,
                end: start,
                capture: Capture::Unit,
            })
        } else {
            self.expectations.record(start, "end of input");
            Match::Failure { pos: start }
        }
    }

    /// Negative lookahead: zero-width and inverted. Expectations
    /// recorded during the speculative evaluation are discarded.
    fn eval_not(&mut self, inner: RuleId, pos: usize) -> EvalResult<V> {
        self.expectations.mute();
        let result = self.eval(inner, pos);
        self.expectations.unmute();
        match result? {
            Match::Success(_) => Ok(Match::Failure { pos }),
            Match::Failure { .. } => Ok(Match::Success(Success {
                start: pos,
                end: pos,
                capture: Capture::Unit,
            })),
        }
    }
}

fn expectation_label<V>(node: &RuleNode<V>, fallback: impl FnOnce() -> String) -> String {
    node.label
        .as_ref()
        .map_or_else(fallback, ToString::to_string)
}
