//! # Grammar Module
//!
//! Grammar description and construction.
//!
//! A grammar is described with [`Rule`] combinators, registered under names
//! on a [`GrammarBuilder`], and compiled by [`GrammarBuilder::build`] into an
//! immutable [`Grammar`]: an arena of rule nodes addressed by [`RuleId`].
//! References between definitions hold ids rather than owned sub-trees, so
//! recursive and mutually recursive grammars, including supported direct
//! left recursion, need no cyclic ownership.
//!
//! Construction is where malformed grammars are rejected: undefined
//! references, invalid patterns, repeats over nullable items, and every
//! recursion shape the engine cannot terminate on are build-time errors,
//! never runtime failures.
//!
//! ```
//! use pegma::{GrammarBuilder, Rule};
//!
//! let grammar: pegma::Grammar<f64> = GrammarBuilder::new()
//!     .define(
//!         "Sum",
//!         Rule::choice([
//!             (
//!                 "add",
//!                 Rule::sequence([
//!                     Rule::reference("Sum").named("lhs"),
//!                     Rule::literal("+"),
//!                     Rule::reference("Num").named("rhs"),
//!                 ]),
//!             ),
//!             ("num", Rule::reference("Num")),
//!         ]),
//!     )
//!     .define("Num", Rule::pattern("[0-9]+"))
//!     .entry("Sum")
//!     .build()
//!     .expect("grammar is well-formed");
//! # let _ = grammar;
//! ```

pub mod builder;
pub mod rule;
pub(crate) mod validate;

pub use builder::GrammarBuilder;
pub use rule::Rule;

use crate::capture::Action;
use compact_str::CompactString;
use hashbrown::HashMap;
use regex::Regex;

/// Stable identity of a rule node within one [`Grammar`].
///
/// Ids are arena indices: stable for the lifetime of the grammar, and the
/// rule half of every memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A compiled rule node. Children are referenced by [`RuleId`].
pub(crate) struct RuleNode<V> {
    pub(crate) expr: Expr,
    /// Definition name for named rules; used as the expectation label.
    pub(crate) label: Option<CompactString>,
    pub(crate) action: Option<Action<V>>,
    /// Named definitions are memoization heads.
    pub(crate) is_head: bool,
    /// Set during validation for supported direct left recursion.
    pub(crate) left_recursive: bool,
}

/// Compiled rule shape. Mirrors [`rule::RuleKind`] with references resolved
/// and patterns compiled.
pub(crate) enum Expr {
    Literal(CompactString),
    Pattern {
        regex: Regex,
        source: CompactString,
    },
    Sequence(Vec<SeqElem>),
    Choice(Vec<ChoiceAlt>),
    Optional(RuleId),
    Repeat {
        item: RuleId,
        separator: Option<RuleId>,
        min: u32,
    },
    Reference(RuleId),
    Eof,
    Not(RuleId),
}

pub(crate) struct SeqElem {
    pub(crate) name: Option<CompactString>,
    pub(crate) rule: RuleId,
}

pub(crate) struct ChoiceAlt {
    pub(crate) tag: CompactString,
    pub(crate) rule: RuleId,
}

/// An immutable, validated grammar, reusable across many parses.
///
/// A grammar owns no per-parse state: the memoization table, cursor, and
/// diagnostics of each [`parse`](Grammar::parse) invocation are created
/// fresh and discarded after. A `Grammar` may be shared read-only across
/// threads and used for concurrent parses of different inputs.
pub struct Grammar<V> {
    pub(crate) arena: Vec<RuleNode<V>>,
    pub(crate) names: HashMap<CompactString, RuleId, ahash::RandomState>,
    pub(crate) entry: RuleId,
}

impl<V> Grammar<V> {
    pub(crate) fn node(&self, id: RuleId) -> &RuleNode<V> {
        &self.arena[id.index()]
    }

    /// Id of the named definition, if it exists.
    #[must_use]
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name).copied()
    }

    /// Total number of rule nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Names of all definitions.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(CompactString::as_str)
    }
}

impl<V> std::fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("node_count", &self.arena.len())
            .field("entry", &self.entry)
            .field("rule_names", &self.names.keys().collect::<Vec<_>>())
            .finish()
    }
}
