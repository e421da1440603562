//! Rule combinators: the surface used to describe a grammar.
//!
//! A [`Rule`] is a pure description; nothing is compiled or validated until
//! [`GrammarBuilder::build`](crate::GrammarBuilder::build). Recursive and
//! mutually recursive structure is expressed with [`Rule::reference`], which
//! names another definition rather than embedding it, so cyclic grammars
//! need no cyclic ownership.

use crate::capture::{Action, Binding};
use crate::error::ActionError;
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;

/// One node of a grammar description, optionally carrying a capture name
/// (meaningful inside a sequence) and a semantic action.
pub struct Rule<V> {
    pub(crate) kind: RuleKind<V>,
    pub(crate) name: Option<CompactString>,
    pub(crate) action: Option<Action<V>>,
}

pub(crate) enum RuleKind<V> {
    /// Match an exact substring.
    Literal(CompactString),
    /// Match an anchored regular expression. Compiled at build time.
    Pattern(CompactString),
    /// Match all sub-rules consecutively. Elements tagged with
    /// [`Rule::named`] are captured; the rest are discarded.
    Sequence(Vec<Rule<V>>),
    /// Ordered choice: the first alternative that matches wins. Each
    /// alternative carries a variant tag that becomes part of the capture.
    Choice(Vec<(CompactString, Rule<V>)>),
    /// Zero or one. Never fails.
    Optional(Box<Rule<V>>),
    /// `min` or more repetitions, each after the first optionally preceded
    /// by a separator.
    Repeat {
        item: Box<Rule<V>>,
        separator: Option<Box<Rule<V>>>,
        min: u32,
    },
    /// Named indirection to another definition.
    Reference(CompactString),
    /// Succeeds at zero width iff (after whitespace skipping) the input is
    /// exhausted.
    Eof,
    /// Negative lookahead: succeeds at zero width iff the inner rule fails.
    /// Consumes nothing and captures nothing.
    Not(Box<Rule<V>>),
}

impl<V> Rule<V> {
    fn new(kind: RuleKind<V>) -> Self {
        Self {
            kind,
            name: None,
            action: None,
        }
    }

    /// Match `text` exactly.
    #[must_use]
    pub fn literal(text: impl Into<CompactString>) -> Self {
        Self::new(RuleKind::Literal(text.into()))
    }

    /// Match the regular expression `pattern`, anchored at the current
    /// position. Pattern syntax errors surface from
    /// [`GrammarBuilder::build`](crate::GrammarBuilder::build).
    #[must_use]
    pub fn pattern(pattern: impl Into<CompactString>) -> Self {
        Self::new(RuleKind::Pattern(pattern.into()))
    }

    /// Match every item in order. A single-item sequence collapses to the
    /// item itself.
    #[must_use]
    pub fn sequence(items: impl IntoIterator<Item = Rule<V>>) -> Self {
        let mut items: Vec<_> = items.into_iter().collect();
        if items.len() == 1 {
            items.pop().expect("length checked")
        } else {
            Self::new(RuleKind::Sequence(items))
        }
    }

    /// Ordered choice over tagged alternatives.
    #[must_use]
    pub fn choice(alternatives: impl IntoIterator<Item = (&'static str, Rule<V>)>) -> Self {
        Self::new(RuleKind::Choice(
            alternatives
                .into_iter()
                .map(|(tag, rule)| (tag.into(), rule))
                .collect(),
        ))
    }

    /// Zero or one occurrence of `inner`.
    #[must_use]
    pub fn optional(inner: Rule<V>) -> Self {
        Self::new(RuleKind::Optional(Box::new(inner)))
    }

    /// `min` or more occurrences of `item` with no separator.
    #[must_use]
    pub fn repeat(item: Rule<V>, min: u32) -> Self {
        Self::new(RuleKind::Repeat {
            item: Box::new(item),
            separator: None,
            min,
        })
    }

    /// `min` or more occurrences of `item`, separated by `separator`. The
    /// separator is matched before every repetition after the first; a
    /// separator with no following item is not consumed.
    #[must_use]
    pub fn separated(item: Rule<V>, separator: Rule<V>, min: u32) -> Self {
        Self::new(RuleKind::Repeat {
            item: Box::new(item),
            separator: Some(Box::new(separator)),
            min,
        })
    }

    /// Zero or more occurrences. Shorthand for `repeat(item, 0)`.
    #[must_use]
    pub fn star(item: Rule<V>) -> Self {
        Self::repeat(item, 0)
    }

    /// One or more occurrences. Shorthand for `repeat(item, 1)`.
    #[must_use]
    pub fn plus(item: Rule<V>) -> Self {
        Self::repeat(item, 1)
    }

    /// Reference the definition called `name`.
    #[must_use]
    pub fn reference(name: impl Into<CompactString>) -> Self {
        Self::new(RuleKind::Reference(name.into()))
    }

    /// End of input.
    #[must_use]
    pub fn eof() -> Self {
        Self::new(RuleKind::Eof)
    }

    /// Negative lookahead over `inner`.
    #[must_use]
    pub fn not(inner: Rule<V>) -> Self {
        Self::new(RuleKind::Not(Box::new(inner)))
    }

    /// Capture this rule's result under `name` when it appears as a
    /// sequence element. Elsewhere the name has no effect.
    #[must_use]
    pub fn named(mut self, name: impl Into<CompactString>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a semantic action, invoked once per finalized success of this
    /// node. The action's output replaces the raw capture.
    #[must_use]
    pub fn map<F>(mut self, action: F) -> Self
    where
        F: Fn(Binding<'_, V>) -> Result<V, ActionError> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }
}

impl<V> Clone for Rule<V> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            name: self.name.clone(),
            action: self.action.clone(),
        }
    }
}

impl<V> Clone for RuleKind<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(t) => Self::Literal(t.clone()),
            Self::Pattern(p) => Self::Pattern(p.clone()),
            Self::Sequence(items) => Self::Sequence(items.clone()),
            Self::Choice(alts) => Self::Choice(alts.clone()),
            Self::Optional(inner) => Self::Optional(inner.clone()),
            Self::Repeat {
                item,
                separator,
                min,
            } => Self::Repeat {
                item: item.clone(),
                separator: separator.clone(),
                min: *min,
            },
            Self::Reference(name) => Self::Reference(name.clone()),
            Self::Eof => Self::Eof,
            Self::Not(inner) => Self::Not(inner.clone()),
        }
    }
}

impl<V> fmt::Debug for Rule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Rule");
        dbg.field("kind", &self.kind);
        if let Some(name) = &self.name {
            dbg.field("name", name);
        }
        dbg.field("action", &self.action.is_some());
        dbg.finish()
    }
}

impl<V> fmt::Debug for RuleKind<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(t) => write!(f, "Literal({t:?})"),
            Self::Pattern(p) => write!(f, "Pattern(/{p}/)"),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::Choice(alts) => {
                let tags: Vec<&str> = alts.iter().map(|(tag, _)| tag.as_str()).collect();
                f.debug_tuple("Choice").field(&tags).finish()
            }
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Repeat { min, .. } => write!(f, "Repeat(min = {min})"),
            Self::Reference(name) => write!(f, "Reference({name})"),
            Self::Eof => write!(f, "Eof"),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}
