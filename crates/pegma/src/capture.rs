//! Captured values and semantic action binding.
//!
//! Every successful match produces a [`Capture`] mirroring the shape of the
//! rule that matched. A rule with an attached action has its capture handed
//! to the action as a [`Binding`] immediately after the match is finalized;
//! the action's output replaces the raw capture as [`Capture::Value`]. This
//! is how a grammar assembles caller-level values in the same pass that
//! recognizes the input, without a second tree walk.

use crate::error::ActionError;
use crate::span::Span;
use compact_str::CompactString;
use std::sync::Arc;

/// Semantic action attached to a grammar node.
///
/// Invoked once per finalized success of that node. Actions must not mutate
/// sibling parse state, but may mutate caller-owned accumulators they close
/// over. Returning an error aborts the whole parse as
/// [`ParseError::Semantic`](crate::ParseError::Semantic).
pub type Action<V> = Arc<dyn Fn(Binding<'_, V>) -> Result<V, ActionError> + Send + Sync>;

/// Value tree produced by a successful match, mirroring the rule shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture<V> {
    /// Zero-width match with nothing to capture (`eof`, `not`).
    Unit,
    /// Text matched by a literal or pattern terminal.
    Text(CompactString),
    /// Output of a semantic action lower in the tree.
    Value(V),
    /// Named fields of a sequence, in declaration order. Unnamed elements
    /// are discarded.
    Fields(Vec<(CompactString, Capture<V>)>),
    /// The winning alternative of an ordered choice.
    Variant {
        tag: CompactString,
        value: Box<Capture<V>>,
    },
    /// An optional that matched.
    Present(Box<Capture<V>>),
    /// An optional that did not match.
    Absent,
    /// Repetition items, in match order.
    List(Vec<Capture<V>>),
}

impl<V> Capture<V> {
    /// Matched text, if this is a terminal capture.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Action output, if one was produced here.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Value(v) => Some(v),
            Self::Variant { value, .. } | Self::Present(value) => value.into_value(),
            _ => None,
        }
    }

    /// Look up a named sequence field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Capture<V>> {
        match self {
            Self::Fields(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, c)| c),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_field(self, name: &str) -> Option<Capture<V>> {
        match self {
            Self::Fields(fields) => fields.into_iter().find(|(n, _)| n == name).map(|(_, c)| c),
            _ => None,
        }
    }

    /// The winning choice alternative, as `(tag, capture)`.
    #[must_use]
    pub fn variant(&self) -> Option<(&str, &Capture<V>)> {
        match self {
            Self::Variant { tag, value } => Some((tag, value)),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_variant(self) -> Option<(CompactString, Capture<V>)> {
        match self {
            Self::Variant { tag, value } => Some((tag, *value)),
            _ => None,
        }
    }

    /// Repetition items.
    #[must_use]
    pub fn list(&self) -> Option<&[Capture<V>]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_list(self) -> Option<Vec<Capture<V>>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Inner capture of an optional that matched; `None` for [`Capture::Absent`]
    /// and for non-optional captures.
    #[must_use]
    pub fn into_present(self) -> Option<Capture<V>> {
        match self {
            Self::Present(inner) => Some(*inner),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// What a semantic action receives: the node's capture plus the matched
/// input slice and its span.
#[derive(Debug)]
pub struct Binding<'a, V> {
    capture: Capture<V>,
    text: &'a str,
    span: Span,
}

impl<'a, V> Binding<'a, V> {
    pub(crate) fn new(capture: Capture<V>, text: &'a str, span: Span) -> Self {
        Self {
            capture,
            text,
            span,
        }
    }

    /// The full input slice this node matched.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn capture(&self) -> &Capture<V> {
        &self.capture
    }

    #[must_use]
    pub fn into_capture(self) -> Capture<V> {
        self.capture
    }

    /// Named sequence field, or an [`ActionError`] naming what is missing.
    pub fn field(&self, name: &str) -> Result<&Capture<V>, ActionError> {
        self.capture
            .field(name)
            .ok_or_else(|| ActionError::new(format!("missing capture field `{name}`")))
    }

    /// The winning choice alternative, or an [`ActionError`].
    pub fn variant(&self) -> Result<(&str, &Capture<V>), ActionError> {
        self.capture
            .variant()
            .ok_or_else(|| ActionError::new("capture is not a choice variant"))
    }
}
