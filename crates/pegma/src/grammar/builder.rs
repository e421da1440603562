//! Grammar construction: flattening rule trees into the arena, resolving
//! references, compiling patterns, and running validation.

use crate::error::GrammarBuildError;
use crate::grammar::rule::{Rule, RuleKind};
use crate::grammar::{validate, ChoiceAlt, Expr, Grammar, RuleId, RuleNode, SeqElem};
use compact_str::CompactString;
use hashbrown::HashMap;
use regex::Regex;

/// Builder for a [`Grammar`].
///
/// Definitions are registered in order with [`define`](Self::define); the
/// entry point is named with [`entry`](Self::entry); [`build`](Self::build)
/// compiles and validates the whole graph.
pub struct GrammarBuilder<V> {
    rules: Vec<(CompactString, Rule<V>)>,
    entry: Option<CompactString>,
}

impl<V> GrammarBuilder<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            entry: None,
        }
    }

    /// Register a named definition. Names are the targets of
    /// [`Rule::reference`] and become memoization heads.
    #[must_use]
    pub fn define(mut self, name: impl Into<CompactString>, rule: Rule<V>) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    /// Declare the definition parsing starts from.
    #[must_use]
    pub fn entry(mut self, name: impl Into<CompactString>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Compile and validate the grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarBuildError`] for duplicate or undefined rule
    /// names, invalid patterns, repeats whose item can match empty input,
    /// unsupported recursion shapes, or a missing/unknown entry point.
    pub fn build(self) -> Result<Grammar<V>, GrammarBuildError> {
        let entry_name = self.entry.ok_or(GrammarBuildError::MissingEntry)?;

        // Reserve one arena slot per definition up front so references
        // resolve independently of definition order.
        let mut names: HashMap<CompactString, RuleId, ahash::RandomState> = HashMap::default();
        let mut arena: Vec<RuleNode<V>> = Vec::new();
        let mut owners: Vec<CompactString> = Vec::new();
        for (name, _) in &self.rules {
            let id = RuleId(u32::try_from(arena.len()).expect("grammar too large"));
            if names.insert(name.clone(), id).is_some() {
                return Err(GrammarBuildError::DuplicateRule {
                    name: name.to_string(),
                });
            }
            arena.push(RuleNode {
                expr: Expr::Eof, // placeholder, overwritten below
                label: Some(name.clone()),
                action: None,
                is_head: true,
                left_recursive: false,
            });
            owners.push(name.clone());
        }

        for (index, (name, rule)) in self.rules.into_iter().enumerate() {
            let Rule { kind, action, .. } = rule;
            let mut lowering = Lowering {
                arena: &mut arena,
                owners: &mut owners,
                names: &names,
                owner: name,
            };
            let expr = lowering.lower(kind)?;
            let head = &mut arena[index];
            head.expr = expr;
            head.action = action;
        }

        let entry = *names
            .get(&entry_name)
            .ok_or_else(|| GrammarBuildError::UnknownEntry {
                name: entry_name.to_string(),
            })?;

        validate::check(&mut arena, &owners)?;

        Ok(Grammar {
            arena,
            names,
            entry,
        })
    }
}

impl<V> Default for GrammarBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Flattens one definition's rule tree into the shared arena.
struct Lowering<'a, V> {
    arena: &'a mut Vec<RuleNode<V>>,
    owners: &'a mut Vec<CompactString>,
    names: &'a HashMap<CompactString, RuleId, ahash::RandomState>,
    owner: CompactString,
}

impl<V> Lowering<'_, V> {
    /// Allocate an arena node for a child rule and return its id.
    fn child(&mut self, rule: Rule<V>) -> Result<RuleId, GrammarBuildError> {
        let Rule { kind, action, .. } = rule;
        let expr = self.lower(kind)?;
        let id = RuleId(u32::try_from(self.arena.len()).expect("grammar too large"));
        self.arena.push(RuleNode {
            expr,
            label: None,
            action,
            is_head: false,
            left_recursive: false,
        });
        self.owners.push(self.owner.clone());
        Ok(id)
    }

    fn lower(&mut self, kind: RuleKind<V>) -> Result<Expr, GrammarBuildError> {
        match kind {
            RuleKind::Literal(text) => Ok(Expr::Literal(text)),
            RuleKind::Pattern(source) => {
                let anchored = format!(r"\A(?:{source})");
                let regex =
                    Regex::new(&anchored).map_err(|err| GrammarBuildError::InvalidPattern {
                        rule: self.owner.to_string(),
                        source: Box::new(err),
                    })?;
                Ok(Expr::Pattern { regex, source })
            }
            RuleKind::Sequence(items) => {
                let elems = items
                    .into_iter()
                    .map(|item| {
                        let name = item.name.clone();
                        let rule = self.child(item)?;
                        Ok(SeqElem { name, rule })
                    })
                    .collect::<Result<Vec<_>, GrammarBuildError>>()?;
                Ok(Expr::Sequence(elems))
            }
            RuleKind::Choice(alternatives) => {
                let alts = alternatives
                    .into_iter()
                    .map(|(tag, rule)| {
                        let rule = self.child(rule)?;
                        Ok(ChoiceAlt { tag, rule })
                    })
                    .collect::<Result<Vec<_>, GrammarBuildError>>()?;
                Ok(Expr::Choice(alts))
            }
            RuleKind::Optional(inner) => Ok(Expr::Optional(self.child(*inner)?)),
            RuleKind::Repeat {
                item,
                separator,
                min,
            } => {
                let item = self.child(*item)?;
                let separator = separator.map(|sep| self.child(*sep)).transpose()?;
                Ok(Expr::Repeat {
                    item,
                    separator,
                    min,
                })
            }
            RuleKind::Reference(name) => {
                let target =
                    self.names
                        .get(&name)
                        .copied()
                        .ok_or(GrammarBuildError::UndefinedReference {
                            name: name.to_string(),
                        })?;
                Ok(Expr::Reference(target))
            }
            RuleKind::Eof => Ok(Expr::Eof),
            RuleKind::Not(inner) => Ok(Expr::Not(self.child(*inner)?)),
        }
    }
}
