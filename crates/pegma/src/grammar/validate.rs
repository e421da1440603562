//! Build-time validation of recursion shapes.
//!
//! The engine terminates on exactly one recursion shape: a definition that
//! references itself as the leftmost element of one of its own ordered-choice
//! alternatives, with at least one non-recursive alternative as the base
//! case. Everything else that can re-enter a rule without consuming input
//! (indirect left-edge cycles, recursion outside a choice, recursion behind
//! a nullable prefix) is rejected here, not discovered at parse time.
//!
//! Validation also rejects repeats whose item is statically nullable, since
//! those loop without advancing.

use crate::error::GrammarBuildError;
use crate::grammar::{Expr, RuleId, RuleNode};
use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};

pub(crate) fn check<V>(
    arena: &mut [RuleNode<V>],
    owners: &[CompactString],
) -> Result<(), GrammarBuildError> {
    let nullable = compute_nullable(arena);

    // Repeats over nullable items never advance.
    for (index, node) in arena.iter().enumerate() {
        if let Expr::Repeat { item, .. } = &node.expr {
            if nullable[item.index()] {
                return Err(GrammarBuildError::EmptyRepeat {
                    rule: owners[index].to_string(),
                });
            }
        }
    }

    // Left-edge reference graph between heads: an edge H -> T means T can be
    // reached from H's body without consuming input.
    let heads: Vec<RuleId> = (0..arena.len())
        .map(|i| RuleId(i as u32))
        .filter(|id| arena[id.index()].is_head)
        .collect();
    let mut edges: HashMap<RuleId, HashSet<RuleId, ahash::RandomState>, ahash::RandomState> =
        HashMap::default();
    for &head in &heads {
        let mut refs = HashSet::default();
        left_edge_refs(arena, &nullable, head, &mut refs);
        edges.insert(head, refs);
    }

    // Self-loops are candidate left recursion; verify the supported shape,
    // then remove them so the remaining graph must be acyclic.
    let mut recursive = Vec::new();
    for &head in &heads {
        let self_edge = edges
            .get(&head)
            .is_some_and(|targets| targets.contains(&head));
        if self_edge {
            check_left_recursion_shape(arena, &nullable, head, &owners[head.index()])?;
            recursive.push(head);
            if let Some(targets) = edges.get_mut(&head) {
                targets.remove(&head);
            }
        }
    }
    if let Some(cycle) = find_cycle(&heads, &edges) {
        return Err(GrammarBuildError::UnsupportedRecursion {
            cycle: cycle
                .iter()
                .map(|id| owners[id.index()].to_string())
                .collect(),
            reason: "rules re-enter each other without consuming input".to_string(),
        });
    }

    for head in recursive {
        arena[head.index()].left_recursive = true;
    }
    Ok(())
}

/// Fixpoint nullability: can this node match without consuming input?
///
/// Patterns are conservatively treated as consuming; a pattern that matches
/// empty input is caught by the engine's zero-width repeat guard instead.
fn compute_nullable<V>(arena: &[RuleNode<V>]) -> Vec<bool> {
    let mut nullable = vec![false; arena.len()];
    loop {
        let mut changed = false;
        for (index, node) in arena.iter().enumerate() {
            if nullable[index] {
                continue;
            }
            let value = match &node.expr {
                Expr::Literal(text) => text.is_empty(),
                Expr::Pattern { .. } => false,
                Expr::Eof | Expr::Not(_) => true,
                Expr::Optional(_) => true,
                Expr::Sequence(elems) => elems.iter().all(|e| nullable[e.rule.index()]),
                Expr::Choice(alts) => alts.iter().any(|a| nullable[a.rule.index()]),
                Expr::Repeat { item, min, .. } => *min == 0 || nullable[item.index()],
                Expr::Reference(target) => nullable[target.index()],
            };
            if value {
                nullable[index] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

/// Collect heads reachable from `id` at the left edge, i.e. before any
/// input is necessarily consumed. Traversal stops at references (head
/// boundaries) and at the first non-nullable sequence element.
fn left_edge_refs<V>(
    arena: &[RuleNode<V>],
    nullable: &[bool],
    id: RuleId,
    out: &mut HashSet<RuleId, ahash::RandomState>,
) {
    match &arena[id.index()].expr {
        Expr::Literal(_) | Expr::Pattern { .. } | Expr::Eof => {}
        Expr::Reference(target) => {
            out.insert(*target);
        }
        Expr::Optional(inner) | Expr::Not(inner) => left_edge_refs(arena, nullable, *inner, out),
        Expr::Repeat { item, .. } => left_edge_refs(arena, nullable, *item, out),
        Expr::Sequence(elems) => {
            for elem in elems {
                left_edge_refs(arena, nullable, elem.rule, out);
                if !nullable[elem.rule.index()] {
                    break;
                }
            }
        }
        Expr::Choice(alts) => {
            for alt in alts {
                left_edge_refs(arena, nullable, alt.rule, out);
            }
        }
    }
}

/// A head that can re-enter itself must have the one supported shape:
/// an ordered choice whose recursive alternatives reference the head as
/// their leftmost element, plus at least one non-recursive alternative.
fn check_left_recursion_shape<V>(
    arena: &[RuleNode<V>],
    nullable: &[bool],
    head: RuleId,
    name: &CompactString,
) -> Result<(), GrammarBuildError> {
    let unsupported = |reason: &str| GrammarBuildError::UnsupportedRecursion {
        cycle: vec![name.to_string()],
        reason: reason.to_string(),
    };

    let Expr::Choice(alts) = &arena[head.index()].expr else {
        return Err(unsupported(
            "self-reference outside an ordered choice cannot terminate",
        ));
    };

    let mut base_cases = 0usize;
    for alt in alts {
        let mut refs = HashSet::default();
        left_edge_refs(arena, nullable, alt.rule, &mut refs);
        if !refs.contains(&head) {
            base_cases += 1;
            continue;
        }
        if !leftmost_is_reference_to(arena, nullable, alt.rule, head) {
            return Err(unsupported(
                "self-reference must be the leftmost element of a choice alternative",
            ));
        }
    }
    if base_cases == 0 {
        return Err(unsupported(
            "left-recursive rule has no non-recursive alternative",
        ));
    }
    Ok(())
}

/// True iff the leftmost consuming position of `id` is a direct reference
/// to `head`, with nothing nullable in front of it.
fn leftmost_is_reference_to<V>(
    arena: &[RuleNode<V>],
    nullable: &[bool],
    id: RuleId,
    head: RuleId,
) -> bool {
    match &arena[id.index()].expr {
        Expr::Reference(target) => *target == head,
        Expr::Sequence(elems) => elems.first().is_some_and(|first| {
            !nullable[first.rule.index()]
                && leftmost_is_reference_to(arena, nullable, first.rule, head)
        }),
        _ => false,
    }
}

/// Find any cycle in the (self-loop-free) head graph via iterative DFS.
fn find_cycle(
    heads: &[RuleId],
    edges: &HashMap<RuleId, HashSet<RuleId, ahash::RandomState>, ahash::RandomState>,
) -> Option<Vec<RuleId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }
    let mut colors: HashMap<RuleId, Color, ahash::RandomState> =
        heads.iter().map(|&h| (h, Color::White)).collect();

    for &start in heads {
        if colors[&start] != Color::White {
            continue;
        }
        // Stack of (node, path position); path tracks the grey chain.
        let mut path = Vec::new();
        let mut stack = vec![(start, false)];
        while let Some((node, children_done)) = stack.pop() {
            if children_done {
                colors.insert(node, Color::Black);
                path.pop();
                continue;
            }
            if colors[&node] != Color::White {
                continue;
            }
            colors.insert(node, Color::Grey);
            path.push(node);
            stack.push((node, true));
            if let Some(targets) = edges.get(&node) {
                for &target in targets {
                    match colors[&target] {
                        Color::Grey => {
                            let from = path.iter().position(|&p| p == target).unwrap_or(0);
                            return Some(path[from..].to_vec());
                        }
                        Color::White => stack.push((target, false)),
                        Color::Black => {}
                    }
                }
            }
        }
    }
    None
}
