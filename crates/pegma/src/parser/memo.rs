//! Packrat memoization table.
//!
//! Maps `(rule, offset)` to a settled match result, so each named rule is
//! evaluated at most once per position under normal rules: the packrat
//! guarantee that keeps total work linear-ish in grammar size × input
//! length instead of exponential under backtracking.
//!
//! Left-recursive rules pass through [`MemoEntry::InProgress`] before
//! settling: the entry holds the current-best seed while the engine grows
//! it to a fixed point. The table is created fresh per parse invocation.

use crate::grammar::RuleId;
use crate::parser::engine::Match;
use hashbrown::HashMap;

pub(crate) type MemoKey = (RuleId, usize);

#[derive(Clone)]
pub(crate) enum MemoEntry<V> {
    /// Final result for this key.
    Done(Match<V>),
    /// Evaluation of this key is on the call stack. `seed` is the
    /// current-best result for a left-recursive re-entry; `None` means the
    /// failure seed.
    InProgress { seed: Option<Match<V>> },
}

pub(crate) struct MemoTable<V> {
    map: HashMap<MemoKey, MemoEntry<V>, ahash::RandomState>,
    capacity: usize,
}

impl<V> MemoTable<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::default(),
            capacity,
        }
    }

    pub(crate) fn lookup(&self, key: &MemoKey) -> Option<&MemoEntry<V>> {
        self.map.get(key)
    }

    /// Store an entry. When the table is at capacity, new `Done` entries
    /// are dropped; memoization degrades, correctness does not.
    /// `InProgress` entries are always stored: left-recursion bookkeeping
    /// must never be lost.
    pub(crate) fn store(&mut self, key: MemoKey, entry: MemoEntry<V>) {
        if matches!(entry, MemoEntry::Done(_))
            && self.map.len() >= self.capacity
            && !self.map.contains_key(&key)
        {
            return;
        }
        self.map.insert(key, entry);
    }

    pub(crate) fn remove(&mut self, key: &MemoKey) {
        self.map.remove(key);
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
