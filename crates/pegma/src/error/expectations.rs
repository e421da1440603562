//! Furthest-failure tracking.
//!
//! PEG backtracking visits many dead ends; reporting all of them buries the
//! actual problem. The collector keeps only the maximum offset any attempt
//! failed at, together with the set of expectation labels recorded there, so
//! a total parse failure yields exactly one actionable diagnostic.

use crate::error::ParseError;
use compact_str::CompactString;
use smallvec::SmallVec;

/// Collects the furthest failure offset and the labels expected there.
///
/// The tracked offset is monotonic non-decreasing over a parse attempt.
/// Labels at the same offset accumulate (deduplicated), so the final message
/// can read "expected one of: X, Y, Z".
#[derive(Debug, Default)]
pub(crate) struct Expectations {
    offset: usize,
    labels: SmallVec<[CompactString; 4]>,
    recorded: bool,
    muted: u32,
}

impl Expectations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a failed terminal attempt at `offset` expecting `label`.
    pub(crate) fn record(&mut self, offset: usize, label: &str) {
        if self.muted > 0 {
            return;
        }
        if !self.recorded || offset > self.offset {
            self.offset = offset;
            self.labels.clear();
            self.labels.push(label.into());
            self.recorded = true;
        } else if offset == self.offset && !self.labels.iter().any(|l| l == label) {
            self.labels.push(label.into());
        }
    }

    /// Suppress recording, for speculative evaluation (negative lookahead).
    pub(crate) fn mute(&mut self) {
        self.muted += 1;
    }

    pub(crate) fn unmute(&mut self) {
        debug_assert!(self.muted > 0);
        self.muted -= 1;
    }

    /// Furthest failure offset seen so far, if any attempt failed.
    pub(crate) fn furthest(&self) -> Option<usize> {
        self.recorded.then_some(self.offset)
    }

    /// Convert the collected state into the single user-facing diagnostic.
    pub(crate) fn into_mismatch(self) -> ParseError {
        ParseError::Mismatch {
            offset: self.offset,
            expected: self.labels.into_iter().map(|l| l.to_string()).collect(),
        }
    }
}
