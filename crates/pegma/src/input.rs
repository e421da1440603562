//! Input cursor and whitespace discipline.
//!
//! The cursor wraps the input buffer and performs the three primitive
//! operations the engine needs: skip insignificant text, match a literal,
//! match an anchored pattern. Whitespace is skipped before every terminal
//! match attempt, not implicitly between rules, which keeps the grammar in
//! control, per PEG's explicit-whitespace discipline.

use regex::Regex;

/// One skipper in a [`SkipPolicy`].
#[derive(Debug, Clone)]
enum Skipper {
    /// Unicode whitespace characters.
    Whitespace,
    /// A comment from `prefix` to end of line.
    LineComment(String),
    /// A comment between `open` and `close`. An unterminated comment skips
    /// to end of input.
    BlockComment { open: String, close: String },
}

/// Whitespace-skipping policy applied before every terminal match.
///
/// A policy is a fixed set of skippers composed to a fixed point: skipping
/// repeats until no skipper advances the position, so interleaved whitespace
/// and comments are consumed in one call. Skipping is idempotent.
///
/// ```
/// use pegma::SkipPolicy;
///
/// // Shell-style config files: spaces plus `#` comments.
/// let policy = SkipPolicy::whitespace().line_comments("#");
/// # let _ = policy;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    skippers: Vec<Skipper>,
}

impl SkipPolicy {
    /// Skip nothing. Every byte is significant.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Skip Unicode whitespace.
    #[must_use]
    pub fn whitespace() -> Self {
        Self {
            skippers: vec![Skipper::Whitespace],
        }
    }

    /// Also skip comments running from `prefix` to end of line.
    #[must_use]
    pub fn line_comments(mut self, prefix: impl Into<String>) -> Self {
        self.skippers.push(Skipper::LineComment(prefix.into()));
        self
    }

    /// Also skip comments delimited by `open`/`close`.
    #[must_use]
    pub fn block_comments(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.skippers.push(Skipper::BlockComment {
            open: open.into(),
            close: close.into(),
        });
        self
    }

    /// Advance `pos` past everything the policy considers insignificant.
    pub(crate) fn skip(&self, input: &str, mut pos: usize) -> usize {
        loop {
            let before = pos;
            for skipper in &self.skippers {
                pos = skipper.skip(input, pos);
            }
            if pos == before {
                return pos;
            }
        }
    }
}

impl Skipper {
    fn skip(&self, input: &str, pos: usize) -> usize {
        let Some(tail) = input.get(pos..) else {
            return pos;
        };
        match self {
            Self::Whitespace => {
                let trimmed = tail.trim_start();
                pos + (tail.len() - trimmed.len())
            }
            Self::LineComment(prefix) => {
                if prefix.is_empty() || !tail.starts_with(prefix.as_str()) {
                    return pos;
                }
                match tail.find('\n') {
                    Some(nl) => pos + nl + 1,
                    None => input.len(),
                }
            }
            Self::BlockComment { open, close } => {
                if open.is_empty() || !tail.starts_with(open.as_str()) {
                    return pos;
                }
                let body = &tail[open.len()..];
                match body.find(close.as_str()) {
                    Some(end) => pos + open.len() + end + close.len(),
                    None => input.len(),
                }
            }
        }
    }
}

/// Read-only view over the input buffer for one parse invocation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'i, 'p> {
    input: &'i str,
    policy: &'p SkipPolicy,
}

impl<'i, 'p> Cursor<'i, 'p> {
    pub(crate) fn new(input: &'i str, policy: &'p SkipPolicy) -> Self {
        Self { input, policy }
    }

    pub(crate) fn len(&self) -> usize {
        self.input.len()
    }

    /// Apply the whitespace policy at `pos`. Idempotent.
    pub(crate) fn skip(&self, pos: usize) -> usize {
        self.policy.skip(self.input, pos)
    }

    /// Match an exact substring at `pos`. Safe at end of input.
    pub(crate) fn match_literal(&self, pos: usize, text: &str) -> Option<usize> {
        let tail = self.input.get(pos..)?;
        tail.starts_with(text).then(|| pos + text.len())
    }

    /// Match an anchored pattern at `pos`, returning the end offset and the
    /// matched text. Safe at end of input.
    pub(crate) fn match_pattern(&self, pos: usize, regex: &Regex) -> Option<(usize, &'i str)> {
        let tail = self.input.get(pos..)?;
        let m = regex.find(tail)?;
        debug_assert_eq!(m.start(), 0, "patterns are compiled with \\A anchors");
        Some((pos + m.end(), m.as_str()))
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'i str {
        &self.input[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_skip_is_idempotent() {
        let policy = SkipPolicy::whitespace();
        let input = "   x  ";
        let once = policy.skip(input, 0);
        assert_eq!(once, 3);
        assert_eq!(policy.skip(input, once), once);
        // Safe past the last token and at end of input.
        assert_eq!(policy.skip(input, 4), 6);
        assert_eq!(policy.skip(input, 6), 6);
    }

    #[test]
    fn line_comments_compose_with_whitespace() {
        let policy = SkipPolicy::whitespace().line_comments("#");
        let input = "  # one\n # two\n  x";
        assert_eq!(policy.skip(input, 0), input.find('x').unwrap());
    }

    #[test]
    fn block_comments_skip_to_close() {
        let policy = SkipPolicy::whitespace().block_comments("/*", "*/");
        let input = "/* a */ /* b */x";
        assert_eq!(policy.skip(input, 0), 15);
        // Unterminated comments consume the rest of the input.
        assert_eq!(policy.skip("/* open", 0), 7);
    }

    #[test]
    fn none_policy_skips_nothing() {
        assert_eq!(SkipPolicy::none().skip("  x", 0), 0);
    }

    #[test]
    fn literal_match_at_end_of_input() {
        let policy = SkipPolicy::none();
        let cursor = Cursor::new("ab", &policy);
        assert_eq!(cursor.match_literal(0, "ab"), Some(2));
        assert_eq!(cursor.match_literal(2, "x"), None);
        assert_eq!(cursor.match_literal(5, "x"), None);
    }

    #[test]
    fn pattern_match_returns_span_and_text() {
        let policy = SkipPolicy::none();
        let cursor = Cursor::new("123ab", &policy);
        let re = Regex::new(r"\A(?:[0-9]+)").unwrap();
        assert_eq!(cursor.match_pattern(0, &re), Some((3, "123")));
        assert_eq!(cursor.match_pattern(3, &re), None);
        assert_eq!(cursor.match_pattern(9, &re), None);
    }
}
