//! Divide-and-conquer substring search over a circular index range.
//!
//! A task either scans its range sequentially (leaf) or splits it at the
//! midpoint and runs both halves with `rayon::join`. Leaf hits are merged
//! first-found-wins on equal offsets; branch results are merged with a
//! circular tie-break anchored at the focused index. Split points are fixed,
//! so the outcome never depends on worker scheduling.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tokio_util::sync::CancellationToken;

use crate::config::{workload_threshold, SessionConfig};
use crate::interface::{MatchDetails, MatchResult, TypeAheadError};

/// Compile a query into a case-insensitive literal containment pattern.
pub(crate) fn compile_pattern(query: &str) -> Result<Regex, TypeAheadError> {
    if query.is_empty() {
        return Err(TypeAheadError::InvalidPattern("empty query".into()));
    }
    Ok(RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()?)
}

/// Map a logical position onto the corpus, wrapping past the end.
#[inline]
pub(crate) fn physical_index(logical: usize, len: usize) -> usize {
    if logical < len {
        logical
    } else {
        logical % len
    }
}

/// Tie-break anchor for a pass starting at logical position `start`.
///
/// Indices compared by the tie-break are physical, so the anchor is the
/// physical slot just before `start`; `-1` when the pass begins at slot 0.
/// An empty corpus has no slots and anchors at `-1`.
#[inline]
pub(crate) fn focus_before(start: usize, len: usize) -> isize {
    if len == 0 {
        return -1;
    }
    // A physical index is below `len`, which always fits in `isize`.
    physical_index(start, len) as isize - 1
}

/// Pick the better of two results.
///
/// The lower match offset wins. On equal offsets, `compare_indices == false`
/// keeps `current`; otherwise the circular tie-break around `focused` decides.
pub(crate) fn merge(
    current: Option<MatchResult>,
    candidate: Option<MatchResult>,
    compare_indices: bool,
    focused: isize,
) -> Option<MatchResult> {
    let (current, candidate) = match (current, candidate) {
        (None, other) | (other, None) => return other,
        (Some(a), Some(b)) => (a, b),
    };

    let (a_offset, b_offset) = (current.offset(), candidate.offset());
    if a_offset != b_offset {
        return Some(if a_offset < b_offset { current } else { candidate });
    }
    if !compare_indices {
        return Some(current);
    }

    let (Some(a), Some(b)) = (current.index(), candidate.index()) else {
        return Some(current);
    };
    if tie_break(focused, a as isize, b as isize) == a as isize {
        Some(current)
    } else {
        Some(candidate)
    }
}

/// Choose between two equally good indices relative to the focused one.
///
/// Never re-selects the focused position. When the focus sits outside the
/// pair the lower index is the next one going forward (with wraparound);
/// when it sits between them the higher one is.
pub(crate) fn tie_break(focused: isize, a: isize, b: isize) -> isize {
    if focused == a {
        return b;
    }
    if focused == b {
        return a;
    }
    let max = focused.max(a).max(b);
    let min = focused.min(a).min(b);
    if focused == max || focused == min {
        a.min(b)
    } else {
        a.max(b)
    }
}

/// Forkable unit of work searching `[start, end)` of a shared corpus.
#[derive(Debug, Clone)]
pub struct ParallelSearchTask {
    corpus: Arc<[String]>,
    pattern: Arc<Regex>,
    focused: isize,
    start: usize,
    end: usize,
    threshold: usize,
    token: CancellationToken,
}

impl ParallelSearchTask {
    /// `start` and `end` may arrive in either order; the range is normalised.
    pub fn new(
        corpus: Arc<[String]>,
        pattern: Arc<Regex>,
        focused: isize,
        start: usize,
        end: usize,
        threshold: usize,
        token: CancellationToken,
    ) -> Self {
        Self {
            corpus,
            pattern,
            focused,
            start: start.min(end),
            end: start.max(end),
            threshold: threshold.max(1),
            token,
        }
    }

    fn child(&self, start: usize, end: usize) -> Self {
        Self {
            corpus: Arc::clone(&self.corpus),
            pattern: Arc::clone(&self.pattern),
            focused: self.focused,
            start,
            end,
            threshold: self.threshold,
            token: self.token.clone(),
        }
    }

    /// Run the task tree to completion, returning the single best match.
    pub fn compute(&self) -> Option<MatchResult> {
        if self.token.is_cancelled() || self.corpus.is_empty() {
            return None;
        }

        if self.end - self.start <= self.threshold {
            return self.scan();
        }

        let mid = self.start + (self.end - self.start) / 2;
        let (left, right) = (self.child(self.start, mid), self.child(mid, self.end));
        let (a, b) = rayon::join(|| left.compute(), || right.compute());

        if self.token.is_cancelled() {
            return None;
        }
        merge(a, b, true, self.focused)
    }

    fn scan(&self) -> Option<MatchResult> {
        let len = self.corpus.len();
        let mut best: Option<MatchResult> = None;

        for logical in self.start..self.end {
            if self.token.is_cancelled() {
                return None;
            }

            let index = physical_index(logical, len);
            let lowered = self.corpus[index].to_lowercase();
            let Some(found) = self.pattern.find(&lowered) else {
                continue;
            };

            // Offsets count characters so multi-byte text ranks like ASCII.
            let offset = lowered[..found.start()].chars().count();
            let hit = MatchResult::matched(index, MatchDetails::new(offset, found.as_str()));
            best = merge(best, Some(hit), false, self.focused);

            if best.as_ref().is_some_and(|b| b.offset() == 0) {
                tracing::trace!(index, "prefix match, stopping leaf scan");
                break;
            }
        }

        best
    }
}

/// One-shot synchronous search of `[start, end)` for `query`.
///
/// Uses the same task tree and tie-break as a session run, anchored just
/// before `start`. Returns `None` for an empty corpus, an empty query or no
/// match.
pub fn find_best_match<S: AsRef<str>>(
    corpus: &[S],
    query: &str,
    start: usize,
    end: usize,
) -> Option<MatchResult> {
    if corpus.is_empty() || query.is_empty() {
        return None;
    }
    let pattern = compile_pattern(query).ok()?;
    let corpus: Arc<[String]> = corpus.iter().map(|s| s.as_ref().to_owned()).collect();
    let threshold = workload_threshold(corpus.len(), SessionConfig::default().effective_parallelism());
    let focused = focus_before(start, corpus.len());

    ParallelSearchTask::new(
        corpus,
        Arc::new(pattern),
        focused,
        start,
        end,
        threshold,
        CancellationToken::new(),
    )
    .compute()
}
