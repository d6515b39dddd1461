//! Approximate string matching used to pair up renamed tables, columns, and
//! scenario keys.
//!
//! Similarity is the Ratcliff/Obershelp ratio `2·M / (|a| + |b|)`. `M` is
//! the total length of the matching blocks found by taking the longest common
//! run of characters and then recursing on what lies left and right of it.
//! A candidate only qualifies when its ratio reaches the caller's cutoff;
//! among qualifying candidates the highest ratio wins and ties go to the
//! first candidate in iteration order.

use std::collections::BTreeSet;

use crate::error::DriftError;

pub const TABLE_CUTOFF: f64 = 0.70;
pub const SCENARIO_CUTOFF: f64 = 0.85;
pub const COLUMN_CUTOFF: f64 = 0.60;
pub const TEMPORAL_CUTOFF: f64 = 0.85;

/// Similarity thresholds for each kind of rename the engine infers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCutoffs {
    pub table: f64,
    pub scenario: f64,
    pub column: f64,
    pub temporal: f64,
}

impl Default for MatchCutoffs {
    fn default() -> Self {
        Self {
            table: TABLE_CUTOFF,
            scenario: SCENARIO_CUTOFF,
            column: COLUMN_CUTOFF,
            temporal: TEMPORAL_CUTOFF,
        }
    }
}

impl MatchCutoffs {
    pub fn validate(&self) -> Result<(), DriftError> {
        for value in [self.table, self.scenario, self.column, self.temporal] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DriftError::InvalidCutoff(value));
            }
        }
        Ok(())
    }
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * matched_chars(&a, &b)) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, len) = longest_run(a, b, (a_lo, a_hi), (b_lo, b_hi));
        if len == 0 {
            continue;
        }
        matched += len;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + len < a_hi && j + len < b_hi {
            pending.push((i + len, a_hi, j + len, b_hi));
        }
    }
    matched
}

/// Longest common run of `a[a_lo..a_hi]` and `b[b_lo..b_hi]` as
/// `(start_a, start_b, len)`. Among runs of equal length the one starting
/// earliest in `a` wins, then the one starting earliest in `b`.
fn longest_run(
    a: &[char],
    b: &[char],
    (a_lo, a_hi): (usize, usize),
    (b_lo, b_hi): (usize, usize),
) -> (usize, usize, usize) {
    let mut best = (a_lo, b_lo, 0);
    // run length ending at (i - 1, j - 1), shifted by one so index 0 is a sentinel
    let mut previous = vec![0usize; b_hi - b_lo + 1];
    for i in a_lo..a_hi {
        let mut current = vec![0usize; b_hi - b_lo + 1];
        for j in b_lo..b_hi {
            if a[i] != b[j] {
                continue;
            }
            let len = previous[j - b_lo] + 1;
            current[j - b_lo + 1] = len;
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        previous = current;
    }
    best
}

/// Returns the target most similar to `candidate` with a ratio of at least
/// `cutoff`.
pub fn best_match<'a, I>(candidate: &str, targets: I, cutoff: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for target in targets {
        let score = similarity(candidate, target);
        if score < cutoff {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((target, score)),
        }
    }
    best.map(|(target, _)| target)
}

/// Targets still available for fuzzy matching.
///
/// A target claimed by one candidate leaves the pool, so two candidates can
/// never be paired with the same target. Iteration is in sorted order which
/// keeps tie-breaking reproducible.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    available: BTreeSet<String>,
}

impl CandidatePool {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, target: &str) -> bool {
        self.available.contains(target)
    }

    /// Removes and returns the best qualifying target for `candidate`.
    pub fn claim(&mut self, candidate: &str, cutoff: f64) -> Option<String> {
        let found = best_match(candidate, self.available.iter().map(String::as_str), cutoff)?
            .to_string();
        self.available.remove(&found);
        Some(found)
    }

    pub fn into_remaining(self) -> BTreeSet<String> {
        self.available
    }
}
