//! Candidate directories and their ranking.
//!
//! Candidates order by, in turn:
//! 1. specificity, highest first
//! 2. last verification, most recent first (never verified sorts last)
//! 3. path length, shortest first
//! 4. case-folded path, lexicographically smallest first
//!
//! Candidates equal under all four keys form a tie group that cannot be
//! split without guessing.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use jumpdir_core::path;
use jumpdir_core::EntryId;
use jumpdir_pattern::Specificity;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    History(EntryId),
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub specificity: Specificity,
    pub last_verified: Option<DateTime<Utc>>,
    pub source: Source,
}

impl Candidate {
    fn folded(&self) -> String {
        path::fold_case(&self.path)
    }
}

/// Total ranking order; `Less` means `a` is preferred.
#[must_use]
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.specificity
        .cmp(&a.specificity)
        .then_with(|| b.last_verified.cmp(&a.last_verified))
        .then_with(|| a.path.chars().count().cmp(&b.path.chars().count()))
        .then_with(|| a.folded().cmp(&b.folded()))
}

/// Sort best first.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(compare);
}

/// Length of the leading run of candidates tied with the first. Expects
/// ranked input.
#[must_use]
pub fn top_group_len(ranked: &[Candidate]) -> usize {
    match ranked.split_first() {
        None => 0,
        Some((first, rest)) => {
            1 + rest
                .iter()
                .take_while(|c| compare(first, c) == Ordering::Equal)
                .count()
        }
    }
}
