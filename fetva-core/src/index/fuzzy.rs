//! Query term to index term matching.
//!
//! Exact lookup first. Only when that fails, and fuzzy matching is on, the
//! whole vocabulary is scanned:
//!
//! 1. skip terms whose first character differs
//! 2. skip terms whose length differs by more than the threshold
//! 3. accept if either term is a prefix of the other
//! 4. otherwise accept if the bounded edit distance is within the threshold
//!
//! The scan is linear in vocabulary size. Candidates come out in
//! vocabulary insertion order and are capped at [`MAX_MATCHES_PER_TERM`].

use smallvec::SmallVec;

use crate::index::types::{InvertedIndex, TermId, MAX_MATCHES_PER_TERM};

/// Largest accepted edit distance for a query term of `chars` characters.
#[inline]
pub const fn distance_threshold(chars: usize) -> usize {
    match chars {
        0..=4 => 1,
        5..=7 => 2,
        _ => 3,
    }
}

type CharBuf = SmallVec<[char; 32]>;

/// Levenshtein distance between `a` and `b`, or `max + 1` as soon as it
/// is certain to exceed `max`.
///
/// Keeps two rows. Once every cell of a row is above `max`, no later row
/// can come back under it.
pub fn bounded_edit_distance(a: &str, b: &str, max: usize) -> usize {
    let a: CharBuf = a.chars().collect();
    let b: CharBuf = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return max + 1;
    }

    let mut prev: SmallVec<[usize; 32]> = (0..=b.len()).collect();
    let mut curr: SmallVec<[usize; 32]> = SmallVec::from_elem(0, b.len() + 1);

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let value = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            curr[j + 1] = value;
            row_min = row_min.min(value);
        }

        if row_min > max {
            return max + 1;
        }
        core::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

impl InvertedIndex {
    /// Index terms that match a processed query term.
    pub(crate) fn find_term_matches(&self, term: &str, fuzzy: bool) -> SmallVec<[TermId; 4]> {
        let mut matches = SmallVec::new();

        if let Some(id) = self.term_id(term) {
            matches.push(id);
            return matches;
        }
        if !fuzzy {
            return matches;
        }

        let Some(first) = term.chars().next() else {
            return matches;
        };
        let term_chars = term.chars().count();
        let threshold = distance_threshold(term_chars);

        for (id, entry) in self.vocabulary() {
            if matches.len() >= MAX_MATCHES_PER_TERM {
                break;
            }

            let candidate = &*entry.term;
            if candidate.chars().next() != Some(first) {
                continue;
            }
            if candidate.chars().count().abs_diff(term_chars) > threshold {
                continue;
            }
            if candidate.starts_with(term)
                || term.starts_with(candidate)
                || bounded_edit_distance(candidate, term, threshold) <= threshold
            {
                matches.push(id);
            }
        }

        matches
    }
}
