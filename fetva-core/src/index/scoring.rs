//! Scoring functions.

use crate::index::types::{Posting, PROXIMITY_MAX_BONUS, PROXIMITY_MAX_TERMS, PROXIMITY_WINDOW};

/// TF-IDF contribution of one posting.
///
/// - `tf = ln(1 + frequency)`
/// - `idf = ln((documents + 1) / (document_frequency + 1)) + 1`
/// - field weight is the best field the term appeared in
/// - `coverage = 1 + 1 / query_terms`
#[inline(always)]
pub(crate) fn term_score(
    posting: &Posting,
    document_frequency: usize,
    total_documents: usize,
    query_terms: usize,
) -> f64 {
    let tf = (1.0 + f64::from(posting.frequency)).ln();
    let idf = ((total_documents as f64 + 1.0) / (document_frequency as f64 + 1.0)).ln() + 1.0;
    let field_weight = f64::from(posting.weights.max());
    let coverage = 1.0 + 1.0 / query_terms.max(1) as f64;
    tf * idf * field_weight * coverage
}

/// Multiplier for a best pairwise distance between matched terms.
#[inline]
pub(crate) fn proximity_multiplier(distance: u32) -> f64 {
    let closeness = PROXIMITY_WINDOW - distance.min(PROXIMITY_WINDOW);
    1.0 + (f64::from(closeness) / f64::from(PROXIMITY_WINDOW)) * PROXIMITY_MAX_BONUS
}

/// Smallest distance between positions of any two of the first few
/// matched terms in one document. `None` with fewer than two postings.
pub(crate) fn best_distance(postings: &[&Posting]) -> Option<u32> {
    let limited = &postings[..postings.len().min(PROXIMITY_MAX_TERMS)];
    let mut best: Option<u32> = None;

    for (i, a) in limited.iter().enumerate() {
        for b in &limited[i + 1..] {
            for &pa in &a.positions {
                for &pb in &b.positions {
                    let d = pa.abs_diff(pb);
                    if best.map_or(true, |cur| d < cur) {
                        best = Some(d);
                    }
                    if d == 0 {
                        return best;
                    }
                }
            }
        }
    }

    best
}
