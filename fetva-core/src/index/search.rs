//! Search algorithm logic.

use std::sync::atomic::Ordering;

use fetva_types::{DocId, IndexError, SearchOptions, SearchResult};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::analyzer::{ngrams, stem, tokenize};
use crate::index::scoring::{best_distance, proximity_multiplier, term_score};
use crate::index::types::{
    InvertedIndex, Posting, TermId, MAX_QUERY_BIGRAMS, MAX_QUERY_TERMS, MAX_QUERY_TRIGRAMS,
};

/// Running score of one document for one query.
#[derive(Default)]
struct Candidate {
    score: f64,
    /// Distinct matched terms, in first-match order.
    matched: SmallVec<[TermId; 8]>,
}

type Candidates = FxHashMap<DocId, Candidate>;

/// Normalizes, tokenizes and optionally stems a query.
pub(crate) fn process_query(query: &str, stemming: bool) -> Vec<String> {
    let mut terms = tokenize(query);
    if stemming {
        for term in &mut terms {
            let len = stem(term).len();
            term.truncate(len);
        }
    }
    terms
}

impl InvertedIndex {
    /// Ranks documents against `query`.
    ///
    /// Each of the first [`MAX_QUERY_TERMS`] query terms is matched against
    /// the vocabulary (exactly, or fuzzily when no exact term exists and
    /// `options.fuzzy` is set). Every posting of every matched term adds a
    /// TF-IDF score to its document. Bigrams and trigrams of the query that
    /// exist verbatim in the index add to the same scores. Documents with
    /// two or more matched terms are then boosted by how close together
    /// those terms occur.
    ///
    /// Hits below `options.min_score` are dropped. The rest are ordered by
    /// score, descending, with the external id breaking ties, and cut to
    /// `options.max_results`.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NotBuilt` before [`build_index`](Self::build_index).
    #[inline(never)]
    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, IndexError> {
        if !self.is_built {
            return Err(IndexError::NotBuilt);
        }
        self.query_count.fetch_add(1, Ordering::Relaxed);

        let terms = process_query(query, options.stemming);
        if terms.is_empty() || options.max_results == 0 {
            return Ok(Vec::new());
        }

        let total_documents = self.documents.len();
        let query_len = terms.len();
        let mut candidates = Candidates::default();

        for term in terms.iter().take(MAX_QUERY_TERMS) {
            for term_id in self.find_term_matches(term, options.fuzzy) {
                self.accumulate(term_id, total_documents, query_len, &mut candidates);
            }
        }

        if query_len >= 2 {
            let phrases = ngrams(&terms, 2, MAX_QUERY_BIGRAMS)
                .into_iter()
                .chain(ngrams(&terms, 3, MAX_QUERY_TRIGRAMS));
            for phrase in phrases {
                if let Some(term_id) = self.term_id(&phrase) {
                    self.accumulate(term_id, total_documents, query_len, &mut candidates);
                }
            }
        }

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|(doc_id, candidate)| self.finish(doc_id, candidate, options.min_score))
            .collect();

        let limit = options.max_results;
        if results.len() > limit {
            results.select_nth_unstable_by(limit, SearchResult::rank_cmp);
            results.truncate(limit);
        }
        results.sort_unstable_by(SearchResult::rank_cmp);

        debug!(query, terms = ?terms, hits = results.len(), "search");
        Ok(results)
    }

    /// Adds every posting of `term_id` to the candidate set.
    fn accumulate(
        &self,
        term_id: TermId,
        total_documents: usize,
        query_len: usize,
        candidates: &mut Candidates,
    ) {
        let Some(entry) = self.entry(term_id) else {
            return;
        };
        let document_frequency = entry.document_frequency();

        for posting in &entry.postings {
            let candidate = candidates.entry(posting.doc_id).or_default();
            candidate.score += term_score(posting, document_frequency, total_documents, query_len);
            if !candidate.matched.contains(&term_id) {
                candidate.matched.push(term_id);
            }
        }
    }

    /// Applies the proximity bonus and the score floor, and resolves ids.
    fn finish(&self, doc_id: DocId, candidate: Candidate, min_score: f64) -> Option<SearchResult> {
        let mut score = candidate.score;

        if candidate.matched.len() >= 2 {
            let postings: SmallVec<[&Posting; 8]> = candidate
                .matched
                .iter()
                .filter_map(|&term_id| self.entry(term_id)?.posting(doc_id))
                .collect();
            if let Some(distance) = best_distance(&postings) {
                score *= proximity_multiplier(distance);
            }
        }

        if score < min_score {
            return None;
        }

        Some(SearchResult {
            doc_id,
            id: self.documents.get(doc_id)?.to_owned(),
            score,
            matched_terms: candidate
                .matched
                .iter()
                .filter_map(|&term_id| self.entry(term_id).map(|e| e.term.to_string()))
                .collect(),
        })
    }
}
