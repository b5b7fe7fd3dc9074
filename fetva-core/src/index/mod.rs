//! Inverted index over Turkish question/answer documents.
//!
//! Terms are stemmed unigrams plus bigrams and trigrams of adjacent stems,
//! all sharing one vocabulary. Each term owns a posting list sorted by
//! document handle; a posting keeps the term frequency, the token
//! positions, and the best weight the term reached in each field.
//!
//! Memory Layout:
//! - Documents live in a dense arena; postings refer to them by handle
//! - Terms live in a dense table addressed by [`TermId`], with a hash map
//!   from term text to handle
//! - Positions sit inline in each posting for the common short case
//!
//! Threading:
//! - Searching takes `&self` and only bumps an atomic counter, so a built
//!   [`InvertedIndex`] can be read from many threads at once. Building and
//!   removal take `&mut self`; callers that share an index put it behind a
//!   lock.

mod api;
mod builder;
mod fuzzy;
mod scoring;
mod search;
mod stats;
mod suggest;
mod types;

pub use fuzzy::{bounded_edit_distance, distance_threshold};
pub use stats::IndexStats;
pub use suggest::DEFAULT_SUGGESTIONS;
pub use types::{
    BuildReport, EngineMetrics, FieldWeights, InvertedIndex, Posting, TermEntry, TermId,
    ARABIC_TEXT_WEIGHT, BIGRAM_BOOST, MAX_MATCHES_PER_TERM, MAX_QUERY_BIGRAMS, MAX_QUERY_TERMS,
    MAX_QUERY_TRIGRAMS, PROXIMITY_MAX_BONUS, PROXIMITY_MAX_TERMS, PROXIMITY_WINDOW,
    TRIGRAM_BOOST,
};

#[cfg(test)]
mod tests {
    use super::*;
    use fetva_types::{Document, DocumentError, IndexError, SearchOptions};

    fn doc(id: &str, question: &str, category: &str) -> Document {
        Document::new(id, question, "", vec![category.to_owned()])
    }

    fn scenario() -> InvertedIndex {
        let docs = [
            doc("a", "Oruç tutmak farz mıdır?", "İbadet"),
            doc("b", "Namaz kılmak farz mıdır?", "İbadet"),
            doc("c", "Faizli borç almak günah mı?", "Muamelat"),
        ];
        let mut index = InvertedIndex::new();
        let report = index.build_index(&docs);
        assert_eq!(report, BuildReport { indexed: 3, rejected: 0 });
        index
    }

    fn ids(results: &[fetva_types::SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn search_before_build_fails() {
        let index = InvertedIndex::new();
        assert_eq!(
            index.search("farz", &SearchOptions::default()),
            Err(IndexError::NotBuilt)
        );
    }

    #[test]
    fn end_to_end_farz_query() {
        let index = scenario();
        let results = index
            .search("farz mıdır", &SearchOptions::fuzzy())
            .expect("index is built");

        assert_eq!(ids(&results), ["a", "b"]);
        for result in &results {
            assert!(result.matched_terms.iter().any(|t| t == "farz"));
            assert!(result.score > 0.0);
        }
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn empty_or_stop_word_query_returns_nothing() {
        let index = scenario();
        let opts = SearchOptions::default();
        assert!(index.search("", &opts).expect("built").is_empty());
        assert!(index.search("ve ile bu", &opts).expect("built").is_empty());
        assert!(index.search("zz", &opts).expect("built").is_empty());
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let index = scenario();
        let results = index.search("kurban", &SearchOptions::fuzzy()).expect("built");
        assert!(results.is_empty());
    }

    #[test]
    fn exact_matches_are_literal() {
        let index = scenario();
        for query in ["farz", "oruç farz", "namaz kılmak", "günah borç"] {
            let results = index.search(query, &SearchOptions::exact()).expect("built");
            assert!(!results.is_empty(), "{query} should hit");
            for result in &results {
                for term in &result.matched_terms {
                    assert!(
                        index.posting(term, &result.id).is_some(),
                        "{} does not contain {term}",
                        result.id
                    );
                }
            }
        }
    }

    #[test]
    fn fuzzy_matches_misspelling() {
        let index = scenario();

        let exact = index.search("naamz", &SearchOptions::exact()).expect("built");
        assert!(exact.is_empty());

        let fuzzy = index.search("naamz", &SearchOptions::fuzzy()).expect("built");
        assert_eq!(ids(&fuzzy), ["b"]);
        assert_eq!(fuzzy[0].matched_terms, ["namaz"]);
    }

    #[test]
    fn fuzzy_rejects_unrelated_words() {
        let index = scenario();
        let results = index.search("nokta", &SearchOptions::fuzzy()).expect("built");
        assert!(results.is_empty());
    }

    #[test]
    fn fuzzy_accepts_prefix() {
        let index = scenario();
        let results = index.search("faizlil", &SearchOptions::fuzzy()).expect("built");
        assert_eq!(ids(&results), ["c"]);
    }

    #[test]
    fn phrase_beats_its_parts() {
        let index = scenario();
        let opts = SearchOptions::exact();
        let score = |q: &str| {
            index
                .search(q, &opts)
                .expect("built")
                .iter()
                .find(|r| r.id == "a")
                .map_or(0.0, |r| r.score)
        };

        let phrase = score("farz mıdır");
        assert!(phrase >= score("farz") + score("mıdır"));
    }

    #[test]
    fn question_outranks_answer() {
        let docs = [
            Document::new("answer", "Sadaka nedir", "Zekat malın kırkta biridir", vec!["Fıkıh".into()]),
            Document::new("question", "Zekat kime verilir", "Fakirlere verilir", vec!["Fıkıh".into()]),
        ];
        let mut index = InvertedIndex::new();
        index.build_index(&docs);

        let results = index.search("zekat", &SearchOptions::exact()).expect("built");
        assert_eq!(ids(&results), ["question", "answer"]);
    }

    #[test]
    fn equal_scores_break_ties_by_id() {
        let docs = [
            doc("z", "zekat", "Zekat"),
            doc("m", "zekat", "Zekat"),
            doc("a", "zekat", "Zekat"),
        ];
        let mut index = InvertedIndex::new();
        index.build_index(&docs);

        let results = index.search("zekat", &SearchOptions::exact()).expect("built");
        assert_eq!(ids(&results), ["a", "m", "z"]);
    }

    #[test]
    fn min_score_and_max_results() {
        let index = scenario();

        let all = index.search("farz", &SearchOptions::exact()).expect("built");
        assert_eq!(all.len(), 2);

        let capped = index
            .search("farz", &SearchOptions::exact().with_max_results(1))
            .expect("built");
        assert_eq!(ids(&capped), ["a"]);

        let strict = index
            .search("farz", &SearchOptions::exact().with_min_score(f64::MAX))
            .expect("built");
        assert!(strict.is_empty());
    }

    #[test]
    fn arabic_text_is_searchable() {
        let docs = [Document::new("a", "Besmele", "", vec!["Dua".into()])
            .with_arabic_text("بِسْمِ اللَّهِ الرَّحْمٰنِ")];
        let mut index = InvertedIndex::new();
        index.build_index(&docs);

        let results = index.search("بسم", &SearchOptions::exact()).expect("built");
        assert_eq!(ids(&results), ["a"]);
        let posting = index.posting("بسم", "a").expect("indexed");
        assert_eq!(posting.weights.answer, ARABIC_TEXT_WEIGHT);
    }

    #[test]
    fn rejects_invalid_documents() {
        let mut index = InvertedIndex::new();
        let docs = [
            doc("a", "Oruç tutmak", "İbadet"),
            doc("a", "Oruç tutmak", "İbadet"),
            doc("", "Boş kimlik", "İbadet"),
            Document::new("e", " ", "", vec![]),
        ];
        let report = index.build_index(&docs);

        assert_eq!(report, BuildReport { indexed: 1, rejected: 3 });
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.add_document(&docs[0]),
            Err(DocumentError::DuplicateId { id: "a".into() })
        );
        assert_eq!(index.add_document(&docs[2]), Err(DocumentError::MissingId));
    }

    #[test]
    fn remove_document_hides_unique_terms() {
        let mut index = scenario();
        let before = index.stats();

        assert!(index.remove_document("a"));
        assert!(index
            .search("oruç", &SearchOptions::exact())
            .expect("built")
            .is_empty());
        assert!(!index.contains("a"));

        let after = index.stats();
        assert_eq!(after.document_count, 2);
        assert!(after.term_count < before.term_count);

        // Removing twice changes nothing.
        assert!(!index.remove_document("a"));
        assert_eq!(index.stats(), after);

        let results = index.search("farz", &SearchOptions::exact()).expect("built");
        assert_eq!(ids(&results), ["b"]);
    }

    #[test]
    fn suggestions_are_strict_prefixes() {
        let index = scenario();

        let suggestions = index.get_suggestions("far", DEFAULT_SUGGESTIONS);
        assert!(suggestions.iter().any(|s| s == "farz"));
        assert!(suggestions.iter().all(|s| s.starts_with("far")));

        let suggestions = index.get_suggestions("farz", 10);
        assert!(!suggestions.iter().any(|s| s == "farz"));
        assert!(suggestions.iter().all(|s| s.starts_with("farz ")));

        assert!(index.get_suggestions("FAR", 1).len() <= 1);
        assert!(index.get_suggestions("far", 0).is_empty());
    }

    #[test]
    fn empty_prefix_lists_most_frequent_terms() {
        let index = scenario();

        let all = index.get_suggestions("", usize::MAX);
        assert_eq!(all.len(), index.stats().term_count);
        assert_eq!(index.get_suggestions("", 3), all[..3]);

        let position = |term: &str| all.iter().position(|s| s == term).expect("indexed term");
        assert!(position("farz") < position("faizli"));
        assert!(index.get_suggestions(" ", 1).len() == 1);
    }

    #[test]
    fn suggestions_rank_by_document_frequency() {
        let index = scenario();
        // "farz" is in two documents, "faizli" in one.
        let suggestions = index.get_suggestions("f", 2);
        assert_eq!(suggestions[0], "farz");
    }

    #[test]
    fn stats_snapshot() {
        let index = scenario();
        let stats = index.stats();

        assert_eq!(stats.document_count, 3);
        assert!(stats.term_count > 0);
        assert!(stats.average_terms_per_document > 0.0);
        assert_eq!(
            stats.average_terms_per_document,
            stats.total_postings as f64 / 3.0
        );
        assert!(stats.to_string().starts_with("3 docs"));
    }

    #[test]
    fn metrics_count_queries() {
        let index = scenario();
        let _ = index.search("farz", &SearchOptions::default());
        let _ = index.search("namaz", &SearchOptions::default());

        let metrics = index.metrics();
        assert_eq!(metrics.queries_executed, 2);
        assert_eq!(metrics.documents_indexed, 3);
        assert_eq!(metrics.current_doc_count, 3);
    }

    #[test]
    fn rebuild_clears_previous_state() {
        let mut index = scenario();
        index.build_index(&[doc("x", "Kurban kesmek", "Kurban")]);

        assert_eq!(index.len(), 1);
        assert!(index
            .search("farz", &SearchOptions::exact())
            .expect("built")
            .is_empty());
        assert!(index.is_built());
    }

    #[test]
    fn clear_resets() {
        let mut index = scenario();
        index.clear();

        assert!(index.is_empty());
        assert!(!index.is_built());
        assert_eq!(index.term_count(), 0);
        assert_eq!(
            index.search("farz", &SearchOptions::default()),
            Err(IndexError::NotBuilt)
        );
    }

    #[test]
    fn large_scale() {
        let docs: Vec<Document> = (0..1000)
            .map(|i| doc(&format!("d{i}"), &format!("namaz vakti {i}"), "Namaz"))
            .collect();
        let mut index = InvertedIndex::new();
        index.build_index(&docs);

        let results = index
            .search("namaz vakti", &SearchOptions::default().with_max_results(10))
            .expect("built");
        assert_eq!(results.len(), 10);
        assert!(results.windows(2).all(|w| w[0].rank_cmp(&w[1]).is_le()));
    }
}
