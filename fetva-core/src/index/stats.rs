//! Statistics and IndexStats.

use serde::Serialize;

use crate::index::types::InvertedIndex;

/// A snapshot of index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of distinct terms (unigrams and n-grams).
    pub term_count: usize,
    /// Number of documents in the index.
    pub document_count: usize,
    /// Postings per document.
    pub average_terms_per_document: f64,
    /// Total number of postings.
    pub total_postings: usize,
}

impl InvertedIndex {
    /// Returns index statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats::from_index(self)
    }
}

impl IndexStats {
    /// Constructs stats from an index.
    pub fn from_index(index: &InvertedIndex) -> Self {
        let total_postings: usize = index
            .vocabulary()
            .map(|(_, entry)| entry.document_frequency())
            .sum();
        let document_count = index.documents.len();

        Self {
            term_count: index.term_count(),
            document_count,
            average_terms_per_document: if document_count > 0 {
                total_postings as f64 / document_count as f64
            } else {
                0.0
            },
            total_postings,
        }
    }
}

impl core::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} docs, {} terms, {} postings ({:.1} per doc)",
            self.document_count, self.term_count, self.total_postings, self.average_terms_per_document
        )
    }
}
