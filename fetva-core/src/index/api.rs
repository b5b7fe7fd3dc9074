//! Public API for building the index and adding, removing and retrieving
//! documents.

use std::time::Instant;

use fetva_types::{DocId, Document, DocumentError};
use tracing::{debug, info, warn};

use crate::analyzer::Field;
use crate::index::types::{BuildReport, InvertedIndex, ARABIC_TEXT_WEIGHT};

/// Checks a document before anything is indexed.
fn validate(document: &Document) -> Result<(), DocumentError> {
    if document.id.trim().is_empty() {
        return Err(DocumentError::MissingId);
    }
    if document.question.trim().is_empty() && document.answer.trim().is_empty() {
        return Err(DocumentError::EmptyText {
            id: document.id.clone(),
        });
    }
    Ok(())
}

impl InvertedIndex {
    /// Replaces the index contents with `documents` and marks it built.
    ///
    /// Invalid documents are skipped with a warning and counted in the
    /// report; they never abort the build.
    pub fn build_index<'a, I>(&mut self, documents: I) -> BuildReport
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let started = Instant::now();
        self.clear();

        let mut report = BuildReport::default();
        for document in documents {
            match self.add_document(document) {
                Ok(_) => report.indexed += 1,
                Err(err) => {
                    warn!(error = %err, "document rejected by index");
                    report.rejected += 1;
                }
            }
        }

        self.is_built = true;
        info!(
            documents = report.indexed,
            rejected = report.rejected,
            terms = self.term_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search index built"
        );
        report
    }

    /// Indexes one document and returns its handle.
    ///
    /// Question, answer and categories are indexed separately at their
    /// own weights. Arabic text, when present, goes into the answer
    /// category at [`ARABIC_TEXT_WEIGHT`].
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::MissingId` for a blank id,
    /// `DocumentError::EmptyText` when both question and answer are blank,
    /// and `DocumentError::DuplicateId` when the id is already indexed.
    #[inline(never)]
    pub fn add_document(&mut self, document: &Document) -> Result<DocId, DocumentError> {
        validate(document)?;
        let doc_id = self.documents.push(&document.id)?;

        self.index_field(doc_id, &document.question, Field::Question, Field::Question.weight());
        self.index_field(doc_id, &document.answer, Field::Answer, Field::Answer.weight());
        let categories = document.categories.join(" ");
        self.index_field(doc_id, &categories, Field::Categories, Field::Categories.weight());
        if let Some(arabic) = document.arabic_text.as_deref() {
            self.index_field(doc_id, arabic, Field::Answer, ARABIC_TEXT_WEIGHT);
        }

        self.documents_added += 1;
        Ok(doc_id)
    }

    /// Removes a document from every posting list.
    ///
    /// Scans the whole vocabulary, so it is meant for rare invalidation
    /// rather than bulk updates. Returns `false` if the id is unknown.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(doc_id) = self.documents.remove(id) else {
            return false;
        };
        let emptied = self.purge_postings(doc_id);
        debug!(id, emptied_terms = emptied, "document removed from index");
        true
    }

    /// External id of an indexed document.
    #[inline(always)]
    pub fn get(&self, doc_id: DocId) -> Option<&str> {
        self.documents.get(doc_id)
    }

    /// Returns `true` if a document with this id is indexed.
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.documents.find(id).is_some()
    }
}
