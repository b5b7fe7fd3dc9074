//! Index types and constants.

use std::sync::atomic::{AtomicU64, Ordering};

use fetva_types::DocId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::analyzer::Field;
use crate::arena::DocArena;

/// Query terms looked up per search; the rest only count toward coverage.
pub const MAX_QUERY_TERMS: usize = 5;

/// Index terms scored per query term (bounds fuzzy expansion).
pub const MAX_MATCHES_PER_TERM: usize = 100;

pub const MAX_QUERY_BIGRAMS: usize = 5;

pub const MAX_QUERY_TRIGRAMS: usize = 4;

/// Added to the field weight of a bigram posting.
pub const BIGRAM_BOOST: f32 = 0.5;

/// Added to the field weight of a trigram posting.
pub const TRIGRAM_BOOST: f32 = 0.8;

/// Arabic text is indexed into the answer category at this weight.
pub const ARABIC_TEXT_WEIGHT: f32 = 1.5;

/// Matched terms at this distance or further apart earn no bonus.
pub const PROXIMITY_WINDOW: u32 = 8;

/// Matched terms considered per document for the proximity bonus.
pub const PROXIMITY_MAX_TERMS: usize = 4;

/// Largest proximity multiplier is `1.0 + PROXIMITY_MAX_BONUS`.
pub const PROXIMITY_MAX_BONUS: f64 = 0.5;

/// Dense handle of a vocabulary entry.
pub type TermId = u32;

/// Highest weight at which a term appeared in each field category.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldWeights {
    pub question: f32,
    pub answer: f32,
    pub categories: f32,
}

impl FieldWeights {
    /// Weights with only `field` set.
    #[inline]
    pub fn single(field: Field, weight: f32) -> Self {
        let mut w = Self::default();
        w.raise(field, weight);
        w
    }

    /// Keeps the larger of the current and the new weight for `field`.
    #[inline]
    pub fn raise(&mut self, field: Field, weight: f32) {
        let slot = match field {
            Field::Question => &mut self.question,
            Field::Answer => &mut self.answer,
            Field::Categories => &mut self.categories,
        };
        if weight > *slot {
            *slot = weight;
        }
    }

    #[inline]
    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::Question => self.question,
            Field::Answer => self.answer,
            Field::Categories => self.categories,
        }
    }

    /// The weight used for scoring: the best field.
    #[inline(always)]
    pub fn max(&self) -> f32 {
        self.question.max(self.answer).max(self.categories)
    }
}

/// One term's occurrences in one document.
#[derive(Clone, Debug)]
pub struct Posting {
    pub doc_id: DocId,
    /// Occurrences across all fields.
    pub frequency: u32,
    /// Token index (unigrams) or window start (n-grams) of each occurrence,
    /// per field, in indexing order.
    pub positions: SmallVec<[u32; 4]>,
    pub weights: FieldWeights,
}

/// A vocabulary entry and its postings, sorted by `doc_id`.
#[derive(Debug)]
pub struct TermEntry {
    pub term: Box<str>,
    pub postings: Vec<Posting>,
}

impl TermEntry {
    /// Number of documents containing the term.
    #[inline(always)]
    pub fn document_frequency(&self) -> usize {
        self.postings.len()
    }

    /// Posting for `doc_id`, if the term occurs there.
    #[inline]
    pub fn posting(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| &self.postings[i])
    }
}

/// Summary of a [`InvertedIndex::build_index`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Documents added to the index.
    pub indexed: usize,
    /// Documents rejected as invalid input.
    pub rejected: usize,
}

/// In-memory inverted index over unigram, bigram and trigram stems.
///
/// The vocabulary is a term table: `term_ids` maps a term to its slot in
/// `terms`, and each slot owns a posting list sorted by document handle.
/// Slots emptied by removal become `None` so handles stay stable.
///
/// Searching takes `&self`, so a built index can be shared between
/// readers. Mutation (`build_index`, `add_document`, `remove_document`)
/// takes `&mut self` and therefore needs exclusive access.
pub struct InvertedIndex {
    pub(crate) terms: Vec<Option<TermEntry>>,
    pub(crate) term_ids: FxHashMap<Box<str>, TermId>,
    pub(crate) documents: DocArena,
    pub(crate) is_built: bool,
    /// Total number of queries executed
    pub(crate) query_count: AtomicU64,
    /// Total number of documents added
    pub(crate) documents_added: u64,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InvertedIndex {
    /// Creates a new, empty, unbuilt index.
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            term_ids: FxHashMap::default(),
            documents: DocArena::new(),
            is_built: false,
            query_count: AtomicU64::new(0),
            documents_added: 0,
        }
    }

    /// Returns the number of live documents in the index.
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the index contains no documents.
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns `true` once `build_index` has completed.
    #[inline(always)]
    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// Number of distinct terms.
    #[inline(always)]
    pub fn term_count(&self) -> usize {
        self.term_ids.len()
    }

    /// Removes all documents and terms and marks the index unbuilt.
    pub fn clear(&mut self) {
        self.terms.clear();
        self.term_ids.clear();
        self.documents.clear();
        self.is_built = false;
        self.query_count.store(0, Ordering::Relaxed);
        self.documents_added = 0;
    }

    /// Returns basic metrics about the index's operation.
    #[inline(always)]
    #[must_use]
    pub fn metrics(&self) -> EngineMetrics {
        EngineMetrics {
            documents_indexed: self.documents_added,
            queries_executed: self.query_count.load(Ordering::Relaxed),
            current_doc_count: self.documents.len() as u64,
        }
    }

    #[inline(always)]
    pub(crate) fn entry(&self, term_id: TermId) -> Option<&TermEntry> {
        self.terms.get(term_id as usize).and_then(Option::as_ref)
    }

    /// Live vocabulary entries in insertion order.
    #[inline]
    pub(crate) fn vocabulary(&self) -> impl Iterator<Item = (TermId, &TermEntry)> {
        self.terms
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|entry| (i as TermId, entry)))
    }

    /// Looks up a term's handle.
    #[inline]
    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.term_ids.get(term).copied()
    }

    /// Posting for (`term`, external document `id`), if any.
    pub fn posting(&self, term: &str, id: &str) -> Option<&Posting> {
        let doc_id = self.documents.find(id)?;
        self.entry(self.term_id(term)?)?.posting(doc_id)
    }
}

/// Basic operational metrics for the index.
#[derive(Debug, Clone, Copy)]
pub struct EngineMetrics {
    /// Total number of documents added (including those since removed).
    pub documents_indexed: u64,
    /// Total number of search queries executed.
    pub queries_executed: u64,
    /// Current number of documents in the index.
    pub current_doc_count: u64,
}
