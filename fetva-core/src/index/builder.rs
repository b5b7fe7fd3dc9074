//! Per-document indexing.
//!
//! Every field of a document is analyzed on its own: its stems become
//! unigram terms, and adjacent stems become bigram and trigram terms at a
//! boosted weight. Contributions from all fields of one document merge into
//! a single posting per term.
//!
//! Handles are assigned in increasing order and never reused, so the
//! document being indexed always has the largest handle seen so far. Its
//! posting is therefore either the last entry of a term's list or absent,
//! and every list stays sorted without searching.

use fetva_types::DocId;
use smallvec::smallvec;

use crate::analyzer::{for_each_ngram, stemmed_tokens, Field};
use crate::index::types::{
    FieldWeights, InvertedIndex, Posting, TermEntry, TermId, BIGRAM_BOOST, TRIGRAM_BOOST,
};

impl InvertedIndex {
    /// Indexes one field's text at `weight`.
    ///
    /// Positions are indices into the field's own filtered token stream;
    /// n-gram positions are the index of their first stem.
    pub(crate) fn index_field(&mut self, doc_id: DocId, text: &str, field: Field, weight: f32) {
        let stems = stemmed_tokens(text);
        if stems.is_empty() {
            return;
        }

        for (pos, stem) in stems.iter().enumerate() {
            self.upsert(stem, doc_id, pos as u32, field, weight);
        }

        for_each_ngram(&stems, 2, |term, pos| {
            self.upsert(term, doc_id, pos, field, weight + BIGRAM_BOOST);
        });
        for_each_ngram(&stems, 3, |term, pos| {
            self.upsert(term, doc_id, pos, field, weight + TRIGRAM_BOOST);
        });
    }

    /// Records one occurrence of `term` in `doc_id`.
    fn upsert(&mut self, term: &str, doc_id: DocId, position: u32, field: Field, weight: f32) {
        let term_id = self.intern(term);
        let Some(entry) = self.terms[term_id as usize].as_mut() else {
            return;
        };

        match entry.postings.last_mut() {
            Some(posting) if posting.doc_id == doc_id => {
                posting.frequency += 1;
                posting.positions.push(position);
                posting.weights.raise(field, weight);
            }
            _ => {
                debug_assert!(
                    entry.postings.last().map_or(true, |p| p.doc_id < doc_id),
                    "postings must stay sorted by doc_id"
                );
                entry.postings.push(Posting {
                    doc_id,
                    frequency: 1,
                    positions: smallvec![position],
                    weights: FieldWeights::single(field, weight),
                });
            }
        }
    }

    /// Returns the handle for `term`, creating an empty entry if needed.
    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.term_ids.get(term) {
            return id;
        }

        let id = self.terms.len() as TermId;
        self.terms.push(Some(TermEntry {
            term: term.into(),
            postings: Vec::new(),
        }));
        self.term_ids.insert(term.into(), id);
        id
    }

    /// Drops `doc_id` from every posting list, and any term left without
    /// postings. Scans the whole vocabulary.
    pub(crate) fn purge_postings(&mut self, doc_id: DocId) -> usize {
        let mut emptied = 0;

        for slot in &mut self.terms {
            let Some(entry) = slot.as_mut() else {
                continue;
            };
            if let Ok(i) = entry.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
                entry.postings.remove(i);
            }
            if entry.postings.is_empty() {
                self.term_ids.remove(&entry.term);
                *slot = None;
                emptied += 1;
            }
        }

        emptied
    }
}
