//! Document table for the index.
//!
//! Postings refer to documents by a dense [`DocId`] rather than by their
//! external string id. This table owns the mapping in both directions:
//!
//! ```text
//! slots:   [ "f-12" ][ "f-7" ][ <removed> ][ "f-40" ] ...
//!             0         1         2           3
//! lookup:  "f-12" -> 0, "f-7" -> 1, "f-40" -> 3
//! ```
//!
//! - Insertion: O(1), handles are assigned in order
//! - Lookup by handle: O(1) slice index
//! - Lookup by external id: one hash lookup
//! - Removal leaves a tombstone; handles are never reused, which keeps
//!   every posting list sorted by handle without re-sorting

use fetva_types::{DocId, DocumentError};
use rustc_hash::FxHashMap;

#[derive(Debug)]
struct DocSlot {
    id: Box<str>,
    live: bool,
}

/// Dense table of indexed documents.
#[derive(Debug, Default)]
pub struct DocArena {
    slots: Vec<DocSlot>,
    lookup: FxHashMap<Box<str>, DocId>,
    live: usize,
}

impl DocArena {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table sized for `docs` documents.
    pub fn with_capacity(docs: usize) -> Self {
        Self {
            slots: Vec::with_capacity(docs),
            lookup: FxHashMap::with_capacity_and_hasher(docs, Default::default()),
            live: 0,
        }
    }

    /// Number of live documents.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no live documents remain.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drops every document and tombstone.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.lookup.clear();
        self.live = 0;
    }

    /// Registers an external id and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::DuplicateId` if a live document already has it.
    pub fn push(&mut self, id: &str) -> Result<DocId, DocumentError> {
        if self.lookup.contains_key(id) {
            return Err(DocumentError::DuplicateId { id: id.to_owned() });
        }

        let doc_id = self.slots.len() as DocId;
        self.slots.push(DocSlot {
            id: id.into(),
            live: true,
        });
        self.lookup.insert(id.into(), doc_id);
        self.live += 1;
        Ok(doc_id)
    }

    /// External id of a live document.
    #[inline(always)]
    pub fn get(&self, doc_id: DocId) -> Option<&str> {
        self.slots
            .get(doc_id as usize)
            .filter(|slot| slot.live)
            .map(|slot| &*slot.id)
    }

    /// Handle of a live document.
    #[inline]
    pub fn find(&self, id: &str) -> Option<DocId> {
        self.lookup.get(id).copied()
    }

    /// Tombstones a document and returns the handle it had.
    pub fn remove(&mut self, id: &str) -> Option<DocId> {
        let doc_id = self.lookup.remove(id)?;
        if let Some(slot) = self.slots.get_mut(doc_id as usize) {
            slot.live = false;
        }
        self.live -= 1;
        Some(doc_id)
    }
}
