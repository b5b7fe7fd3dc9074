//! View counts.
//!
//! Counts live in a [`ViewCounter`] outside the search core. The service
//! never fails a query because of it: [`ViewBook`] resolves counts in one
//! batch per call and falls back to cached or local numbers when the store
//! errors.

use fetva_types::{Document, ViewCountError};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::warn;

/// A store of per-document view counts.
pub trait ViewCounter: Send + Sync {
    /// Current count for `id`. Zero means the store has no count for it.
    fn view_count(&self, id: &str) -> Result<u64, ViewCountError>;

    /// Counts for several ids, in the same order.
    fn view_counts(&self, ids: &[&str]) -> Result<Vec<u64>, ViewCountError> {
        ids.iter().map(|id| self.view_count(id)).collect()
    }

    /// Records one view and returns the new count.
    fn increment(&self, id: &str) -> Result<u64, ViewCountError>;

    /// Called once per successful corpus load with each document's shipped
    /// count. Stores that keep their own totals ignore it.
    fn seed(&self, _base: &[(&str, u64)]) {}
}

/// In-process counter used when no external store is configured.
#[derive(Debug, Default)]
pub struct LocalViewCounter {
    counts: RwLock<FxHashMap<String, u64>>,
}

impl LocalViewCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewCounter for LocalViewCounter {
    fn view_count(&self, id: &str) -> Result<u64, ViewCountError> {
        Ok(self.counts.read().get(id).copied().unwrap_or(0))
    }

    fn view_counts(&self, ids: &[&str]) -> Result<Vec<u64>, ViewCountError> {
        let counts = self.counts.read();
        Ok(ids
            .iter()
            .map(|id| counts.get(*id).copied().unwrap_or(0))
            .collect())
    }

    fn increment(&self, id: &str) -> Result<u64, ViewCountError> {
        let mut counts = self.counts.write();
        let count = counts.entry(id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn seed(&self, base: &[(&str, u64)]) {
        let mut counts = self.counts.write();
        for &(id, views) in base {
            counts.entry(id.to_string()).or_insert(views);
        }
    }
}

/// Resolves runtime view counts on top of a [`ViewCounter`].
pub struct ViewBook {
    counter: Box<dyn ViewCounter>,
    /// Views recorded while the store was failing.
    overrides: Mutex<FxHashMap<String, u64>>,
    /// Last count the store returned per id.
    last_known: Mutex<FxHashMap<String, u64>>,
}

impl ViewBook {
    pub fn new(counter: Box<dyn ViewCounter>) -> Self {
        Self {
            counter,
            overrides: Mutex::new(FxHashMap::default()),
            last_known: Mutex::new(FxHashMap::default()),
        }
    }

    /// Drops local state and hands the shipped counts to the store.
    pub fn reset<'a, I>(&self, documents: I)
    where
        I: IntoIterator<Item = &'a Document>,
    {
        self.overrides.lock().clear();
        self.last_known.lock().clear();
        let base: Vec<(&str, u64)> = documents
            .into_iter()
            .map(|d| (d.id.as_str(), d.views))
            .collect();
        self.counter.seed(&base);
    }

    /// Runtime counts for `documents`, in order, with one store call.
    pub fn resolve(&self, documents: &[&Document]) -> Vec<u64> {
        if documents.is_empty() {
            return Vec::new();
        }
        let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();

        let fetched = match self.counter.view_counts(&ids) {
            Ok(counts) if counts.len() == ids.len() => Ok(counts),
            Ok(counts) => Err(ViewCountError::Unavailable {
                reason: format!("store returned {} counts for {} ids", counts.len(), ids.len()),
            }),
            Err(err) => Err(err),
        };

        let overrides = self.overrides.lock();
        let mut last_known = self.last_known.lock();
        match fetched {
            Ok(counts) => documents
                .iter()
                .zip(counts)
                .map(|(document, external)| {
                    if external > 0 {
                        last_known.insert(document.id.clone(), external);
                        external
                    } else {
                        document.views + overrides.get(&document.id).copied().unwrap_or(0)
                    }
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, documents = documents.len(), "view counts unavailable, using cached values");
                documents
                    .iter()
                    .map(|document| match last_known.get(&document.id) {
                        Some(&count) => count,
                        None => document.views + overrides.get(&document.id).copied().unwrap_or(0),
                    })
                    .collect()
            }
        }
    }

    /// Runtime count for a single document.
    pub fn resolve_one(&self, document: &Document) -> u64 {
        self.resolve(&[document]).first().copied().unwrap_or(document.views)
    }

    /// Records a view. A store failure is logged and kept as a local override.
    pub fn increment(&self, id: &str) {
        if let Err(err) = self.counter.increment(id) {
            warn!(id, error = %err, "failed to record view, keeping it locally");
            *self.overrides.lock().entry(id.to_string()).or_insert(0) += 1;
        }
    }
}

impl std::fmt::Debug for ViewBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewBook")
            .field("overrides", &self.overrides.lock().len())
            .field("last_known", &self.last_known.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counter that can be switched off and counts batch calls.
    #[derive(Default)]
    struct FlakyCounter {
        inner: LocalViewCounter,
        down: AtomicBool,
        batches: AtomicUsize,
    }

    impl ViewCounter for Arc<FlakyCounter> {
        fn view_count(&self, id: &str) -> Result<u64, ViewCountError> {
            self.view_counts(&[id]).map(|c| c[0])
        }

        fn view_counts(&self, ids: &[&str]) -> Result<Vec<u64>, ViewCountError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(ViewCountError::Unavailable {
                    reason: "offline".into(),
                });
            }
            self.inner.view_counts(ids)
        }

        fn increment(&self, id: &str) -> Result<u64, ViewCountError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(ViewCountError::Unavailable {
                    reason: "offline".into(),
                });
            }
            self.inner.increment(id)
        }
    }

    fn doc(id: &str, views: u64) -> Document {
        Document::new(id, "soru", "cevap", vec!["Genel".into()]).with_views(views)
    }

    #[test]
    fn local_counter_seeds_and_increments() {
        let counter = LocalViewCounter::new();
        counter.seed(&[("a", 10)]);
        assert_eq!(counter.increment("a"), Ok(11));
        assert_eq!(counter.increment("b"), Ok(1));
        assert_eq!(counter.view_counts(&["a", "b", "c"]), Ok(vec![11, 1, 0]));
    }

    #[test]
    fn external_count_wins_when_positive() {
        let counter = LocalViewCounter::new();
        counter.increment("a").unwrap();
        let book = ViewBook::new(Box::new(counter));

        let (a, b) = (doc("a", 50), doc("b", 7));
        assert_eq!(book.resolve(&[&a, &b]), vec![1, 7]);
        assert_eq!(book.resolve_one(&b), 7);
    }

    #[test]
    fn one_batch_per_resolve() {
        let flaky = Arc::new(FlakyCounter::default());
        let book = ViewBook::new(Box::new(Arc::clone(&flaky)));
        let docs = [doc("a", 1), doc("b", 2), doc("c", 3)];
        let refs: Vec<&Document> = docs.iter().collect();

        book.resolve(&refs);
        assert_eq!(flaky.batches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_fall_back_to_last_known_then_local() {
        let flaky = Arc::new(FlakyCounter::default());
        flaky.inner.seed(&[("a", 40)]);
        let book = ViewBook::new(Box::new(Arc::clone(&flaky)));
        let (a, b) = (doc("a", 5), doc("b", 5));

        assert_eq!(book.resolve(&[&a, &b]), vec![40, 5]);

        flaky.down.store(true, Ordering::SeqCst);
        book.increment("b");
        book.increment("b");
        assert_eq!(book.resolve(&[&a, &b]), vec![40, 7]);
    }

    #[test]
    fn reset_clears_overrides_and_seeds() {
        let flaky = Arc::new(FlakyCounter::default());
        flaky.down.store(true, Ordering::SeqCst);
        let book = ViewBook::new(Box::new(Arc::clone(&flaky)));
        book.increment("a");

        let a = doc("a", 3);
        assert_eq!(book.resolve_one(&a), 4);

        flaky.down.store(false, Ordering::SeqCst);
        book.reset([&a]);
        assert_eq!(book.resolve_one(&a), 3);
    }
}
