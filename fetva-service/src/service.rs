//! The search service: one corpus, one index, many concurrent readers.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use fetva_core::analyzer::normalize;
use fetva_core::{BuildReport, IndexStats, InvertedIndex};
use fetva_types::{CorpusError, Document, SearchOptions, ServiceError, SortBy};
use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::FxHashSet;
use tracing::{debug, error, info, warn};

use crate::catalog::{normalize_keyword, Catalog, Category};
use crate::config::ServiceConfig;
use crate::corpus::{CorpusSource, JsonlCorpus, LoadReport};
use crate::highlight::highlight;
use crate::query::{KeywordCount, KeywordRequest, SearchHit, SearchRequest, SearchStats, SiteStats};
use crate::sort::sort_hits;
use crate::views::{LocalViewCounter, ViewBook, ViewCounter};

/// Categories listed in [`SiteStats::popular_categories`].
const POPULAR_CATEGORIES: usize = 5;
/// Keywords listed in [`SearchStats::most_common_keywords`].
const MOST_COMMON_KEYWORDS: usize = 20;
/// Default size of [`SearchService::autocomplete`] answers.
pub const DEFAULT_AUTOCOMPLETE_LIMIT: usize = 10;
/// Default size of [`SearchService::find_similar`] answers.
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;
/// Default size of [`SearchService::popular_documents`] answers.
pub const DEFAULT_POPULAR_LIMIT: usize = 10;

/// Everything built from one successful corpus load.
struct Snapshot {
    catalog: Catalog,
    index: RwLock<InvertedIndex>,
    report: LoadReport,
}

enum InitState {
    Uninitialized,
    Building { attempt: u64 },
    Ready(Arc<Snapshot>),
    Failed { attempt: u64, error: Arc<CorpusError> },
}

/// Puts the state back to `Uninitialized` if a build unwinds, so waiters
/// are released and the next caller can retry.
struct BuildGuard<'a> {
    service: &'a SearchService,
    armed: bool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.service.state.lock() = InitState::Uninitialized;
            self.service.settled.notify_all();
        }
    }
}

/// Search over a question/answer corpus.
///
/// Construct it once, call [`initialize`](Self::initialize) (from any
/// number of threads; concurrent calls share one build), then query it
/// from as many threads as needed. Every query method returns
/// [`ServiceError::NotInitialized`] until a build has succeeded.
pub struct SearchService {
    config: ServiceConfig,
    source: Box<dyn CorpusSource>,
    views: ViewBook,
    state: Mutex<InitState>,
    settled: Condvar,
    attempts: AtomicU64,
}

impl SearchService {
    /// A service reading the JSON Lines file named by `config.data_file`,
    /// with in-process view counts.
    pub fn new(config: ServiceConfig) -> Self {
        let source = JsonlCorpus::new(config.data_file.clone());
        Self::with_source(config, Box::new(source))
    }

    /// A service over any corpus source.
    pub fn with_source(config: ServiceConfig, source: Box<dyn CorpusSource>) -> Self {
        Self {
            config,
            source,
            views: ViewBook::new(Box::new(LocalViewCounter::new())),
            state: Mutex::new(InitState::Uninitialized),
            settled: Condvar::new(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Replaces the view-count store.
    pub fn with_view_counter(mut self, counter: Box<dyn ViewCounter>) -> Self {
        self.views = ViewBook::new(counter);
        self
    }

    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns `true` once a build has succeeded.
    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.lock(), InitState::Ready(_))
    }

    /// Loads the corpus and builds the index, once.
    ///
    /// Returns immediately when already built. A caller arriving while a
    /// build is running waits for it and gets its outcome. After a failed
    /// build the next caller starts a fresh attempt.
    ///
    /// # Errors
    ///
    /// `ServiceError::CorpusLoad` when the corpus cannot be read or has no
    /// valid record.
    pub fn initialize(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        let mut waited_on = None;
        let attempt = loop {
            let in_flight = match &*state {
                InitState::Ready(_) => return Ok(()),
                InitState::Failed { attempt, error } if Some(*attempt) == waited_on => {
                    return Err(ServiceError::CorpusLoad(Arc::clone(error)));
                }
                InitState::Building { attempt } => Some(*attempt),
                InitState::Uninitialized | InitState::Failed { .. } => None,
            };
            match in_flight {
                Some(running) => {
                    waited_on = Some(running);
                    self.settled.wait(&mut state);
                }
                None => break self.attempts.fetch_add(1, Ordering::Relaxed) + 1,
            }
        };
        *state = InitState::Building { attempt };
        drop(state);

        let mut guard = BuildGuard {
            service: self,
            armed: true,
        };
        let outcome = self.build(attempt);
        guard.armed = false;

        let mut state = self.state.lock();
        let result = match outcome {
            Ok(snapshot) => {
                *state = InitState::Ready(Arc::new(snapshot));
                Ok(())
            }
            Err(err) => {
                let error = Arc::new(err);
                *state = InitState::Failed {
                    attempt,
                    error: Arc::clone(&error),
                };
                Err(ServiceError::CorpusLoad(error))
            }
        };
        drop(state);
        self.settled.notify_all();
        result
    }

    fn build(&self, attempt: u64) -> Result<Snapshot, CorpusError> {
        let started = Instant::now();
        let loaded = self.source.load().map_err(|err| {
            error!(source = %self.source.describe(), attempt, error = %err, "corpus load failed");
            err
        })?;

        let mut index = InvertedIndex::new();
        let BuildReport { indexed, rejected } = index.build_index(&loaded.documents);
        let catalog = Catalog::build(loaded.documents);
        self.views.reset(catalog.documents());

        info!(
            source = %self.source.describe(),
            attempt,
            documents = indexed,
            rejected,
            skipped = loaded.report.skipped,
            categories = catalog.categories().len(),
            terms = index.term_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search service ready"
        );

        Ok(Snapshot {
            catalog,
            index: RwLock::new(index),
            report: loaded.report,
        })
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>, ServiceError> {
        match &*self.state.lock() {
            InitState::Ready(snapshot) => Ok(Arc::clone(snapshot)),
            _ => Err(ServiceError::NotInitialized),
        }
    }

    /// Summary of the corpus load behind the current index.
    pub fn load_report(&self) -> Result<LoadReport, ServiceError> {
        Ok(self.snapshot()?.report.clone())
    }

    /// Ranked search, or a browse of the whole corpus when the query has
    /// fewer than `min_query_chars` normalized characters.
    ///
    /// # Errors
    ///
    /// `ServiceError::NotInitialized` before a successful build, and
    /// `ServiceError::SearchExecution` if ranking fails unexpectedly.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ServiceError> {
        let snapshot = self.snapshot()?;
        let limit = request.limit.unwrap_or(self.config.default_limit);
        let category = request.category.as_deref().filter(|c| !c.trim().is_empty());

        if normalize(&request.query).chars().count() < self.config.min_query_chars {
            let documents: Vec<&Document> = snapshot
                .catalog
                .documents()
                .iter()
                .filter(|d| category.map_or(true, |c| d.has_category(c)))
                .collect();
            let mut hits = self.plain_hits(&documents);
            sort_hits(&mut hits, request.sort_by);
            return Ok(page(hits, request.offset, limit));
        }

        let started = Instant::now();
        let window = limit
            .saturating_mul(self.config.result_window_factor)
            .saturating_add(request.offset)
            .min(snapshot.catalog.len());
        let options = SearchOptions::fuzzy()
            .with_max_results(window)
            .with_min_score(request.min_score.unwrap_or(self.config.default_min_score));

        let ranked = panic::catch_unwind(AssertUnwindSafe(|| {
            snapshot.index.read().search(&request.query, &options)
        }));
        let results = match ranked {
            Ok(results) => results?,
            Err(payload) => {
                error!(
                    query = %request.query,
                    panic = panic_message(payload.as_ref()),
                    "search failed"
                );
                return Err(ServiceError::SearchExecution);
            }
        };

        let mut matches: Vec<(&Document, f64, Vec<String>)> = Vec::with_capacity(results.len());
        for result in results {
            let Some(document) = snapshot.catalog.document(&result.id) else {
                continue;
            };
            if category.map_or(true, |c| document.has_category(c)) {
                matches.push((document, result.score, result.matched_terms));
            }
        }

        let documents: Vec<&Document> = matches.iter().map(|(d, _, _)| *d).collect();
        let views = self.views.resolve(&documents);
        let mut hits: Vec<SearchHit> = matches
            .into_iter()
            .zip(views)
            .map(|((document, score, matched_terms), views)| SearchHit {
                document: with_views(document, views),
                score,
                matched_terms,
                highlighted_question: None,
                highlighted_answer: None,
            })
            .collect();

        sort_hits(&mut hits, request.sort_by);
        let total = hits.len();
        let mut hits = page(hits, request.offset, limit);
        for hit in &mut hits {
            mark(hit);
        }

        debug!(
            query = %request.query,
            matched = total,
            returned = hits.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "search"
        );
        Ok(hits)
    }

    /// Documents listing any of the given keywords verbatim (after trimming
    /// and lowercasing). A hit's score is the number of request keywords the
    /// document lists.
    pub fn search_by_keywords(
        &self,
        request: &KeywordRequest,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let snapshot = self.snapshot()?;
        let catalog = &snapshot.catalog;
        let limit = request.limit.unwrap_or(self.config.default_limit);
        let category = request.category.as_deref().filter(|c| !c.trim().is_empty());

        let mut keywords: Vec<String> = Vec::with_capacity(request.keywords.len());
        for keyword in request.keywords.iter().map(|k| normalize_keyword(k)) {
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut matched: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for keyword in &keywords {
            for &position in catalog.keyword_documents(keyword) {
                matched.entry(position).or_default().push(keyword.clone());
            }
        }

        let rows: Vec<(&Document, Vec<String>)> = matched
            .into_iter()
            .map(|(position, terms)| (&catalog.documents()[position], terms))
            .filter(|(d, _)| category.map_or(true, |c| d.has_category(c)))
            .collect();
        let documents: Vec<&Document> = rows.iter().map(|(d, _)| *d).collect();
        let views = self.views.resolve(&documents);

        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .zip(views)
            .map(|((document, terms), views)| SearchHit {
                document: with_views(document, views),
                score: terms.len() as f64,
                matched_terms: terms,
                highlighted_question: None,
                highlighted_answer: None,
            })
            .collect();

        sort_hits(&mut hits, request.sort_by);
        let mut hits = page(hits, request.offset, limit);
        for hit in &mut hits {
            mark(hit);
        }
        Ok(hits)
    }

    /// Documents similar to `text`, best first.
    ///
    /// Never comes back empty for a non-empty corpus: a blank text, a
    /// search failure or zero hits all fall back to the most viewed
    /// documents.
    pub fn find_similar(&self, text: &str, limit: usize) -> Result<Vec<Document>, ServiceError> {
        self.snapshot()?;
        let text = text.trim();
        if text.is_empty() {
            return self.popular_documents(limit);
        }

        let request = SearchRequest::new(text)
            .limit(limit.saturating_mul(2))
            .sort_by(SortBy::Relevance);
        let hits = match self.search(&request) {
            Ok(hits) => hits,
            Err(err) => {
                warn!(error = %err, "similar search failed, falling back to popular");
                return self.popular_documents(limit);
            }
        };

        let mut seen = FxHashSet::default();
        let similar: Vec<Document> = hits
            .into_iter()
            .filter(|hit| seen.insert(hit.document.id.clone()))
            .take(limit)
            .map(|hit| hit.document)
            .collect();

        if similar.is_empty() {
            return self.popular_documents(limit);
        }
        Ok(similar)
    }

    /// Completions for a partial query, at most `limit` of them.
    ///
    /// Sources, in order: questions starting with the input, index terms
    /// extending it, then precomputed keywords starting with it (most
    /// frequent first). Duplicates are dropped.
    pub fn autocomplete(&self, partial: &str, limit: usize) -> Result<Vec<String>, ServiceError> {
        let snapshot = self.snapshot()?;
        let prefix = partial.trim().to_lowercase();
        if prefix.chars().count() < self.config.autocomplete_min_chars || limit == 0 {
            return Ok(Vec::new());
        }

        let mut out = Suggestions::new(limit);
        for document in snapshot.catalog.documents() {
            if out.is_full() {
                break;
            }
            if document.question.to_lowercase().starts_with(&prefix) {
                out.push(&document.question);
            }
        }

        if !out.is_full() {
            let terms = snapshot
                .index
                .read()
                .get_suggestions(&prefix, limit.saturating_mul(2));
            for term in &terms {
                out.push(term);
            }
        }

        if !out.is_full() {
            for (keyword, _) in snapshot.catalog.keywords_by_frequency() {
                if out.is_full() {
                    break;
                }
                if keyword.starts_with(&prefix) {
                    out.push(keyword);
                }
            }
        }

        Ok(out.items)
    }

    /// A document by id, with its runtime view count.
    pub fn document(&self, id: &str) -> Result<Option<Document>, ServiceError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .catalog
            .document(id)
            .map(|d| with_views(d, self.views.resolve_one(d))))
    }

    /// Every document in corpus order, with runtime view counts.
    pub fn documents(&self) -> Result<Vec<Document>, ServiceError> {
        let snapshot = self.snapshot()?;
        let documents: Vec<&Document> = snapshot.catalog.documents().iter().collect();
        Ok(self.with_runtime_views(&documents))
    }

    /// Documents carrying `category` verbatim, in corpus order.
    pub fn documents_by_category(&self, category: &str) -> Result<Vec<Document>, ServiceError> {
        let snapshot = self.snapshot()?;
        let documents: Vec<&Document> = snapshot
            .catalog
            .documents()
            .iter()
            .filter(|d| d.has_category(category))
            .collect();
        Ok(self.with_runtime_views(&documents))
    }

    /// Categories by document count, largest first.
    pub fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.snapshot()?.catalog.categories().to_vec())
    }

    pub fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, ServiceError> {
        Ok(self.snapshot()?.catalog.category_by_slug(slug).cloned())
    }

    /// The most viewed documents, likes breaking ties.
    pub fn popular_documents(&self, limit: usize) -> Result<Vec<Document>, ServiceError> {
        let snapshot = self.snapshot()?;
        let documents: Vec<&Document> = snapshot.catalog.documents().iter().collect();
        let mut ranked = self.with_runtime_views(&documents);
        ranked.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| b.likes.cmp(&a.likes)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Records a view of `id`.
    pub fn increment_views(&self, id: &str) -> Result<(), ServiceError> {
        self.snapshot()?;
        self.views.increment(id);
        Ok(())
    }

    pub fn site_stats(&self) -> Result<SiteStats, ServiceError> {
        let snapshot = self.snapshot()?;
        let catalog = &snapshot.catalog;
        let documents: Vec<&Document> = catalog.documents().iter().collect();
        let total_views = self.views.resolve(&documents).into_iter().sum();

        Ok(SiteStats {
            total_documents: catalog.len(),
            total_categories: catalog.categories().len(),
            total_views,
            popular_categories: catalog
                .categories()
                .iter()
                .take(POPULAR_CATEGORIES)
                .map(|c| c.name.clone())
                .collect(),
        })
    }

    pub fn search_stats(&self) -> Result<SearchStats, ServiceError> {
        let snapshot = self.snapshot()?;
        let catalog = &snapshot.catalog;
        let total_keywords = catalog.total_keywords();
        let average = if catalog.is_empty() {
            0.0
        } else {
            total_keywords as f64 / catalog.len() as f64
        };
        let index = snapshot.index.read().stats();

        Ok(SearchStats {
            total_documents: catalog.len(),
            total_keywords,
            average_keywords_per_document: average,
            most_common_keywords: catalog
                .keywords_by_frequency()
                .take(MOST_COMMON_KEYWORDS)
                .map(|(keyword, count)| KeywordCount {
                    keyword: keyword.to_string(),
                    count,
                })
                .collect(),
            index,
        })
    }

    /// Statistics of the inverted index.
    pub fn stats(&self) -> Result<IndexStats, ServiceError> {
        let snapshot = self.snapshot()?;
        let stats = snapshot.index.read().stats();
        Ok(stats)
    }

    /// Drops a document from the ranked index. Catalog lookups and keyword
    /// search still see it. Returns `false` for an unknown id.
    pub fn remove_document(&self, id: &str) -> Result<bool, ServiceError> {
        let snapshot = self.snapshot()?;
        let removed = snapshot.index.write().remove_document(id);
        Ok(removed)
    }

    fn with_runtime_views(&self, documents: &[&Document]) -> Vec<Document> {
        let views = self.views.resolve(documents);
        documents
            .iter()
            .zip(views)
            .map(|(document, views)| with_views(document, views))
            .collect()
    }

    fn plain_hits(&self, documents: &[&Document]) -> Vec<SearchHit> {
        self.with_runtime_views(documents)
            .into_iter()
            .map(SearchHit::plain)
            .collect()
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("source", &self.source.describe())
            .field("initialized", &self.is_initialized())
            .field("views", &self.views)
            .finish()
    }
}

/// Deduplicating, bounded suggestion list.
struct Suggestions {
    items: Vec<String>,
    seen: FxHashSet<String>,
    limit: usize,
}

impl Suggestions {
    fn new(limit: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit),
            seen: FxHashSet::default(),
            limit,
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    fn push(&mut self, item: &str) {
        if !self.is_full() && self.seen.insert(item.to_string()) {
            self.items.push(item.to_string());
        }
    }
}

fn with_views(document: &Document, views: u64) -> Document {
    let mut document = document.clone();
    document.views = views;
    document
}

fn mark(hit: &mut SearchHit) {
    if hit.matched_terms.is_empty() {
        return;
    }
    hit.highlighted_question = Some(highlight(&hit.document.question, &hit.matched_terms));
    hit.highlighted_answer = Some(highlight(&hit.document.answer, &hit.matched_terms));
}

fn page<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
