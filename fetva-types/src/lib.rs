//! Core types and errors for the fetva search engine.
//!
//! This crate holds the plain data that crosses crate boundaries:
//!
//! - **Documents**: the corpus records handed to the index
//! - **Results**: ranked hits produced by the index
//! - **Options**: knobs for a single ranking pass and result ordering
//! - **Errors**: the failure taxonomy shared by the core and the service
//!
//! Nothing here depends on the index internals, so the service layer and
//! any host application can share these types without pulling the engine.

#![warn(missing_docs)]

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Dense document handle inside an index.
///
/// Handles are assigned in insertion order and never reused, so a removed
/// document leaves a hole rather than shifting its neighbours.
pub type DocId = u32;

/// A question/answer record, the unit of searchable content.
///
/// Three fields are indexed at different weights: the question (primary),
/// the answer (secondary) and the categories (tags). The optional Arabic
/// text is indexed into the answer category at an intermediate weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Stable, corpus-unique identifier.
    pub id: String,
    /// Ordinal of the record in its source file.
    #[serde(rename = "q_in_file")]
    pub q_in_file: u64,
    /// Short, high-weight field.
    pub question: String,
    /// Long, low-weight field.
    pub answer: String,
    /// Category names, indexed as tags.
    pub categories: Vec<String>,
    /// Quoted or transliterated source text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
    /// Precomputed keywords used by exact keyword lookup.
    #[serde(default)]
    pub search_keywords: Vec<String>,
    /// Where the answer was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Publication date as found in the corpus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// View count shipped with the corpus.
    #[serde(default)]
    pub views: u64,
    /// Like count shipped with the corpus.
    #[serde(default)]
    pub likes: u64,
    /// Bibliographic references.
    #[serde(default)]
    pub references: Vec<String>,
    /// Ids of related records.
    #[serde(default)]
    pub related_fatwas: Vec<String>,
}

impl Document {
    /// Creates a document with the required fields and empty metadata.
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            categories,
            ..Self::default()
        }
    }

    /// Sets the Arabic text.
    pub fn with_arabic_text(mut self, text: impl Into<String>) -> Self {
        self.arabic_text = Some(text.into());
        self
    }

    /// Sets the precomputed keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.search_keywords = keywords;
        self
    }

    /// Sets the publication date string.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the base view count.
    pub fn with_views(mut self, views: u64) -> Self {
        self.views = views;
        self
    }

    /// Sets the base like count.
    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    /// Returns `true` if the category list contains `name` verbatim.
    #[inline]
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

/// A ranked hit from the inverted index.
///
/// Scores are relative: they only order hits of the same query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Index handle of the matched document.
    pub doc_id: DocId,
    /// External identifier of the matched document.
    pub id: String,
    /// Relevance score (higher is better, never negative).
    pub score: f64,
    /// Index terms that contributed to the score, in first-match order.
    pub matched_terms: Vec<String>,
}

impl SearchResult {
    /// Ordering that puts the best hit first.
    ///
    /// Primary: score, descending. Secondary: external id, ascending, so
    /// exactly equal scores never depend on hash-map iteration order.
    #[inline]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id && self.score == other.score
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} score={:.3}", self.id, self.score)
    }
}

/// Options for a single ranking pass over the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Fall back to prefix/edit-distance matching when a term has no exact hit.
    pub fuzzy: bool,
    /// Stem query tokens before lookup.
    pub stemming: bool,
    /// Upper bound on returned hits.
    pub max_results: usize,
    /// Hits scoring below this are dropped.
    pub min_score: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fuzzy: false,
            stemming: true,
            max_results: 100,
            min_score: 0.1,
        }
    }
}

impl SearchOptions {
    /// Exact lookups only.
    pub const fn exact() -> Self {
        Self {
            fuzzy: false,
            stemming: true,
            max_results: 100,
            min_score: 0.1,
        }
    }

    /// Fuzzy lookups with stemming, as the service issues them.
    pub const fn fuzzy() -> Self {
        Self {
            fuzzy: true,
            stemming: true,
            max_results: 100,
            min_score: 0.1,
        }
    }

    /// Replaces the result cap.
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Replaces the score threshold.
    pub const fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Result ordering requested by a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Score, descending.
    #[default]
    Relevance,
    /// Publication date, newest first; undated records last.
    Date,
    /// View count, descending.
    Popular,
    /// View count, descending.
    Views,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "date" => Ok(SortBy::Date),
            "popular" => Ok(SortBy::Popular),
            "views" => Ok(SortBy::Views),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "date",
            SortBy::Popular => "popular",
            SortBy::Views => "views",
        };
        f.write_str(name)
    }
}

/// Errors raised when a document is rejected by the index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The document has no identifier.
    #[error("document has an empty id")]
    MissingId,
    /// Both the question and the answer are empty.
    #[error("document {id} has neither question nor answer text")]
    EmptyText {
        /// Identifier of the rejected document.
        id: String,
    },
    /// Another live document already uses this identifier.
    #[error("duplicate document id: {id}")]
    DuplicateId {
        /// The clashing identifier.
        id: String,
    },
}

/// Errors raised by the inverted index itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The index was queried before `build_index` completed.
    #[error("search index must be built before searching")]
    NotBuilt,
}

/// Errors raised while loading a corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// The corpus could not be opened or read.
    #[error("unable to read corpus at {path}: {source}")]
    Io {
        /// Path of the corpus.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The corpus was readable but produced no valid records.
    #[error("no valid records found in corpus {path}")]
    Empty {
        /// Path of the corpus.
        path: String,
    },
    /// A single record failed validation.
    #[error("malformed record at line {line}: {reason}")]
    Malformed {
        /// 1-based line number of the record.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised by an external view-count store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewCountError {
    /// The store could not be reached or refused the request.
    #[error("view count store unavailable: {reason}")]
    Unavailable {
        /// What went wrong.
        reason: String,
    },
}

/// Errors surfaced at the search service boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// An operation was called before a successful initialization.
    #[error("search service must be initialized before use")]
    NotInitialized,
    /// The corpus could not be loaded; the next call may retry.
    #[error("failed to initialize search service: {0}")]
    CorpusLoad(Arc<CorpusError>),
    /// The index rejected the operation.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// Ranking failed unexpectedly. Details are logged, not returned.
    #[error("search failed due to an internal error")]
    SearchExecution,
}
