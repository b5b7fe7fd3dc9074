//! Request and response shapes of the service API.

use fetva_core::IndexStats;
use fetva_types::{Document, SortBy};
use serde::Serialize;

/// A ranked search, or a browse when the query is too short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Keep only documents carrying this category verbatim.
    pub category: Option<String>,
    pub sort_by: SortBy,
    /// Page size. `None` uses the configured default.
    pub limit: Option<usize>,
    pub offset: usize,
    /// Score floor. `None` uses the configured default.
    pub min_score: Option<f64>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }
}

/// Exact lookup over the precomputed keywords.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRequest {
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub sort_by: SortBy,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Default for KeywordRequest {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            category: None,
            sort_by: SortBy::Views,
            limit: None,
            offset: 0,
        }
    }
}

impl KeywordRequest {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// One result row. `document.views` holds the runtime count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub document: Document,
    pub score: f64,
    pub matched_terms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_answer: Option<String>,
}

impl SearchHit {
    /// A hit with no score and nothing highlighted.
    pub fn plain(document: Document) -> Self {
        Self {
            document,
            score: 0.0,
            matched_terms: Vec::new(),
            highlighted_question: None,
            highlighted_answer: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.document.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub total_documents: usize,
    pub total_categories: usize,
    pub total_views: u64,
    /// Names of the largest categories.
    pub popular_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_documents: usize,
    pub total_keywords: usize,
    pub average_keywords_per_document: f64,
    pub most_common_keywords: Vec<KeywordCount>,
    pub index: IndexStats,
}
