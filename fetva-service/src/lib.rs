//! Corpus loading and search orchestration on top of `fetva-core`.
//!
//! - [`config`]: service settings and the `DATA_FILE` override
//! - [`corpus`]: the JSON Lines loader behind [`CorpusSource`]
//! - [`catalog`]: documents, keyword lookup and categories
//! - [`views`]: view counts with store fallbacks
//! - [`service`]: [`SearchService`], the entry point
//!
//! ```no_run
//! use fetva_service::{SearchRequest, SearchService, ServiceConfig};
//!
//! let service = SearchService::new(ServiceConfig::from_env());
//! service.initialize()?;
//! for hit in service.search(&SearchRequest::new("oruç farz mıdır").limit(5))? {
//!     println!("{} {:.2}", hit.document.question, hit.score);
//! }
//! # Ok::<(), fetva_service::ServiceError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod corpus;
pub mod highlight;
pub mod query;
pub mod service;
pub mod sort;
pub mod views;

pub use catalog::Category;
pub use config::ServiceConfig;
pub use corpus::{CorpusSource, JsonlCorpus, LoadReport, LoadedCorpus, MemoryCorpus};
pub use fetva_types::{Document, ServiceError, SortBy};
pub use query::{KeywordCount, KeywordRequest, SearchHit, SearchRequest, SearchStats, SiteStats};
pub use service::SearchService;
pub use views::{LocalViewCounter, ViewCounter};
