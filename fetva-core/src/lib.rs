//! In-memory full-text search over Turkish question/answer documents.
//!
//! - [`analyzer`]: normalization, tokenization, stemming, keywords, n-grams
//! - [`arena`]: the document table behind index handles
//! - [`index`]: the inverted index, ranking, fuzzy matching, suggestions

pub mod analyzer;
pub mod arena;
pub mod index;

pub use fetva_types as types;
pub use index::{BuildReport, IndexStats, InvertedIndex};
