//! Text analysis pipeline.
//!
//! This module provides the text processing components:
//! - **Normalizer**: Folds Turkish letters, lowercases, strips punctuation
//! - **Tokenizer**: Splits normalized text and drops short and stop words
//! - **Stemmer**: Strips common Turkish suffixes
//! - **Keywords**: Ranks stems by frequency
//! - **N-grams**: Joins adjacent stems into bigram/trigram terms

pub mod keywords;
pub mod ngram;
pub mod normalizer;
pub mod stemmer;
pub mod tokenizer;

pub use keywords::{extract_keywords, DEFAULT_MAX_KEYWORDS};
pub use ngram::{for_each_ngram, ngrams};
pub use normalizer::{normalize, normalize_into};
pub use stemmer::stem;
pub use tokenizer::{is_stop_word, tokenize, Field};

/// Tokenizes `text` and stems every token, keeping order.
pub fn stemmed_tokens(text: &str) -> Vec<String> {
    let mut tokens = tokenize(text);
    for token in &mut tokens {
        let len = stem(token).len();
        token.truncate(len);
    }
    tokens
}
