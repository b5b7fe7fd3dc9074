//! Keyword extraction by stem frequency.

use rustc_hash::FxHashMap;

use crate::analyzer::stemmer::stem;
use crate::analyzer::tokenizer::tokenize;

/// Default number of keywords kept per text.
pub const DEFAULT_MAX_KEYWORDS: usize = 20;

/// Returns the `max_keywords` most frequent stems of `text`.
///
/// Ties keep first-occurrence order.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let tokens = tokenize(text);

    // stem -> slot in `counts`
    let mut slots: FxHashMap<&str, usize> = FxHashMap::default();
    let mut counts: Vec<(&str, u32)> = Vec::new();

    for token in &tokens {
        let stemmed = stem(token);
        match slots.get(stemmed) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(stemmed, counts.len());
                counts.push((stemmed, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max_keywords)
        .map(|(stemmed, _)| stemmed.to_owned())
        .collect()
}
