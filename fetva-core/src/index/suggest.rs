//! Prefix suggestions over the vocabulary.

use crate::analyzer::normalize;
use crate::index::types::InvertedIndex;

/// Default number of suggestions.
pub const DEFAULT_SUGGESTIONS: usize = 5;

impl InvertedIndex {
    /// Index terms that strictly extend `partial`.
    ///
    /// The partial query is normalized but not stemmed. Terms equal to it
    /// are excluded. Ranked by the number of documents containing the
    /// term, then alphabetically. An empty prefix yields the most frequent
    /// terms.
    pub fn get_suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        let prefix = normalize(partial);
        if limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<(&str, usize)> = self
            .vocabulary()
            .filter(|(_, entry)| entry.term.len() > prefix.len() && entry.term.starts_with(&prefix))
            .map(|(_, entry)| (&*entry.term, entry.document_frequency()))
            .collect();

        hits.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        hits.truncate(limit);
        hits.into_iter().map(|(term, _)| term.to_owned()).collect()
    }
}
