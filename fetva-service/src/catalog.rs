//! Lookup tables built next to the index from the same corpus pass.
//!
//! The catalog owns the documents in corpus order and answers everything
//! that does not need ranking: lookup by id, the exact keyword index used
//! by keyword search, keyword frequencies for autocomplete and stats, and
//! the category list.

use fetva_core::analyzer::normalize;
use fetva_core::analyzer::normalizer::fold_turkish;
use fetva_types::Document;
use rustc_hash::FxHashMap;
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A category with the number of documents filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    /// Position in the catalog ordering, starting at zero.
    pub order: usize,
    pub count: usize,
}

/// A keyword and the documents that list it.
#[derive(Debug, Clone)]
struct KeywordEntry {
    keyword: String,
    /// Positions into the document list, ascending, without repeats.
    documents: Vec<usize>,
    /// Times the keyword was listed across the corpus.
    count: usize,
}

/// Documents plus the auxiliary maps built alongside the index.
#[derive(Debug, Default)]
pub struct Catalog {
    documents: Vec<Document>,
    positions: FxHashMap<String, usize>,
    keywords: Vec<KeywordEntry>,
    keyword_slots: FxHashMap<String, usize>,
    /// Keyword slots by count, descending, first-seen order on ties.
    by_frequency: Vec<usize>,
    categories: Vec<Category>,
    category_slugs: FxHashMap<String, usize>,
}

/// Form used for keyword lookup: trimmed and lowercased.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// URL slug for a category name.
///
/// Turkish letters fold to ASCII and other accents are stripped. Every run
/// of other characters, `&` included, becomes one dash.
pub fn category_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    let folded = name.chars().map(fold_turkish).nfkd();
    for c in folded.filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("kategori");
    }
    slug
}

impl Catalog {
    /// Builds every table in one pass over `documents`.
    ///
    /// Assumes ids are unique, which the loader guarantees.
    pub fn build(documents: Vec<Document>) -> Self {
        let mut catalog = Catalog {
            positions: FxHashMap::with_capacity_and_hasher(documents.len(), Default::default()),
            ..Catalog::default()
        };
        let mut category_counts: Vec<(String, usize)> = Vec::new();
        let mut category_slots: FxHashMap<String, usize> = FxHashMap::default();

        for (position, document) in documents.iter().enumerate() {
            catalog.positions.insert(document.id.clone(), position);

            for category in &document.categories {
                match category_slots.get(category) {
                    Some(&slot) => category_counts[slot].1 += 1,
                    None => {
                        category_slots.insert(category.clone(), category_counts.len());
                        category_counts.push((category.clone(), 1));
                    }
                }
            }

            for keyword in &document.search_keywords {
                catalog.add_keyword(keyword, position);
            }
        }

        catalog.by_frequency = (0..catalog.keywords.len()).collect();
        let keywords = &catalog.keywords;
        catalog
            .by_frequency
            .sort_by(|&a, &b| keywords[b].count.cmp(&keywords[a].count));

        category_counts.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| normalize(&a.0).cmp(&normalize(&b.0)))
                .then_with(|| a.0.cmp(&b.0))
        });
        for (order, (name, count)) in category_counts.into_iter().enumerate() {
            let slug = category_slug(&name);
            catalog.category_slugs.entry(slug.clone()).or_insert(order);
            catalog.categories.push(Category {
                name,
                slug,
                order,
                count,
            });
        }

        catalog.documents = documents;
        catalog
    }

    fn add_keyword(&mut self, keyword: &str, position: usize) {
        let normalized = normalize_keyword(keyword);
        if normalized.is_empty() {
            return;
        }

        let slot = match self.keyword_slots.get(&normalized) {
            Some(&slot) => slot,
            None => {
                let slot = self.keywords.len();
                self.keyword_slots.insert(normalized.clone(), slot);
                self.keywords.push(KeywordEntry {
                    keyword: normalized,
                    documents: Vec::new(),
                    count: 0,
                });
                slot
            }
        };

        let entry = &mut self.keywords[slot];
        entry.count += 1;
        if entry.documents.last() != Some(&position) {
            entry.documents.push(position);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All documents in corpus order.
    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&i| &self.documents[i])
    }

    /// Positions of the documents listing `keyword` (already normalized).
    pub fn keyword_documents(&self, keyword: &str) -> &[usize] {
        self.keyword_slots
            .get(keyword)
            .map_or(&[], |&slot| self.keywords[slot].documents.as_slice())
    }

    /// Keywords with their counts, most frequent first.
    pub fn keywords_by_frequency(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.by_frequency.iter().map(|&slot| {
            let entry = &self.keywords[slot];
            (entry.keyword.as_str(), entry.count)
        })
    }

    /// Sum of all keyword counts.
    pub fn total_keywords(&self) -> usize {
        self.keywords.iter().map(|k| k.count).sum()
    }

    /// Categories by document count, descending, then by name.
    #[inline]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_by_slug(&self, slug: &str) -> Option<&Category> {
        self.category_slugs.get(slug).map(|&i| &self.categories[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::build(vec![
            Document::new("a", "Oruç", "x", vec!["İbadet".into(), "Oruç".into()])
                .with_keywords(vec!["oruc".into(), "Farz".into()]),
            Document::new("b", "Namaz", "x", vec!["İbadet".into()])
                .with_keywords(vec!["namaz".into(), "farz".into()]),
            Document::new("c", "Faiz", "x", vec!["Muamelat".into()])
                .with_keywords(vec!["faiz".into(), " ".into()]),
        ])
    }

    #[test]
    fn slugs() {
        assert_eq!(category_slug("İbadet"), "ibadet");
        assert_eq!(category_slug("Aile & Nikâh"), "aile-nikah");
        assert_eq!(category_slug("  Çocuk Eğitimi  "), "cocuk-egitimi");
        assert_eq!(category_slug("Şüphe/Vesvese"), "suphe-vesvese");
        assert_eq!(category_slug("Café"), "cafe");
        assert_eq!(category_slug("--"), "kategori");
    }

    #[test]
    fn keyword_normalization() {
        assert_eq!(normalize_keyword("  Namaz "), "namaz");
    }

    #[test]
    fn lookup_by_id() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.document("b").map(|d| d.question.as_str()), Some("Namaz"));
        assert!(catalog.document("z").is_none());
    }

    #[test]
    fn keyword_index_and_frequency() {
        let catalog = catalog();
        assert_eq!(catalog.keyword_documents("farz"), &[0, 1]);
        assert_eq!(catalog.keyword_documents("faiz"), &[2]);
        assert!(catalog.keyword_documents("").is_empty());

        let ranked: Vec<_> = catalog.keywords_by_frequency().collect();
        assert_eq!(ranked[0], ("farz", 2));
        assert_eq!(ranked[1], ("oruc", 1));
        assert_eq!(catalog.total_keywords(), 5);
    }

    #[test]
    fn categories_ordered_by_count_then_name() {
        let catalog = catalog();
        let names: Vec<_> = catalog.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["İbadet", "Muamelat", "Oruç"]);
        assert_eq!(catalog.categories()[0].count, 2);
        assert_eq!(catalog.categories()[2].order, 2);

        let category = catalog.category_by_slug("oruc").expect("slug exists");
        assert_eq!(category.name, "Oruç");
        assert!(catalog.category_by_slug("missing").is_none());
    }
}
