//! Marks matched terms in result text.

use regex::{Regex, RegexBuilder};
use tracing::debug;

const OPEN: &str = "<mark>";
const CLOSE: &str = "</mark>";

/// Compiled patterns above this size are rejected and the text is returned
/// untouched.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Letters the normalizer folds, with the spellings they stand for.
fn variants(c: char) -> Option<&'static str> {
    Some(match c {
        'a' => "[aâ]",
        'c' => "[cç]",
        'g' => "[gğ]",
        'i' => "[iıİî]",
        'o' => "[oö]",
        's' => "[sş]",
        'u' => "[uüû]",
        _ => return None,
    })
}

/// Regex source for one index term: folded letters match their Turkish
/// spellings, spaces match any whitespace run, and the match runs on to the
/// end of the word so stems cover their inflected forms.
fn term_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() * 4);
    let mut in_space = false;
    for c in term.chars() {
        if c.is_whitespace() {
            if !in_space {
                pattern.push_str(r"\s+");
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match variants(c) {
            Some(class) => pattern.push_str(class),
            None => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push_str(r"\w*");
    pattern
}

fn build(terms: &[String]) -> Option<Regex> {
    let mut unique: Vec<&str> = Vec::with_capacity(terms.len());
    for term in terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !unique.contains(&term) {
            unique.push(term);
        }
    }
    if unique.is_empty() {
        return None;
    }
    // Longer terms first so a phrase wins over its own words.
    unique.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    let alternation = unique
        .iter()
        .map(|t| term_pattern(t))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|err| debug!(error = %err, "highlight pattern rejected"))
        .ok()
}

/// Wraps every occurrence of `terms` in `text` with `<mark>` tags.
///
/// Returns `text` unchanged when there is nothing to mark.
pub fn highlight(text: &str, terms: &[String]) -> String {
    match build(terms) {
        Some(re) => re
            .replace_all(text, |caps: &regex::Captures<'_>| {
                format!("{OPEN}{}{CLOSE}", &caps[0])
            })
            .into_owned(),
        None => text.to_string(),
    }
}
