//! Heuristic Turkish suffix stripper.
//!
//! Not a morphological analyzer: there is no dictionary and no vowel
//! harmony model. A word loses at most one suffix per pass, taken from a
//! fixed list tried longest-first, and only if more than two characters
//! remain. Words still longer than eight characters get one more pass.
//! The result groups common inflections of the same word together and is
//! lossy for everything else.
//!
//! Input is expected in normalized form, so the list only carries folded
//! spellings (`nın`/`nin` are both `nin`, and so on).

/// Suffixes in the order they are tried: longest first.
///
/// Plural, case, genitive, possessive/person, question, verbal and
/// derivational endings. Folding makes endings spelled with `ş`, `ğ` or `ü`
/// (`mis`, `mus`, `digi`, `dugu`) strippable from normalized words.
pub const SUFFIXES: &[&str] = &[
    // 5
    "misin", "musun",
    // 4
    "ndan", "nden", "ecek", "acak", "erek", "arak", "ince", "digi", "dugu",
    // 3
    "lar", "ler", "dan", "den", "tan", "ten", "nin", "nun", "miz", "muz",
    "sin", "sun", "mek", "mak", "yor", "mis", "mus", "lik", "luk", "sel", "sal",
    // 2
    "ya", "ye", "im", "um", "iz", "uz", "mi", "mu", "di", "du",
    "em", "am", "ar", "er", "ci", "cu", "en", "an",
    // 1
    "a", "e", "i", "u",
];

/// Stems longer than this get a second stripping pass.
pub const SECOND_PASS_MIN_CHARS: usize = 8;

/// Characters that must remain after a suffix is removed, exclusive.
const MIN_REMAINDER_CHARS: usize = 2;

/// Removes the first matching suffix, if the remainder stays long enough.
#[inline]
fn strip_once(word: &str) -> &str {
    let chars = word.chars().count();
    for suffix in SUFFIXES {
        // Suffixes are ASCII, so byte length equals char length.
        if chars > suffix.len() + MIN_REMAINDER_CHARS && word.ends_with(suffix) {
            return &word[..word.len() - suffix.len()];
        }
    }
    word
}

/// Stems a normalized word.
///
/// Returns a prefix of `word`; never allocates and never lengthens.
#[inline]
pub fn stem(word: &str) -> &str {
    let stemmed = strip_once(word);
    if stemmed.chars().count() > SECOND_PASS_MIN_CHARS {
        strip_once(stemmed)
    } else {
        stemmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn suffixes_sorted_longest_first() {
        for pair in SUFFIXES.windows(2) {
            assert!(pair[0].len() >= pair[1].len(), "{} before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn suffixes_are_folded_ascii() {
        assert!(SUFFIXES.iter().all(|s| s.is_ascii()));
    }

    #[test]
    fn strips_common_endings() {
        assert_eq!(stem("kitaplar"), "kitap");
        assert_eq!(stem("tutmak"), "tut");
        assert_eq!(stem("camiden"), "cami");
        assert_eq!(stem("namazlar"), "namaz");
    }

    #[test]
    fn folded_endings_strip() {
        assert_eq!(stem("gelmis"), "gel");
        assert_eq!(stem("okudugu"), "oku");
    }

    #[test]
    fn remainder_must_exceed_two_chars() {
        assert_eq!(stem("evde"), "evd");
        assert_eq!(stem("ile"), "ile");
        assert_eq!(stem("dan"), "dan");
    }

    #[test]
    fn leaves_unmatched_words_alone() {
        assert_eq!(stem("farz"), "farz");
        assert_eq!(stem("namaz"), "namaz");
        assert_eq!(stem("midir"), "midir");
    }

    #[test]
    fn long_words_get_a_second_pass() {
        // "abdestlerinden" -> "abdestleri" (10 chars) -> "abdestler"
        assert_eq!(stem("abdestlerinden"), "abdestler");
    }

    #[test]
    fn at_most_two_suffixes_removed() {
        // Three removable endings stacked; only two go.
        assert_eq!(stem("kitaplarimizdan"), "kitaplari");
    }

    proptest! {
        #[test]
        fn never_lengthens(w in "[a-z]{0,20}") {
            let s = stem(&w);
            prop_assert!(s.len() <= w.len());
            prop_assert!(w.starts_with(s));
        }
    }
}
