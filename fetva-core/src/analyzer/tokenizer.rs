//! Tokenizer and stop-word filter.
//!
//! Second stage of the pipeline. Given raw text it normalizes, splits on
//! the single spaces the normalizer leaves behind, and drops anything that
//! carries no search value:
//!
//! - tokens of two characters or fewer
//! - tokens in the fixed stop-word set (conjunctions, pronouns, numerals,
//!   question particles, and honorific/religious boilerplate)
//!
//! Surviving tokens keep their original order. Positions used by the
//! index are indices into this filtered sequence, which is what the
//! proximity bonus and n-gram construction rely on.
//!
//! ## Field Weights
//!
//! Each document field is indexed on its own, at its own weight:
//! - **Question**: 3.0x weight (primary)
//! - **Categories**: 2.0x weight
//! - **Answer**: 1.0x weight (baseline)

use core::str;

use lazy_static::lazy_static;
use memchr::memchr_iter;
use rustc_hash::FxHashSet;

use crate::analyzer::normalizer::normalize_into;

/// Tokens with this many characters or fewer are discarded.
pub const MAX_DISCARDED_TOKEN_CHARS: usize = 2;

lazy_static! {
    /// Stop words, stored in normalized (folded) form so they compare
    /// directly against tokenizer output. Words with Turkish letters
    /// (`icin`, `nicin`, `gore`) are dropped as stop words for that reason.
    static ref STOP_WORDS: FxHashSet<&'static str> = {
        let words: &[&str] = &[
            // conjunctions
            "ve", "ile", "veya", "ama", "fakat", "ancak", "lakin", "halbuki", "hatta", "ise",
            // adverbs
            "cok", "az", "daha", "en", "pek", "oldukca", "biraz", "fazla", "hic",
            "nasil", "ne", "neden", "nicin", "nerede", "kac", "kacinca",
            // pronouns
            "ben", "sen", "o", "biz", "siz", "onlar", "kendi", "birbiri", "birbirlerini",
            "bana", "sana", "ona", "bize", "size", "onlara", "beni", "seni", "onu",
            "bizi", "sizi", "onlari", "benim", "senin", "onun", "bizim", "sizin", "onlarin",
            // postpositions
            "icin", "gore", "kadar", "dolayi", "yuzunden", "itibaren", "beri",
            "sonra", "once", "hakkinda", "sayesinde", "ragmen",
            // demonstratives and quantifiers
            "bu", "su", "boyle", "soyle", "oyle", "ayni", "farkli", "cesitli",
            "her", "butun", "tum", "bazi", "birkac", "bircok", "pekcok",
            // question particles
            "mi", "mu", "misin", "musun", "misiniz", "musunuz",
            // numerals
            "bir", "iki", "uc", "dort", "bes", "alti", "yedi", "sekiz", "dokuz", "on",
            "yirmi", "otuz", "kirk", "elli", "altmis", "yetmis", "seksen", "doksan", "yuz",
            "bin", "milyon", "milyar", "kacinci", "kacar", "kactane",
            // time
            "dun", "bugun", "yarin", "simdi", "gecen", "gelecek", "onceki", "sonraki",
            "eskiden", "yeniden",
            // light verbs and existentials
            "var", "yok", "yoktur", "vardir", "olur", "olmaz", "olmali", "olmamali",
            "etmek", "olmak", "yapmak", "demek", "gelmek", "vermek", "almak", "gormek",
            "bilmek", "soylemek", "cikmak", "girmek", "kalmak", "durmak", "gitmek",
            // honorifics and citation boilerplate
            "allah", "cc", "teala", "sallallahu", "aleyhi", "sellem", "sallallahualeyhi",
            "selam", "aleyhisselam", "sav", "peygamber", "efendimiz", "resulullah", "hz",
            "rasulullah", "hadis", "rivayet", "buhari", "muslim", "ebu", "davud",
            "tirmizi", "nesai", "ibni", "mace", "darimi", "malik", "muwatta",
        ];
        words.iter().copied().collect()
    };
}

/// Returns `true` if `token` (already normalized) is a stop word.
#[inline]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Logical document field.
///
/// `#[repr(u8)]` keeps the tag one byte wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Field {
    /// The question - highest importance
    Question = 0,
    /// The answer - baseline importance
    Answer = 1,
    /// Categories - medium importance
    Categories = 2,
}

impl Field {
    /// Static scoring weight for this field.
    #[must_use]
    #[inline(always)]
    pub const fn weight(self) -> f32 {
        match self {
            Field::Question => 3.0,
            Field::Answer => 1.0,
            Field::Categories => 2.0,
        }
    }
}

/// Splits normalized text on ASCII spaces and emits `(token, index)`.
///
/// Expects normalizer output: no leading, trailing or doubled spaces.
/// Tokens are slices of the input; nothing is allocated.
#[inline]
pub fn split_normalized<'n, F>(normalized: &'n str, mut emit: F)
where
    F: FnMut(&'n str, u32),
{
    debug_assert!(
        !normalized.starts_with(' ') && !normalized.ends_with(' '),
        "tokenizer: surrounding whitespace, normalizer contract violated"
    );

    let bytes = normalized.as_bytes();
    if bytes.is_empty() {
        return;
    }

    let mut start = 0usize;
    let mut pos = 0u32;

    for i in memchr_iter(b' ', bytes) {
        if start < i {
            // Splitting on an ASCII byte always lands on a char boundary.
            if let Ok(text) = str::from_utf8(&bytes[start..i]) {
                emit(text, pos);
                pos = pos.saturating_add(1);
            }
        }
        start = i + 1;
    }

    if start < bytes.len() {
        if let Ok(text) = str::from_utf8(&bytes[start..]) {
            emit(text, pos);
        }
    }
}

/// Returns `true` if a normalized token should be kept.
#[inline]
pub fn is_indexable(token: &str) -> bool {
    token.chars().count() > MAX_DISCARDED_TOKEN_CHARS && !is_stop_word(token)
}

/// Normalizes `text` and returns its indexable tokens in original order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut normalized = String::with_capacity(text.len());
    normalize_into(text, &mut normalized);

    let mut tokens = Vec::new();
    split_normalized(&normalized, |token, _| {
        if is_indexable(token) {
            tokens.push(token.to_owned());
        }
    });
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn field_size_is_1_byte() {
        assert_eq!(size_of::<Field>(), 1);
    }

    #[test]
    fn weight_derivable_from_field() {
        assert_eq!(Field::Question.weight(), 3.0);
        assert_eq!(Field::Answer.weight(), 1.0);
        assert_eq!(Field::Categories.weight(), 2.0);
    }

    #[test]
    fn drops_short_tokens_and_stop_words() {
        assert_eq!(tokenize("Oruç tutmak farz mıdır?"), ["oruc", "tutmak", "farz", "midir"]);
        assert_eq!(tokenize("Faizli borç almak günah mı?"), ["faizli", "borc", "gunah"]);
        assert!(tokenize("ve ile bu şu için").is_empty());
    }

    #[test]
    fn folded_stop_words_match() {
        assert!(is_stop_word("icin"));
        assert!(is_stop_word("hakkinda"));
        assert!(!is_stop_word("için"));
        assert!(tokenize("Namaz hakkında").contains(&"namaz".to_string()));
        assert_eq!(tokenize("Namaz hakkında").len(), 1);
    }

    #[test]
    fn honorific_boilerplate_removed() {
        let tokens = tokenize("Peygamber Efendimiz (s.a.v.) buyurdu");
        assert_eq!(tokens, ["buyurdu"]);
    }

    #[test]
    fn order_is_preserved() {
        let tokens = tokenize("zekat sadaka fitre kurban");
        assert_eq!(tokens, ["zekat", "sadaka", "fitre", "kurban"]);
    }

    #[test]
    fn empty_emits_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ?? ").is_empty());
    }

    #[test]
    fn split_positions_are_sequential() {
        let mut out = Vec::new();
        split_normalized("the quick brown fox", |text, pos| out.push((text, pos)));
        assert_eq!(out.len(), 4);
        for (i, (_, pos)) in out.iter().enumerate() {
            assert_eq!(*pos, i as u32);
        }
    }

    #[test]
    fn split_tokens_are_slices_of_input() {
        let input = String::from("hello world");
        let base = input.as_ptr() as usize;
        let end = base + input.len();

        split_normalized(&input, |text, _| {
            let ptr = text.as_ptr() as usize;
            assert!(ptr >= base && ptr < end);
        });
    }

    proptest! {
        #[test]
        fn tokens_are_long_and_not_stop_words(s in "\\PC{0,80}") {
            for token in tokenize(&s) {
                prop_assert!(token.chars().count() > MAX_DISCARDED_TOKEN_CHARS);
                prop_assert!(!is_stop_word(&token));
            }
        }
    }
}
