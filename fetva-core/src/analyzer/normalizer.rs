//! Turkish-aware text normalizer.
//!
//! First stage of the analysis pipeline. Every index key and every query
//! term passes through here, so the rules are fixed and locale-free:
//!
//! - Turkish letters fold to their base Latin letter (`ç→c`, `ğ→g`, `ı→i`,
//!   `ö→o`, `ş→s`, `ü→u`, the circumflex vowels, and the uppercase forms)
//! - everything is lowercased
//! - combining marks are dropped
//! - any character that is not a letter, digit or `_` becomes a space
//! - whitespace runs collapse to one space, with none at either end
//!
//! The output is therefore a sequence of lowercase words separated by
//! single ASCII spaces, which is exactly the contract the tokenizer
//! expects. Normalizing twice gives the same string as normalizing once.

use unicode_normalization::char::is_combining_mark;

/// Folds a Turkish letter to its base Latin letter.
///
/// Uppercase forms fold straight to lowercase, so `İ` never reaches
/// `char::to_lowercase` (which would turn it into `i` plus a combining dot).
#[inline(always)]
pub fn fold_turkish(c: char) -> char {
    match c {
        'ç' | 'Ç' => 'c',
        'ğ' | 'Ğ' => 'g',
        'ı' | 'İ' | 'î' | 'Î' => 'i',
        'ö' | 'Ö' => 'o',
        'ş' | 'Ş' => 's',
        'ü' | 'Ü' | 'û' | 'Û' => 'u',
        'â' | 'Â' => 'a',
        _ => c,
    }
}

#[inline(always)]
fn push_word_char(out: &mut String, pending_space: &mut bool, c: char) {
    if *pending_space && !out.is_empty() {
        out.push(' ');
    }
    *pending_space = false;
    out.push(c);
}

/// Normalizes text into an existing buffer.
///
/// Clears the buffer first and reuses its capacity.
pub fn normalize_into(input: &str, out: &mut String) {
    out.clear();
    out.reserve(input.len());

    let mut pending_space = false;

    for ch in input.chars() {
        if ch.is_ascii() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                push_word_char(out, &mut pending_space, ch.to_ascii_lowercase());
            } else {
                pending_space = true;
            }
            continue;
        }

        if is_combining_mark(ch) {
            continue;
        }

        for lowered in fold_turkish(ch).to_lowercase() {
            if is_combining_mark(lowered) {
                continue;
            }
            if lowered.is_alphanumeric() {
                push_word_char(out, &mut pending_space, lowered);
            } else {
                pending_space = true;
            }
        }
    }
}

/// Normalizes text and returns a new String.
#[inline]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    normalize_into(input, &mut out);
    out
}
