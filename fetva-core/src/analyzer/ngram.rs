//! Word n-gram construction.
//!
//! Bigrams and trigrams are built from the stemmed token sequence and
//! joined with a single space, so they live in the same key space as
//! unigrams and never collide with them.

/// Builds every contiguous `n`-gram of `tokens`, emitting `(term, start)`.
///
/// `n == 0` or fewer than `n` tokens emit nothing. The term buffer is
/// reused between emissions.
#[inline]
pub fn for_each_ngram<S, F>(tokens: &[S], n: usize, mut emit: F)
where
    S: AsRef<str>,
    F: FnMut(&str, u32),
{
    if n == 0 || tokens.len() < n {
        return;
    }

    let mut buf = String::with_capacity(n * 12);
    for (start, window) in tokens.windows(n).enumerate() {
        buf.clear();
        for (i, token) in window.iter().enumerate() {
            if i > 0 {
                buf.push(' ');
            }
            buf.push_str(token.as_ref());
        }
        emit(&buf, start as u32);
    }
}

/// Collects the first `limit` `n`-grams of `tokens`.
pub fn ngrams<S: AsRef<str>>(tokens: &[S], n: usize, limit: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(count_ngrams(tokens.len(), n).min(limit));
    for_each_ngram(tokens, n, |term, _| {
        if out.len() < limit {
            out.push(term.to_owned());
        }
    });
    out
}

/// Number of `n`-grams in a sequence of `len` tokens.
#[inline(always)]
pub const fn count_ngrams(len: usize, n: usize) -> usize {
    if n == 0 || len < n {
        0
    } else {
        len - n + 1
    }
}
