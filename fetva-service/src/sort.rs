//! Result ordering.

use std::cmp::Reverse;

use fetva_types::SortBy;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::query::SearchHit;

/// Unix timestamp of a corpus date, if it is in a known format.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) and
/// `DD.MM.YYYY`.
pub fn parse_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at.unix_timestamp());
    }
    if let Ok(at) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(at.assume_utc().unix_timestamp());
    }
    [
        format_description!("[year]-[month]-[day]"),
        format_description!("[day].[month].[year]"),
    ]
    .iter()
    .find_map(|format| Date::parse(raw, *format).ok())
    .map(|date| date.midnight().assume_utc().unix_timestamp())
}

/// Sort key for date ordering. Missing and unreadable dates count as the epoch.
fn timestamp(hit: &SearchHit) -> i64 {
    hit.document
        .date
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(0)
}

/// Orders `hits` in place. Equal keys keep their incoming order.
///
/// View orderings read `document.views`, so runtime counts must already be
/// resolved onto the hits.
pub fn sort_hits(hits: &mut [SearchHit], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => hits.sort_by(|a, b| b.score.total_cmp(&a.score)),
        SortBy::Date => hits.sort_by_cached_key(|hit| Reverse(timestamp(hit))),
        SortBy::Popular | SortBy::Views => hits.sort_by_key(|hit| Reverse(hit.document.views)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetva_types::Document;

    fn hit(id: &str, score: f64, views: u64, date: Option<&str>) -> SearchHit {
        let mut document = Document::new(id, "q", "a", vec!["c".into()]).with_views(views);
        document.date = date.map(str::to_string);
        let mut hit = SearchHit::plain(document);
        hit.score = score;
        hit
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(SearchHit::id).collect()
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("1970-01-02"), Some(86_400));
        assert_eq!(parse_date("02.01.1970"), Some(86_400));
        assert_eq!(parse_date("1970-01-01T00:01:00Z"), Some(60));
        assert_eq!(parse_date("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_date("1970-01-01T00:00:30"), Some(30));
        assert_eq!(parse_date("dün"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn relevance_is_stable() {
        let mut hits = vec![hit("a", 1.0, 0, None), hit("b", 2.0, 0, None), hit("c", 1.0, 0, None)];
        sort_hits(&mut hits, SortBy::Relevance);
        assert_eq!(ids(&hits), ["b", "a", "c"]);
    }

    #[test]
    fn newest_first_and_undated_last() {
        let mut hits = vec![
            hit("none", 0.0, 0, None),
            hit("old", 0.0, 0, Some("2001-05-01")),
            hit("bad", 0.0, 0, Some("yok")),
            hit("new", 0.0, 0, Some("01.02.2020")),
        ];
        sort_hits(&mut hits, SortBy::Date);
        assert_eq!(ids(&hits), ["new", "old", "none", "bad"]);
    }

    #[test]
    fn views_descending() {
        let mut hits = vec![hit("a", 9.0, 3, None), hit("b", 0.0, 10, None), hit("c", 0.0, 3, None)];
        sort_hits(&mut hits, SortBy::Popular);
        assert_eq!(ids(&hits), ["b", "a", "c"]);
        sort_hits(&mut hits, SortBy::Views);
        assert_eq!(ids(&hits), ["b", "a", "c"]);
    }
}
