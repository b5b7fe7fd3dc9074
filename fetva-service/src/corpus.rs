//! Corpus loading.
//!
//! The corpus is a JSON Lines file: one question/answer record per
//! non-blank line. Each line is decoded into a typed record and validated
//! before it becomes a [`Document`]:
//!
//! - `q_in_file`, when present, must be a positive number
//! - `question` and `answer` must be non-blank strings
//! - `categories` must hold at least one string, none of them blank
//! - `views` and `likes`, when present, must be non-negative numbers
//!
//! A line that fails decoding or validation is skipped, logged with its
//! line number and counted. It never aborts the load. A corpus that ends
//! up with no valid record is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::str;
use std::time::Instant;

use fetva_core::analyzer::{extract_keywords, DEFAULT_MAX_KEYWORDS};
use fetva_types::{CorpusError, Document};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use serde_json::{Number, Value};
use sha1::{Digest, Sha1};
use tracing::{info, warn};

/// Something that yields the documents to index, once per initialization.
pub trait CorpusSource: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String;

    /// Reads every valid document.
    ///
    /// # Errors
    ///
    /// `CorpusError::Io` when the source cannot be read, and
    /// `CorpusError::Empty` when it yields no valid document.
    fn load(&self) -> Result<LoadedCorpus, CorpusError>;
}

/// Documents read from a source, with a summary of the read.
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub report: LoadReport,
}

/// What a load saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Size of the raw corpus.
    pub bytes: usize,
    /// Valid records kept.
    pub records: usize,
    /// Malformed or duplicate records skipped.
    pub skipped: usize,
    /// SHA-1 of the raw corpus, hex encoded.
    pub checksum: Option<String>,
}

/// A JSON Lines corpus on disk.
#[derive(Debug, Clone)]
pub struct JsonlCorpus {
    path: PathBuf,
}

impl JsonlCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for JsonlCorpus {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadedCorpus, CorpusError> {
        let started = Instant::now();
        let path = self.describe();

        let bytes = fs::read(&self.path).map_err(|source| CorpusError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path, bytes = bytes.len(), "loading corpus");

        let loaded = parse_jsonl(&bytes);
        if loaded.documents.is_empty() {
            return Err(CorpusError::Empty { path });
        }

        info!(
            path = %path,
            records = loaded.report.records,
            skipped = loaded.report.skipped,
            checksum = loaded.report.checksum.as_deref().unwrap_or_default(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "corpus loaded"
        );
        Ok(loaded)
    }
}

/// Documents held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<Document>,
}

impl MemoryCorpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl CorpusSource for MemoryCorpus {
    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn load(&self) -> Result<LoadedCorpus, CorpusError> {
        if self.documents.is_empty() {
            return Err(CorpusError::Empty {
                path: self.describe(),
            });
        }
        Ok(LoadedCorpus {
            documents: self.documents.clone(),
            report: LoadReport {
                records: self.documents.len(),
                ..LoadReport::default()
            },
        })
    }
}

/// Decodes a whole JSON Lines buffer, skipping bad lines.
pub fn parse_jsonl(bytes: &[u8]) -> LoadedCorpus {
    let mut documents = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut skipped = 0;

    for (index, raw_line) in bytes.split(|&b| b == b'\n').enumerate() {
        let line_number = index + 1;
        let parsed = str::from_utf8(raw_line)
            .map_err(|err| CorpusError::Malformed {
                line: line_number,
                reason: err.to_string(),
            })
            .map(str::trim);

        let line = match parsed {
            Ok("") => continue,
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "skipping record");
                skipped += 1;
                continue;
            }
        };

        match parse_record(line, line_number) {
            Ok(document) if seen.contains(&document.id) => {
                warn!(line = line_number, id = %document.id, "skipping duplicate record");
                skipped += 1;
            }
            Ok(document) => {
                seen.insert(document.id.clone());
                documents.push(document);
            }
            Err(err) => {
                warn!(error = %err, "skipping record");
                skipped += 1;
            }
        }
    }

    LoadedCorpus {
        report: LoadReport {
            bytes: bytes.len(),
            records: documents.len(),
            skipped,
            checksum: Some(format!("{:x}", Sha1::digest(bytes))),
        },
        documents,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default, rename = "q_in_file")]
    q_in_file: Option<Number>,
    question: String,
    answer: String,
    categories: Vec<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "_id")]
    legacy_id: Option<Value>,
    #[serde(default)]
    source: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    views: Option<Value>,
    #[serde(default)]
    likes: Option<Value>,
    #[serde(default)]
    search_keywords: Option<Value>,
    #[serde(default)]
    arabic_text: Option<Value>,
    #[serde(default)]
    references: Option<Value>,
    #[serde(default)]
    related_fatwas: Option<Value>,
}

/// Decodes and validates one corpus line.
///
/// # Errors
///
/// `CorpusError::Malformed` if the line is not a valid record.
pub fn parse_record(line: &str, line_number: usize) -> Result<Document, CorpusError> {
    let malformed = |reason: String| CorpusError::Malformed {
        line: line_number,
        reason,
    };

    let raw: RawRecord = serde_json::from_str(line).map_err(|err| malformed(err.to_string()))?;

    let ordinal = match &raw.q_in_file {
        Some(number) => {
            let value = number.as_f64().unwrap_or_default();
            if value <= 0.0 {
                return Err(malformed(format!("q_in_file must be positive, got {number}")));
            }
            number.as_u64().unwrap_or(value as u64)
        }
        None => line_number as u64,
    };
    if raw.question.trim().is_empty() {
        return Err(malformed("question is empty".into()));
    }
    if raw.answer.trim().is_empty() {
        return Err(malformed("answer is empty".into()));
    }

    if raw.categories.is_empty() {
        return Err(malformed("categories are empty".into()));
    }
    if raw.categories.iter().any(|c| c.trim().is_empty()) {
        return Err(malformed("categories contain a blank entry".into()));
    }
    let categories: Vec<String> = raw.categories.iter().map(|c| c.trim().to_owned()).collect();

    let views = count(&raw.views).map_err(|reason| malformed(format!("views {reason}")))?;
    let likes = count(&raw.likes).map_err(|reason| malformed(format!("likes {reason}")))?;

    let id = non_empty_str(&raw.id)
        .or_else(|| non_empty_str(&raw.legacy_id))
        .map(str::to_owned)
        .unwrap_or_else(|| stable_id(ordinal, &raw.question));

    let mut search_keywords = Vec::new();
    for keyword in string_list(&raw.search_keywords) {
        let keyword = keyword.trim();
        if !keyword.is_empty() && !search_keywords.iter().any(|k: &String| k == keyword) {
            search_keywords.push(keyword.to_owned());
        }
    }
    if search_keywords.is_empty() {
        let text = format!("{} {}", raw.question, raw.answer);
        search_keywords = extract_keywords(&text, DEFAULT_MAX_KEYWORDS);
    }

    Ok(Document {
        id,
        q_in_file: ordinal,
        categories,
        arabic_text: non_empty_str(&raw.arabic_text).map(str::to_owned),
        search_keywords,
        source: raw.source.as_ref().and_then(Value::as_str).map(str::to_owned),
        date: raw.date.as_ref().and_then(Value::as_str).map(str::to_owned),
        views,
        likes,
        references: string_list(&raw.references),
        related_fatwas: string_list(&raw.related_fatwas),
        question: raw.question,
        answer: raw.answer,
    })
}

/// SHA-1 of `"{ordinal}-{question}"`, hex encoded. The ordinal is
/// `q_in_file`, or the line number when the record has none.
pub fn stable_id(ordinal: u64, question: &str) -> String {
    format!("{:x}", Sha1::digest(format!("{ordinal}-{question}").as_bytes()))
}

fn non_empty_str(value: &Option<Value>) -> Option<&str> {
    value.as_ref()?.as_str().filter(|s| !s.is_empty())
}

/// A missing count is zero. A present one must be a non-negative number.
fn count(value: &Option<Value>) -> Result<u64, String> {
    match value {
        None => Ok(0),
        Some(value) => match value.as_f64() {
            Some(n) if n >= 0.0 => Ok(n as u64),
            Some(n) => Err(format!("must not be negative, got {n}")),
            None => Err(format!("must be a number, got {value}")),
        },
    }
}

fn string_list(value: &Option<Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"q_in_file":1,"question":"Oruç tutmak farz mıdır?","answer":"Evet, farzdır.","categories":["İbadet"]}"#;

    #[test]
    fn parses_minimal_record() {
        let doc = parse_record(VALID, 1).expect("valid record");
        assert_eq!(doc.q_in_file, 1);
        assert_eq!(doc.categories, ["İbadet"]);
        assert_eq!(doc.views, 0);
        assert_eq!(doc.id.len(), 40);
        assert!(!doc.search_keywords.is_empty());
    }

    #[test]
    fn stable_id_is_deterministic() {
        let a = parse_record(VALID, 1).expect("valid record");
        let b = parse_record(VALID, 99).expect("valid record");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, stable_id(1, "Oruç tutmak farz mıdır?"));
    }

    #[test]
    fn missing_ordinal_falls_back_to_line_number() {
        let line = r#"{"question":"Zekat kime verilir?","answer":"Fakirlere verilir.","categories":["Zekat"]}"#;
        let first = parse_record(line, 7).expect("q_in_file is optional");
        let again = parse_record(line, 7).expect("q_in_file is optional");

        assert_eq!(first.q_in_file, 7);
        assert_eq!(first.id, again.id);
        assert_eq!(first.id, stable_id(7, "Zekat kime verilir?"));
        assert_ne!(first.id, parse_record(line, 8).expect("valid").id);
    }

    #[test]
    fn explicit_ids_win() {
        let with_id = r#"{"id":"f-1","_id":"x","q_in_file":2,"question":"q","answer":"a","categories":["c"]}"#;
        assert_eq!(parse_record(with_id, 1).expect("valid").id, "f-1");

        let legacy = r#"{"_id":"x","q_in_file":2,"question":"q","answer":"a","categories":["c"]}"#;
        assert_eq!(parse_record(legacy, 1).expect("valid").id, "x");
    }

    #[test]
    fn optional_fields() {
        let line = r#"{"q_in_file":3,"question":"q","answer":"a","categories":[" Zekat "],
            "likes":7,"date":"2021-05-01","arabicText":"نص",
            "searchKeywords":["zekat"," zekat ","", "sadaka"],"references":["r1"],"source":"kaynak"}"#;
        let doc = parse_record(line, 1).expect("valid");
        assert_eq!(doc.categories, ["Zekat"]);
        assert_eq!(doc.views, 0);
        assert_eq!(doc.likes, 7);
        assert_eq!(doc.date.as_deref(), Some("2021-05-01"));
        assert_eq!(doc.arabic_text.as_deref(), Some("نص"));
        assert_eq!(doc.search_keywords, ["zekat", "sadaka"]);
        assert_eq!(doc.references, ["r1"]);
        assert_eq!(doc.source.as_deref(), Some("kaynak"));
    }

    #[test]
    fn rejects_invalid_shapes() {
        let cases = [
            "not json",
            r#"{"q_in_file":0,"question":"q","answer":"a","categories":["c"]}"#,
            r#"{"q_in_file":1,"question":" ","answer":"a","categories":["c"]}"#,
            r#"{"q_in_file":1,"question":"q","answer":"","categories":["c"]}"#,
            r#"{"q_in_file":1,"question":"q","answer":"a","categories":[]}"#,
            r#"{"q_in_file":1,"question":"q","answer":"a","categories":"c"}"#,
            r#"{"q_in_file":1,"question":"q","answer":"a","categories":["c"," "]}"#,
            r#"{"q_in_file":1,"question":"q","answer":"a","categories":["c"],"views":-4}"#,
            r#"{"q_in_file":1,"question":"q","answer":"a","categories":["c"],"likes":-1}"#,
            r#"{"q_in_file":1,"question":"q","answer":"a","categories":["c"],"views":"many"}"#,
        ];
        for (i, case) in cases.iter().enumerate() {
            match parse_record(case, i + 1) {
                Err(CorpusError::Malformed { line, .. }) => assert_eq!(line, i + 1),
                other => panic!("case {i} should be malformed, got {other:?}"),
            }
        }
    }

    #[test]
    fn jsonl_skips_bad_lines_and_duplicates() {
        let input = format!("{VALID}\n\n{{broken\n{VALID}\r\n");
        let loaded = parse_jsonl(input.as_bytes());

        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.report.records, 1);
        assert_eq!(loaded.report.skipped, 2);
        assert_eq!(loaded.report.checksum.as_ref().map(String::len), Some(40));
    }

    #[test]
    fn memory_corpus_requires_documents() {
        assert!(matches!(
            MemoryCorpus::default().load(),
            Err(CorpusError::Empty { .. })
        ));
    }
}
