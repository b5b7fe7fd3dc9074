//! Loads a fetva corpus and runs one query against it.
//!
//! ```bash
//! # Ranked search
//! fetva-query --data-file data/processed_fetvas.jsonl search "oruç farz mıdır"
//!
//! # Keyword lookup, newest first, as JSON
//! fetva-query --json keywords namaz abdest --sort date
//!
//! # Completions and corpus statistics
//! fetva-query suggest nam
//! fetva-query stats
//! ```
//!
//! `DATA_FILE` is used when `--data-file` is absent. Logging follows
//! `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fetva_service::service::{DEFAULT_AUTOCOMPLETE_LIMIT, DEFAULT_POPULAR_LIMIT, DEFAULT_SIMILAR_LIMIT};
use fetva_service::{
    Document, KeywordRequest, SearchHit, SearchRequest, SearchService, ServiceConfig, SortBy,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fetva-query", version, about = "Query a fetva corpus from the terminal")]
struct Cli {
    /// JSON Lines corpus (defaults to $DATA_FILE, then data/processed_fetvas.jsonl)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Results per page
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ranked full-text search
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "relevance")]
        sort: SortBy,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        min_score: Option<f64>,
    },
    /// Exact lookup over precomputed keywords
    Keywords {
        #[arg(required = true)]
        keywords: Vec<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "views")]
        sort: SortBy,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Documents similar to a text
    Similar { text: String },
    /// Autocomplete a partial query
    Suggest { prefix: String },
    /// Show one document
    Show { id: String },
    /// Categories by size
    Categories,
    /// Most viewed documents
    Popular,
    /// Corpus and index statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ServiceConfig::from_env();
    if let Some(path) = &cli.data_file {
        config = config.with_data_file(path);
    }
    if let Some(limit) = cli.limit {
        config.default_limit = limit;
    }
    let data_file = config.data_file.clone();

    let service = SearchService::new(config);
    let started = Instant::now();
    service
        .initialize()
        .with_context(|| format!("failed to load {}", data_file.display()))?;
    let load_time = started.elapsed();

    let started = Instant::now();
    let count = run(&service, &cli)?;
    let query_time = started.elapsed();

    if !cli.json {
        let report = service.load_report()?;
        print_timing(report.bytes, report.records, load_time, query_time, count);
    }
    Ok(())
}

/// Runs the subcommand and returns how many items it printed.
fn run(service: &SearchService, cli: &Cli) -> Result<usize> {
    let limit = cli.limit;
    match &cli.command {
        Command::Search {
            query,
            category,
            sort,
            offset,
            min_score,
        } => {
            let mut request = SearchRequest::new(query.as_str()).sort_by(*sort).offset(*offset);
            request.category = category.clone();
            request.limit = limit;
            request.min_score = *min_score;
            let hits = service.search(&request)?;
            emit(cli.json, &hits, print_hits)
        }
        Command::Keywords {
            keywords,
            category,
            sort,
            offset,
        } => {
            let mut request = KeywordRequest::new(keywords.iter().cloned())
                .sort_by(*sort)
                .offset(*offset);
            request.category = category.clone();
            request.limit = limit;
            let hits = service.search_by_keywords(&request)?;
            emit(cli.json, &hits, print_hits)
        }
        Command::Similar { text } => {
            let documents = service.find_similar(text, limit.unwrap_or(DEFAULT_SIMILAR_LIMIT))?;
            emit(cli.json, &documents, print_documents)
        }
        Command::Suggest { prefix } => {
            let suggestions =
                service.autocomplete(prefix, limit.unwrap_or(DEFAULT_AUTOCOMPLETE_LIMIT))?;
            emit(cli.json, &suggestions, |items| {
                for item in items {
                    println!("{item}");
                }
            })
        }
        Command::Show { id } => {
            let document = service
                .document(id)?
                .with_context(|| format!("no document with id {id}"))?;
            service.increment_views(id)?;
            let documents = [document];
            emit(cli.json, &documents, |docs| {
                for doc in docs {
                    println!("[{}] {}\n\n{}\n", doc.id, doc.question, doc.answer);
                    println!("categories: {}", doc.categories.join(", "));
                    println!("views: {}  likes: {}", doc.views, doc.likes);
                }
            })
        }
        Command::Categories => {
            let categories = service.categories()?;
            emit(cli.json, &categories, |items| {
                for c in items {
                    println!("{:>4}  {:<32} {}", c.count, c.name, c.slug);
                }
            })
        }
        Command::Popular => {
            let documents = service.popular_documents(limit.unwrap_or(DEFAULT_POPULAR_LIMIT))?;
            emit(cli.json, &documents, print_documents)
        }
        Command::Stats => {
            let site = service.site_stats()?;
            let search = service.search_stats()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "site": site, "search": search }))?
                );
            } else {
                println!("Documents   : {}", fmt_count(site.total_documents as u64));
                println!("Categories  : {}", site.total_categories);
                println!("Views       : {}", fmt_count(site.total_views));
                println!("Popular     : {}", site.popular_categories.join(", "));
                println!("Keywords    : {} ({:.1} per doc)", fmt_count(search.total_keywords as u64), search.average_keywords_per_document);
                println!("Index       : {}", search.index);
                for k in &search.most_common_keywords {
                    println!("  {:>6}  {}", k.count, k.keyword);
                }
            }
            Ok(1)
        }
    }
}

fn emit<T: Serialize>(json: bool, items: &[T], print: impl Fn(&[T])) -> Result<usize> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        print(items);
    }
    Ok(items.len())
}

fn print_hits(hits: &[SearchHit]) {
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}. [{}] {:.3}  {}",
            rank + 1,
            hit.document.id,
            hit.score,
            hit.highlighted_question.as_deref().unwrap_or(&hit.document.question)
        );
        if !hit.matched_terms.is_empty() {
            println!("     terms: {}", hit.matched_terms.join(", "));
        }
    }
}

fn print_documents(documents: &[Document]) {
    for (rank, doc) in documents.iter().enumerate() {
        println!("{:>3}. [{}] ({} views)  {}", rank + 1, doc.id, doc.views, doc.question);
    }
}

fn print_timing(bytes: usize, records: usize, load: Duration, query: Duration, results: usize) {
    println!("--------------------------------");
    println!("Corpus      : {} ({} records)", fmt_bytes(bytes as u64), fmt_count(records as u64));
    println!("Load        : {:.3} s", load.as_secs_f64());
    println!("Query       : {:.3} ms", query.as_secs_f64() * 1_000.0);
    println!("Results     : {}", results);
    println!("--------------------------------");
}

fn fmt_bytes(b: u64) -> String {
    if b >= 1024 * 1024 {
        format!("{:.2} MiB", b as f64 / (1024.0 * 1024.0))
    } else if b >= 1024 {
        format!("{:.2} KiB", b as f64 / 1024.0)
    } else {
        format!("{} B", b)
    }
}

fn fmt_count(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);

    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
