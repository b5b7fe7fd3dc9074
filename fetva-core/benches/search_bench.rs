use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fetva_core::analyzer::{stemmed_tokens, tokenize};
use fetva_core::types::{Document, SearchOptions};
use fetva_core::InvertedIndex;

const SUBJECTS: &[&str] = &[
    "namaz", "oruç", "zekat", "kurban", "abdest", "hac", "sadaka", "nikah", "miras", "faiz",
];

const VERBS: &[&str] = &[
    "kılınır", "tutulur", "verilir", "kesilir", "alınır", "bozulur", "gerekir", "caizdir",
];

fn corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let subject = SUBJECTS[i % SUBJECTS.len()];
            let other = SUBJECTS[(i / SUBJECTS.len()) % SUBJECTS.len()];
            let verb = VERBS[i % VERBS.len()];
            Document::new(
                format!("doc-{i}"),
                format!("{subject} nasıl {verb} ve {other} ile ilişkisi nedir"),
                format!(
                    "{subject} konusunda mezheplerin görüşleri farklıdır. {other} için de \
                     benzer hükümler geçerlidir ve {verb} şartları ayrıca açıklanmıştır."
                ),
                vec![subject.to_string(), "İbadet".to_string()],
            )
        })
        .collect()
}

fn bench_analyzer(c: &mut Criterion) {
    let text = corpus(1).remove(0).answer.repeat(50);

    c.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(&text))));
    c.bench_function("stemmed_tokens", |b| {
        b.iter(|| stemmed_tokens(black_box(&text)))
    });
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    for n in [1_000usize, 5_000] {
        let docs = corpus(n);

        group.bench_with_input(BenchmarkId::new("build", n), &docs, |b, docs| {
            b.iter(|| {
                let mut index = InvertedIndex::new();
                index.build_index(black_box(docs));
                black_box(index)
            })
        });

        let mut index = InvertedIndex::new();
        index.build_index(&docs);

        group.bench_with_input(BenchmarkId::new("search_exact", n), &n, |b, _| {
            b.iter(|| index.search(black_box("zekat nasıl verilir"), &SearchOptions::exact()))
        });
        group.bench_with_input(BenchmarkId::new("search_fuzzy", n), &n, |b, _| {
            b.iter(|| index.search(black_box("zekta nasil verlir"), &SearchOptions::fuzzy()))
        });
        group.bench_with_input(BenchmarkId::new("suggestions", n), &n, |b, _| {
            b.iter(|| index.get_suggestions(black_box("na"), 10))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyzer, bench_index);
criterion_main!(benches);
