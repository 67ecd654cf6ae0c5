//! Criterion benchmarks for Lectern.
//!
//! Covers text analysis, indexing throughput and the main query shapes:
//! single terms, boolean combinations, wildcards, phrases and similarity.

use std::hint::black_box;
use std::time::Duration;

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use lectern::analysis::analyzer::{Analyzer, StandardAnalyzer};
use lectern::document::ContentSource;
use lectern::engine::SearchIndex;
use lectern::engine::config::IndexConfig;
use lectern::engine::indexer::Indexer;
use lectern::search::SearchOptions;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "search",
    "engine",
    "full",
    "text",
    "index",
    "query",
    "document",
    "posting",
    "term",
    "phrase",
    "boolean",
    "wildcard",
    "similarity",
    "relevance",
    "score",
    "analysis",
    "tokenization",
    "lexer",
    "parser",
    "snapshot",
    "lane",
    "session",
    "stream",
    "batch",
    "cancellation",
    "deadline",
    "structure",
    "performance",
    "memory",
    "retrieval",
    "ranking",
    "filtering",
];

/// Generate test documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let doc_length = 50 + (i % 100); // Variable length documents
            (0..doc_length)
                .map(|_| WORDS[rng.random_range(0..WORDS.len())])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn build_index(documents: &[String]) -> SearchIndex {
    let index = SearchIndex::new(IndexConfig::default()).unwrap();
    let documents = documents.to_vec();
    index
        .on_index_lane(move |indexer| {
            for (i, text) in documents.iter().enumerate() {
                indexer.add_text(&format!("mem://bench/{i}"), text).unwrap();
            }
        })
        .unwrap()
        .wait()
        .unwrap();
    index
}

fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");

    let analyzer = StandardAnalyzer::new();
    let texts = generate_test_documents(1000);

    group.bench_function("analyze_single_document", |b| {
        b.iter(|| {
            let count = analyzer.analyze(black_box(&texts[0])).unwrap().count();
            black_box(count)
        })
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("analyze_batch_documents", |b| {
        b.iter(|| {
            for text in texts.iter().take(100) {
                let count = analyzer.analyze(black_box(text)).unwrap().count();
                black_box(count);
            }
        })
    });

    group.finish();
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexing");
    group.sample_size(20);

    let documents = generate_test_documents(500);

    group.throughput(Throughput::Elements(documents.len() as u64));
    group.bench_function("index_500_documents", |b| {
        b.iter_batched(
            || documents.clone(),
            |documents| black_box(build_index(&documents)),
            BatchSize::LargeInput,
        )
    });

    let index = build_index(&documents);
    group.throughput(Throughput::Elements(1));
    group.bench_function("replace_document", |b| {
        b.iter(|| {
            index
                .add_document(ContentSource::text("mem://bench/0", black_box(&documents[1])))
                .unwrap()
                .wait()
                .unwrap()
        })
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    let index = build_index(&generate_test_documents(5000));
    let time = Duration::from_secs(10);

    let queries = [
        ("term", "snapshot", SearchOptions::DEFAULT),
        ("and", "lexer AND parser", SearchOptions::DEFAULT),
        ("or", "lexer parser", SearchOptions::DEFAULT.with_space_means_or(true)),
        ("not", "ranking AND NOT memory", SearchOptions::DEFAULT),
        ("prefix_wildcard", "tok*", SearchOptions::DEFAULT),
        ("substring_wildcard", "*ear*", SearchOptions::DEFAULT),
        ("phrase", "\"search engine\"", SearchOptions::DEFAULT),
        ("no_scores", "session OR stream", SearchOptions::DEFAULT.with_no_relevance_scores(true)),
        (
            "similar",
            "relevance ranking retrieval",
            SearchOptions::DEFAULT.with_find_similar(true),
        ),
    ];

    for (name, query, options) in queries {
        group.bench_function(name, |b| {
            b.iter(|| {
                let outcome = index
                    .search(black_box(query), options, 20, time)
                    .unwrap()
                    .collect_outcome()
                    .unwrap();
                black_box(outcome)
            })
        });
    }

    group.bench_function("first_batch_only", |b| {
        b.iter(|| {
            let mut stream = index
                .search("search OR engine", SearchOptions::DEFAULT, 10, time)
                .unwrap();
            black_box(stream.next_batch().unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_text_analysis, bench_indexing, bench_search);
criterion_main!(benches);
