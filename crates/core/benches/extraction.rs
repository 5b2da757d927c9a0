use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pith_core::{
    Document, ExtractConfig, Readability, RegistryLoaderBuilder, ReadabilityConfig, clean_title, extract_content,
    preprocess_html, score_document,
};
use tokio_util::sync::CancellationToken;

const ARTICLE: &str = "../../tests/fixtures/article.html";
const CUSTOM: &str = "../../tests/fixtures/custom_example.html";

fn bench_parse(c: &mut Criterion) {
    let html = std::fs::read_to_string(ARTICLE).unwrap();
    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("raw", "article"), &html, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("preprocessed", "article"), &html, |b, html| {
        b.iter(|| Document::parse_with_preprocessing(black_box(html), None))
    });

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let html = std::fs::read_to_string(ARTICLE).unwrap();
    let doc = Document::parse(&preprocess_html(&html, &Default::default())).unwrap();
    let config = ExtractConfig::default();

    c.bench_function("score_document", |b| b.iter(|| score_document(black_box(&doc))));
    c.bench_function("scoring_and_selection", |b| b.iter(|| extract_content(black_box(&doc), black_box(&config))));
}

fn bench_title(c: &mut Criterion) {
    let doc = Document::parse("<html><body><h1>Headline</h1></body></html>").unwrap();
    let url = url::Url::parse("https://www.nytimes.com/2024/01/01/story.html").unwrap();

    c.bench_function("clean_title", |b| {
        b.iter(|| clean_title(black_box("NYTimes - Some Article Title About Things"), Some(&url), &doc))
    });
}

fn bench_full_extraction(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let article = std::fs::read_to_string(ARTICLE).unwrap();
    let custom = std::fs::read_to_string(CUSTOM).unwrap();
    let cancel = CancellationToken::new();

    let generic = Readability::new();
    c.bench_function("full_extraction_generic", |b| {
        b.iter(|| runtime.block_on(generic.parse_html(black_box(&article), "https://gazette.example/a", &cancel)))
    });

    let registry = RegistryLoaderBuilder::new()
        .custom_dir("../../tests/fixtures/extractors")
        .include_builtin(false)
        .build()
        .load()
        .unwrap();
    let reader = Readability::with_registry(ReadabilityConfig::default(), registry);
    c.bench_function("full_extraction_custom", |b| {
        b.iter(|| runtime.block_on(reader.parse_html(black_box(&custom), "https://example.com/notes", &cancel)))
    });
}

criterion_group!(benches, bench_parse, bench_scoring, bench_title, bench_full_extraction);
criterion_main!(benches);
