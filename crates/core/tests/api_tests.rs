//! Library API integration tests
use pith_core::*;
use tokio_util::sync::CancellationToken;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn fixture_registry() -> ExtractorRegistry {
    RegistryLoaderBuilder::new()
        .custom_dir(get_fixture_path("extractors"))
        .include_builtin(false)
        .build()
        .load()
        .unwrap()
}

const SIMPLE_ARTICLE: &str = r#"<html><head><title>Title</title></head><body>
    <article>
        <h1>Title</h1>
        <p>This paragraph is comfortably longer than eighty characters, so it reads as prose and scores well.</p>
    </article>
</body></html>"#;

#[tokio::test]
async fn test_generic_path_end_to_end() {
    let reader = Readability::new();
    let article = reader.parse_html(SIMPLE_ARTICLE, "https://unregistered.test/post", &CancellationToken::new()).await.unwrap();

    assert_eq!(article.title.as_deref(), Some("Title"));
    assert!(article.content.as_deref().unwrap().contains("comfortably longer than eighty characters"));
    assert!(article.extractor_used.is_none());
    assert_eq!(article.url, "https://unregistered.test/post");
    assert_eq!(article.domain, "unregistered.test");
}

#[tokio::test]
async fn test_custom_multi_match_content_end_to_end() {
    let html = read_fixture("custom_example.html");
    let reader = Readability::with_registry(ReadabilityConfig::default(), fixture_registry());

    let article = reader.parse_html(&html, "https://example.com/notes", &CancellationToken::new()).await.unwrap();

    assert_eq!(article.extractor_used.as_deref(), Some("custom:example.com"));
    assert_eq!(article.title.as_deref(), Some("Field Notes from the Compiler Room"));
    assert_eq!(article.author.as_deref(), Some("Grace Hopper"));

    let content = article.content.unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("first note"));
    assert!(lines[1].contains("second note"));
    assert!(lines[2].contains("third note"));
    assert!(!content.contains("newsletter"));
}

#[tokio::test]
async fn test_custom_lookup_through_www_and_aliases() {
    let html = read_fixture("custom_example.html");
    let reader = Readability::with_registry(ReadabilityConfig::default(), fixture_registry());
    let cancel = CancellationToken::new();

    for url in ["https://www.example.com/notes", "https://blog.example.com/notes"] {
        let article = reader.parse_html(&html, url, &cancel).await.unwrap();
        assert_eq!(article.extractor_used.as_deref(), Some("custom:example.com"), "{url}");
    }

    let article = reader.parse_html(&html, "https://example.org/notes", &cancel).await.unwrap();
    assert!(article.extractor_used.is_none());
}

#[test]
fn test_loader_skips_unparseable_definitions() {
    let registry = fixture_registry();
    assert_eq!(registry.domains(), vec!["blog.example.com", "example.com"]);
    assert!(!registry.contains("broken.example"));
}

#[tokio::test]
async fn test_full_fixture_metadata() {
    let html = read_fixture("article.html");
    let article = Readability::new()
        .parse_html(&html, "https://gazette.example/2024/03/ownership", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(article.title.as_deref(), Some("Understanding Ownership in Rust"));
    assert_eq!(article.author.as_deref(), Some("Ada Lovelace"));
    assert_eq!(article.date_published.map(|d| d.to_rfc3339()), Some("2024-03-18T09:15:00+00:00".to_string()));
    assert_eq!(article.lead_image_url.as_deref(), Some("https://gazette.example/images/ownership-cover.jpg"));
    assert_eq!(article.site.site_name.as_deref(), Some("The Systems Gazette"));
    assert_eq!(article.site.favicon.as_deref(), Some("https://gazette.example/static/favicon-32.png"));
    assert_eq!(article.site.language.as_deref(), Some("en"));
    assert!(article.site.description.is_some());

    let content = article.content.unwrap();
    assert!(content.contains("Every value has a single owner"));
    assert!(content.contains("borrow checker stops feeling like an obstacle"));
    assert!(!content.contains("Traits in depth"));
    assert!(!content.contains("<script"));
    assert!(article.word_count > 100);

    let excerpt = article.excerpt.unwrap();
    assert!(excerpt.ends_with('…'));
    assert!(excerpt.chars().count() <= 161);
}

#[tokio::test]
async fn test_rtl_fixture() {
    let html = read_fixture("rtl.html");
    let article =
        Readability::new().parse_html(&html, "https://arabic.example/a", &CancellationToken::new()).await.unwrap();

    assert_eq!(article.direction.as_deref(), Some("rtl"));
    assert_eq!(article.title.as_deref(), Some("مقالة تجريبية"));
}

#[tokio::test]
async fn test_content_fallback_reaches_body() {
    let html = read_fixture("empty_content.html");
    let article =
        Readability::new().parse_html(&html, "https://example.net/", &CancellationToken::new()).await.unwrap();

    assert_eq!(article.title.as_deref(), Some("Nothing Here"));
    assert!(article.content.unwrap().contains("Home"));
}

#[tokio::test]
async fn test_cancellation_is_terminal() {
    let doc = Document::parse(SIMPLE_ARTICLE).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let reader = Readability::new();
    let result = reader.extract(&doc, "https://example.com/a", &cancel).await;
    assert!(matches!(result, Err(PithError::Cancelled { .. })));

    let report = reader.extract_or_report(&doc, "https://example.com/a", &cancel).await;
    assert!(report.error);
    assert_eq!(report.domain, "example.com");
    assert!(report.message.unwrap().contains("cancelled"));
}

#[tokio::test]
async fn test_invalid_urls() {
    let reader = Readability::new();
    let cancel = CancellationToken::new();

    for url in ["", "example.com/no-scheme", "data:text/plain,hello"] {
        let result = reader.parse_html(SIMPLE_ARTICLE, url, &cancel).await;
        assert!(matches!(result, Err(PithError::InvalidUrl(_))), "{url:?}");
    }
}

#[cfg(feature = "markdown")]
#[tokio::test]
async fn test_markdown_output() {
    let html = read_fixture("article.html");
    let config = ReadabilityConfig::builder().content_type(ContentType::Markdown).build();
    let article = Readability::with_config(config)
        .parse_html(&html, "https://gazette.example/ownership", &CancellationToken::new())
        .await
        .unwrap();

    let markdown = article.content.unwrap();
    assert!(markdown.contains("Every value has a single owner"));
    assert!(!markdown.contains("<p>"));
}

#[tokio::test]
async fn test_article_json_shape() {
    let article = parse(SIMPLE_ARTICLE, "https://example.com/a").await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&article.to_json().unwrap()).unwrap();

    for key in ["title", "content", "author", "date_published", "lead_image_url", "dek", "excerpt", "url", "domain"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    for key in ["word_count", "direction", "total_pages", "rendered_pages", "site_name", "favicon", "extractor_used"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("error").is_none());
}
