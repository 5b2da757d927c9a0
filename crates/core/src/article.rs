//! The structured extraction result.
//!
//! [`Article`] is the record handed back by every extraction call. Every field
//! is independently optional apart from `url` and `domain`, which come straight
//! from the target URL. Soft failures are reported through `error` and
//! `message` rather than a separate error type, so the record always
//! serializes the same way.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::formatters::{convert_to_markdown, convert_to_text, html_to_plain_text, sanitize_html};
use crate::metadata::SiteMetadata;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w'-]+\b").expect("WORD_RE regex"));

/// Maximum excerpt length in characters, before the ellipsis.
pub const EXCERPT_CHARS: usize = 160;

/// Share of Hebrew/Arabic letters at which content reads right-to-left.
const RTL_THRESHOLD: f64 = 0.3;

/// Representation of the `content` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Sanitized HTML
    #[default]
    Html,
    /// Plain text, one paragraph per block
    Text,
    /// Markdown
    Markdown,
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(ContentType::Html),
            "text" | "txt" => Ok(ContentType::Text),
            "markdown" | "md" => Ok(ContentType::Markdown),
            other => Err(format!("unknown content type `{other}` (expected html, text or markdown)")),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Html => write!(f, "html"),
            ContentType::Text => write!(f, "text"),
            ContentType::Markdown => write!(f, "markdown"),
        }
    }
}

/// Convert settled content HTML into the requested representation.
///
/// A failing markdown conversion degrades to plain text.
pub fn convert_content(html: &str, content_type: ContentType) -> String {
    match content_type {
        ContentType::Html => sanitize_html(html),
        ContentType::Text => convert_to_text(html),
        ContentType::Markdown => convert_to_markdown(html).unwrap_or_else(|e| {
            warn!(error = %e, "markdown conversion failed, falling back to text");
            convert_to_text(html)
        }),
    }
}

/// The result of one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,

    /// Content in the configured [`ContentType`]
    pub content: Option<String>,

    pub author: Option<String>,

    /// Publication date, serialized as RFC 3339
    pub date_published: Option<DateTime<Utc>>,

    pub lead_image_url: Option<String>,

    /// Subtitle or standfirst
    pub dek: Option<String>,

    /// Short summary of the content
    pub excerpt: Option<String>,

    /// Target URL as given
    pub url: String,

    /// Host of the target URL
    pub domain: String,

    /// Words in the plain-text content
    pub word_count: usize,

    /// Text direction, `ltr` or `rtl`
    pub direction: Option<String>,

    pub total_pages: usize,

    pub rendered_pages: usize,

    /// Site-level metadata
    #[serde(flatten)]
    pub site: SiteMetadata,

    /// `custom:<domain>` when a custom extractor produced the record
    pub extractor_used: Option<String>,

    /// Set for soft failures
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Article {
    /// A soft-failure record carrying only the URL parts and a message.
    pub fn failure(url: &str, domain: Option<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            domain: domain.unwrap_or_default(),
            error: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// True when the extraction used a custom extractor.
    pub fn is_custom(&self) -> bool {
        self.extractor_used.is_some()
    }

    /// Serialize the record as pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Count words in text.
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// First [`EXCERPT_CHARS`] characters of the content's plain text, with an
/// ellipsis when truncated.
pub fn make_excerpt(html: &str) -> Option<String> {
    let text = html_to_plain_text(html);
    if text.is_empty() {
        return None;
    }

    if text.chars().count() <= EXCERPT_CHARS {
        return Some(text);
    }

    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    Some(format!("{}…", cut.trim_end()))
}

/// Text direction: an explicit `dir` wins, otherwise `rtl` when enough of the
/// letters are Hebrew or Arabic.
pub fn text_direction(explicit: Option<&str>, text: &str) -> String {
    if let Some(dir) = explicit.map(|d| d.trim().to_ascii_lowercase())
        && (dir == "rtl" || dir == "ltr")
    {
        return dir;
    }

    let (mut letters, mut rtl) = (0usize, 0usize);
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if is_rtl_char(c) {
            rtl += 1;
        }
    }

    if letters > 0 && rtl as f64 / letters as f64 >= RTL_THRESHOLD { "rtl".to_string() } else { "ltr".to_string() }
}

fn is_rtl_char(c: char) -> bool {
    matches!(c as u32, 0x0590..=0x05FF | 0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("html", ContentType::Html)]
    #[case("HTML", ContentType::Html)]
    #[case("text", ContentType::Text)]
    #[case("txt", ContentType::Text)]
    #[case("markdown", ContentType::Markdown)]
    #[case("md", ContentType::Markdown)]
    fn test_content_type_from_str(#[case] input: &str, #[case] expected: ContentType) {
        assert_eq!(input.parse::<ContentType>().unwrap(), expected);
    }

    #[test]
    fn test_content_type_rejects_unknown() {
        assert!("pdf".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_content_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ContentType::Markdown).unwrap(), r#""markdown""#);
        assert_eq!(ContentType::Text.to_string(), "text");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("hello world"), 2);
        assert_eq!(count_words("one"), 1);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("it's a well-known fact"), 4);
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!(make_excerpt("<p>Short  and <b>sweet</b> text</p>").as_deref(), Some("Short and sweet text"));
        assert!(make_excerpt("<div>  </div>").is_none());
    }

    #[test]
    fn test_excerpt_truncates_with_ellipsis() {
        let html = format!("<p>{}</p>", "word ".repeat(100));
        let excerpt = make_excerpt(&html).unwrap();
        assert!(excerpt.ends_with('…'));
        assert!(excerpt.chars().count() <= EXCERPT_CHARS + 1);
    }

    #[test]
    fn test_text_direction() {
        assert_eq!(text_direction(Some("RTL"), "plain english"), "rtl");
        assert_eq!(text_direction(None, "plain english"), "ltr");
        assert_eq!(text_direction(None, "שלום עולם and a bit"), "rtl");
        assert_eq!(text_direction(Some("auto"), "مرحبا بالعالم"), "rtl");
        assert_eq!(text_direction(None, ""), "ltr");
    }

    #[test]
    fn test_convert_content() {
        let html = r#"<div><p>First</p><script>alert(1)</script><p>Second</p></div>"#;
        let sanitized = convert_content(html, ContentType::Html);
        assert!(!sanitized.contains("script"));
        assert_eq!(convert_content(html, ContentType::Text), "First\n\nSecond");
    }

    #[test]
    fn test_article_serialization() {
        let article = Article {
            title: Some("Test".to_string()),
            url: "https://example.com/a".to_string(),
            domain: "example.com".to_string(),
            site: SiteMetadata { site_name: Some("Example".to_string()), ..Default::default() },
            ..Default::default()
        };

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["title"], "Test");
        assert_eq!(json["site_name"], "Example");
        assert_eq!(json["extractor_used"], serde_json::Value::Null);
        assert!(json.get("error").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_failure_record() {
        let article = Article::failure("not a url", None, "Invalid URL: relative URL without a base");
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["error"], true);
        assert_eq!(json["url"], "not a url");
        assert_eq!(json["domain"], "");
        assert!(article.content.is_none());
    }

    #[test]
    fn test_date_serializes_rfc3339() {
        let article = Article {
            date_published: Some(DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z").unwrap().with_timezone(&Utc)),
            ..Default::default()
        };
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["date_published"], "2024-01-15T10:30:00Z");
    }
}
