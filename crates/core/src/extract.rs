//! Candidate selection and content extraction.
//!
//! [`find_top_candidate`] scans every scored element in document order and keeps
//! the best one (ties keep the first). [`merge_siblings`] then pulls in sibling
//! elements that belong to the same logical region. [`extract_content`] runs the
//! whole pipeline over a document: strip low-signal wrappers, score, select,
//! merge and clean.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::parse::{Document, Element};
use crate::postprocess::{PostProcessConfig, postprocess_html};
use crate::scoring::{ScoreMap, link_density, score_document, text_length};

/// Tags that can never be the content container, even when scored.
pub const NON_CANDIDATE_TAGS: &[&str] =
    &["br", "b", "i", "label", "hr", "area", "base", "basefont", "input", "img", "link", "meta"];

static UNLIKELY_CANDIDATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup)",
    )
    .expect("UNLIKELY_CANDIDATES regex")
});

static MAYBE_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(and|article|body|column|content|entry|hentry|h-entry|main|page|post|shadow|story|text|blog)")
        .expect("MAYBE_CANDIDATE regex")
});

/// Tags that are never unwrapped by [`strip_unlikely_candidates`].
const KEEP_TAGS: &[&str] = &["html", "body", "a"];

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Unwrap low-signal class/id wrappers before scoring
    pub strip_unlikely: bool,
    /// Post-processing configuration
    pub postprocess: PostProcessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { strip_unlikely: true, postprocess: PostProcessConfig::default() }
    }
}

/// The chosen content region.
///
/// `merged` holds the candidate and every qualifying sibling in document order.
/// When only the candidate qualified it holds just the candidate.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// The top-scoring element
    pub element: Element<'a>,
    /// Score of the top-scoring element
    pub score: i64,
    /// Candidate plus merged siblings, in document order
    pub merged: Vec<Element<'a>>,
}

impl<'a> Candidate<'a> {
    /// A candidate with no merged siblings.
    pub fn single(element: Element<'a>, score: i64) -> Self {
        Self { element, score, merged: vec![element] }
    }

    /// True when siblings were merged into the selection.
    pub fn is_merged(&self) -> bool {
        self.merged.len() > 1
    }

    /// Render the region as HTML.
    ///
    /// A single candidate renders as itself; a merged region renders as a
    /// synthetic `<div>` wrapping every merged element.
    pub fn html(&self) -> String {
        if !self.is_merged() {
            return self.element.outer_html();
        }

        let inner: String = self.merged.iter().map(Element::outer_html).collect();
        format!("<div>{}</div>", inner)
    }
}

/// The result of content extraction
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Cleaned content HTML
    pub content: String,
    /// Score of the top candidate
    pub top_score: i64,
    /// Number of elements in the selected region
    pub element_count: usize,
}

fn is_candidate_tag(element: &Element<'_>) -> bool {
    !NON_CANDIDATE_TAGS.contains(&element.tag_name().as_str())
}

/// Find the highest-scoring eligible element.
///
/// Only elements carrying a score are considered, and ties keep the element
/// encountered first. Falls back to `<body>`, then to the first element, then
/// to `None` for a document without elements.
pub fn find_top_candidate<'a>(doc: &'a Document, scores: &ScoreMap) -> Option<Element<'a>> {
    let mut top: Option<(Element<'a>, i64)> = None;

    for element in doc.elements() {
        let Some(score) = scores.get(element.node_id()) else { continue };
        if !is_candidate_tag(&element) {
            continue;
        }

        match top {
            Some((_, best)) if score <= best => {}
            _ => top = Some((element, score)),
        }
    }

    if let Some((element, score)) = top {
        debug!(tag = %element.tag_name(), score, "selected top candidate");
        return Some(element);
    }

    doc.body().or_else(|| doc.first_element())
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?'])
}

/// Merge qualifying siblings into the candidate region.
///
/// Siblings need a positive score whose adjusted value (link-density bonus plus
/// a fifth of `top_score` when the class matches the candidate's) reaches
/// `max(10, top_score / 4)`. Paragraph siblings may also qualify on prose
/// signals alone.
pub fn merge_siblings<'a>(candidate: Element<'a>, top_score: i64, scores: &ScoreMap) -> Candidate<'a> {
    let Some(parent) = candidate.parent() else {
        return Candidate::single(candidate, top_score);
    };

    let threshold = (top_score as f64 * 0.25).max(10.0);
    let candidate_class = candidate.attr("class").unwrap_or_default();
    let mut merged = Vec::new();

    for sibling in parent.children() {
        if !is_candidate_tag(&sibling) {
            continue;
        }

        if sibling.node_id() == candidate.node_id() {
            merged.push(sibling);
            continue;
        }

        let sibling_score = scores.score_of(sibling.node_id());
        if sibling_score <= 0 {
            continue;
        }

        let density = link_density(&sibling);
        let mut bonus = 0.0;
        if density < 0.05 {
            bonus += 20.0;
        }
        if density >= 0.5 {
            bonus -= 20.0;
        }
        if sibling.attr("class").unwrap_or_default() == candidate_class {
            bonus += top_score as f64 * 0.2;
        }

        if sibling_score as f64 + bonus >= threshold {
            merged.push(sibling);
            continue;
        }

        if sibling.tag_name() == "p" {
            let text = sibling.text();
            let length = text_length(&text);

            if (length > 80 && density < 0.25) || (length <= 80 && density == 0.0 && ends_sentence(&text)) {
                merged.push(sibling);
            }
        }
    }

    Candidate { element: candidate, score: top_score, merged }
}

/// Unwrap elements whose class or id marks them as unlikely content.
///
/// The element tags are dropped but their content is kept, so a misjudged
/// wrapper never loses article text.
pub fn strip_unlikely_candidates(html: &str) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", |el| {
                if KEEP_TAGS.contains(&el.tag_name().as_str()) {
                    return Ok(());
                }

                let signature = format!(
                    "{} {}",
                    el.get_attribute("class").unwrap_or_default(),
                    el.get_attribute("id").unwrap_or_default()
                );

                if UNLIKELY_CANDIDATES.is_match(&signature) && !MAYBE_CANDIDATE.is_match(&signature) {
                    el.remove_and_keep_content();
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

/// Extract the main content from a document
///
/// This is the main entry point for generic content extraction. It:
/// 1. Unwraps unlikely candidates (when enabled)
/// 2. Scores the document
/// 3. Selects the top candidate
/// 4. Merges qualifying siblings
/// 5. Post-processes the region
///
/// Returns `None` when the resulting region carries no text.
pub fn extract_content(doc: &Document, config: &ExtractConfig) -> Option<ExtractedContent> {
    let source = doc.as_string();
    let prepared = if config.strip_unlikely { strip_unlikely_candidates(&source) } else { source };
    let cleaned = Document::parse(&prepared).ok()?;

    let scores = score_document(&cleaned);
    let top = find_top_candidate(&cleaned, &scores)?;
    let top_score = scores.score_of(top.node_id());
    let candidate = merge_siblings(top, top_score, &scores);

    debug!(top_score, merged = candidate.merged.len(), "merged candidate region");

    let content = postprocess_html(&candidate.html(), &config.postprocess);
    let has_text = Document::parse(&content).map(|d| !d.text_content().trim().is_empty()).unwrap_or(false);
    if !has_text {
        return None;
    }

    Some(ExtractedContent { content, top_score, element_count: candidate.merged.len() })
}
