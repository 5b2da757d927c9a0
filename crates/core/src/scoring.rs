//! Node scoring.
//!
//! Scores are integers kept in a [`ScoreMap`] keyed by node identity, so the
//! document itself is never touched. The scoring pass walks every paragraph-like
//! element, initializes its score and pushes the raw paragraph score up to the
//! parent (in full) and grandparent (in half). First contact with any element
//! lazily computes its tag score plus class/id weight and cascades a quarter of
//! that base score to its own parent.

use std::collections::HashMap;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::parse::{Document, Element};

/// Positive patterns that suggest an element contains main content
static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(article|articlecontent|body|content|entry|hentry|h-entry|main|page|permalink|post|text|blog|story)")
        .expect("POSITIVE regex")
});

/// Negative patterns that suggest an element does NOT contain main content
static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(adbox|advert|banner|breadcrumbs?|combx|comment|community|contact|disqus|extra|foot|header|masthead|menu|modal|outbrain|promo|related|remark|rss|share|shoutbox|sidebar|skyscraper|sponsor|widget|ad-break|agegate|pagination|pager|popup)",
    )
    .expect("NEGATIVE regex")
});

static PHOTO_HINTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(figure|photo|image|caption)").expect("PHOTO_HINTS regex"));

static ASSET_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)entry-content-asset").expect("ASSET_MARKER regex"));

/// Tags scored by [`score_paragraph`].
pub const PARAGRAPH_TAGS: &[&str] = &["p", "pre"];

/// Container pairs whose inner element marks the article body. The parent of
/// every inner match receives [`CONTAINER_BOOST`].
const HNEWS_SELECTORS: &[(&str, &str)] = &[
    ("[itemtype*='schema.org/Article']", "[itemprop='articleBody']"),
    (".hentry", ".entry-content"),
    ("article", ".entry-content"),
    (".entry", ".entry_content"),
    (".post", ".postbody"),
    (".post", ".post-body"),
    (".post", ".post_body"),
];

const CONTAINER_BOOST: i64 = 80;

/// Per-document score table keyed by node identity.
#[derive(Debug, Clone, Default)]
pub struct ScoreMap {
    scores: HashMap<NodeId, i64>,
}

impl ScoreMap {
    /// Creates an empty score table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attached score, or `None` if the element was never touched.
    pub fn get(&self, id: NodeId) -> Option<i64> {
        self.scores.get(&id).copied()
    }

    /// Returns the attached score, treating untouched elements as zero.
    pub fn score_of(&self, id: NodeId) -> i64 {
        self.get(id).unwrap_or(0)
    }

    /// Attaches a score to an element, replacing any previous value.
    pub fn set(&mut self, id: NodeId, score: i64) {
        self.scores.insert(id, score);
    }

    /// Returns true if the element carries a score.
    pub fn contains(&self, id: NodeId) -> bool {
        self.scores.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Collapse whitespace runs and trim, returning the character count.
pub(crate) fn text_length(text: &str) -> usize {
    text.split_whitespace().map(|word| word.chars().count() + 1).sum::<usize>().saturating_sub(1)
}

/// Score a paragraph by its prose signals.
///
/// - one point per comma
/// - one point per 50 characters
/// - -10 when shorter than 20 characters
/// - +5 when between 50 and 200 characters
pub fn score_paragraph(element: &Element<'_>) -> i64 {
    let text = element.text();
    let trimmed = text.trim();
    let length = trimmed.chars().count();

    let mut score = trimmed.matches(',').count() as i64 + (length / 50) as i64;

    if length < 20 {
        score -= 10;
    }

    if (50..=200).contains(&length) {
        score += 5;
    }

    score
}

/// Base score of an element from its tag name
///
/// - P, PRE: [`score_paragraph`]
/// - DIV, ARTICLE, SECTION, MAIN: +5
/// - SPAN, LI, TD, BLOCKQUOTE, OL, UL, DL: +3
/// - ADDRESS, FORM, NAV, ASIDE, HEADER, FOOTER: -3
/// - TH: -5
pub fn score_node(element: &Element<'_>) -> i64 {
    match element.tag_name().as_str() {
        "p" | "pre" => score_paragraph(element),
        "div" | "article" | "section" | "main" => 5,
        "span" | "li" | "td" | "blockquote" | "ol" | "ul" | "dl" => 3,
        "address" | "form" | "nav" | "aside" | "header" | "footer" => -3,
        "th" => -5,
        _ => 0,
    }
}

/// Class/id weight of an element.
///
/// The id is checked first; when it matches either pattern the class patterns
/// are skipped. Photo hints and the asset marker apply to the class regardless.
pub fn weight(element: &Element<'_>) -> i64 {
    let mut score = 0;
    let mut id_matched = false;

    if let Some(id) = element.attr("id").filter(|id| !id.trim().is_empty()) {
        if POSITIVE.is_match(id) {
            score += 25;
            id_matched = true;
        }
        if NEGATIVE.is_match(id) {
            score -= 25;
            id_matched = true;
        }
    }

    if let Some(class) = element.attr("class").filter(|class| !class.trim().is_empty()) {
        if !id_matched {
            if POSITIVE.is_match(class) {
                score += 25;
            }
            if NEGATIVE.is_match(class) {
                score -= 25;
            }
        }

        if PHOTO_HINTS.is_match(class) {
            score += 10;
        }

        if ASSET_MARKER.is_match(class) {
            score += 25;
        }
    }

    score
}

/// Calculate the link density of an element
///
/// Link density is the ratio of anchor text characters to total text characters,
/// after whitespace normalization. Returns 0.0 for elements without text.
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_len = text_length(&element.text());
    if text_len == 0 {
        return 0.0;
    }

    let link_len: usize = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| text_length(&link.text()))
        .sum();

    link_len as f64 / text_len as f64
}

/// Returns the score of an element, computing and attaching it on first touch.
///
/// The first touch computes `score_node + weight` and adds a quarter of it to
/// the parent, which may in turn initialize the parent.
fn get_or_init_score(scores: &mut ScoreMap, element: &Element<'_>) -> i64 {
    if let Some(score) = scores.get(element.node_id()) {
        return score;
    }

    let base = score_node(element) + weight(element);
    if let Some(parent) = element.parent() {
        add_score(scores, &parent, (base as f64 * 0.25) as i64);
    }
    base
}

/// Add `amount` to an element's score, initializing it first if needed.
pub fn add_score(scores: &mut ScoreMap, element: &Element<'_>, amount: i64) {
    let current = get_or_init_score(scores, element);
    scores.set(element.node_id(), current + amount);
}

/// Run the scoring pass over a document.
pub fn score_document(doc: &Document) -> ScoreMap {
    let mut scores = ScoreMap::new();

    for (container, body) in HNEWS_SELECTORS {
        let Ok(containers) = doc.select(container) else { continue };
        for outer in containers {
            for inner in outer.select(body).unwrap_or_default() {
                if let Some(parent) = inner.parent() {
                    trace!(container, body, "boosting article body container");
                    add_score(&mut scores, &parent, CONTAINER_BOOST);
                }
            }
        }
    }

    let paragraphs: Vec<Element<'_>> =
        doc.elements().filter(|el| PARAGRAPH_TAGS.contains(&el.tag_name().as_str())).collect();

    for paragraph in paragraphs {
        let score = get_or_init_score(&mut scores, &paragraph);
        scores.set(paragraph.node_id(), score);

        let raw = score_node(&paragraph);
        if let Some(parent) = paragraph.parent() {
            add_score(&mut scores, &parent, raw);
            if let Some(grandparent) = parent.parent() {
                add_score(&mut scores, &grandparent, raw / 2);
            }
        }
    }

    scores
}
