use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("TAG_RE regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE_RE regex"));

const BLOCK_ELEMENTS: [&str; 13] = ["p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "td", "th"];

/// Strip HTML tags from a string, keeping only text content
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").to_string()
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_spaces(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}

/// Extract normalized plain text from HTML, entity-decoded
pub fn html_to_plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_spaces(&text)
}

/// Convert HTML to readable text, one block per paragraph
///
/// Leaf blocks (a block element without block descendants) become paragraphs
/// separated by blank lines. Text outside any block is kept in order.
pub fn convert_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut paragraphs: Vec<String> = Vec::new();

    for node in fragment.root_element().descendants() {
        let Some(element) = scraper::ElementRef::wrap(node) else {
            if let Some(text) = node.value().as_text()
                && !has_block_ancestor(node)
            {
                let trimmed = normalize_spaces(text);
                if !trimmed.is_empty() {
                    paragraphs.push(trimmed);
                }
            }
            continue;
        };

        let tag = element.value().name();
        if !BLOCK_ELEMENTS.contains(&tag) || contains_block(&element) {
            continue;
        }

        let text = normalize_spaces(&element.text().collect::<String>());
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    paragraphs.join("\n\n")
}

fn contains_block(element: &scraper::ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(scraper::ElementRef::wrap)
        .any(|el| BLOCK_ELEMENTS.contains(&el.value().name()))
}

fn has_block_ancestor(node: ego_tree::NodeRef<'_, scraper::Node>) -> bool {
    node.ancestors()
        .filter_map(scraper::ElementRef::wrap)
        .any(|el| BLOCK_ELEMENTS.contains(&el.value().name()))
}
