use once_cell::sync::Lazy;
use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::formatters::text::{normalize_spaces, strip_tags};
use crate::preprocess::convert_relative_urls;

const EMPTY_NODE_TAGS: [&str; 9] = ["div", "p", "span", "section", "article", "aside", "nav", "header", "footer"];

const LINK_DENSITY_TAGS: [&str; 5] = ["p", "li", "aside", "nav", "section"];

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(h[1-6])(?:\s[^>]*)?>(.*?)</h[1-6]\s*>").expect("HEADING_RE regex"));

static CLASS_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\s+class=["'][^"']*["']"#).expect("CLASS_ATTR_RE regex"));

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("LINK_SELECTOR selector"));

static EMPTY_NODE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    EMPTY_NODE_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r#"<{}(?:\s[^>]*)?>\s*(?:<br\s*/?>\s*)*</{}>"#, tag, tag)).expect("empty node regex")
        })
        .collect()
});

/// Configuration for cleaning the selected content region
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Resolved article title; headings repeating it are removed
    pub title: Option<String>,
    /// Whether to remove empty nodes
    pub remove_empty_nodes: bool,
    /// Maximum passes for removing empty nodes
    pub max_empty_node_passes: usize,
    /// Whether to remove nodes with high link density
    pub remove_high_link_density: bool,
    /// Maximum link density threshold (0.0 to 1.0)
    pub max_link_density: f64,
    /// Whether to keep class attributes (default: false)
    pub keep_classes: bool,
    /// Base URL for converting relative URLs
    pub base_url: Option<Url>,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            title: None,
            remove_empty_nodes: true,
            max_empty_node_passes: 10,
            remove_high_link_density: true,
            max_link_density: 0.5,
            keep_classes: false,
            base_url: None,
        }
    }
}

/// Clean the selected content region
pub fn postprocess_html(html: &str, config: &PostProcessConfig) -> String {
    let mut processed = html.to_string();

    if let Some(title) = &config.title {
        processed = remove_title_headings(&processed, title);
    }

    if !config.keep_classes {
        processed = strip_classes(&processed);
    }

    if config.remove_high_link_density {
        processed = remove_high_link_density_nodes(&processed, config.max_link_density);
    }

    if config.remove_empty_nodes {
        processed = remove_empty_nodes(&processed, config.max_empty_node_passes);
    }

    if let Some(base_url) = &config.base_url {
        processed = convert_relative_urls(&processed, base_url);
    }

    processed
}

/// Remove headings whose text repeats the article title
///
/// Comparison is on whitespace-normalized, case-insensitive text.
pub fn remove_title_headings(html: &str, title: &str) -> String {
    let wanted = normalize_spaces(title).to_lowercase();
    if wanted.is_empty() {
        return html.to_string();
    }

    HEADING_RE
        .replace_all(html, |caps: &regex::Captures| {
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if normalize_spaces(&strip_tags(inner)).to_lowercase() == wanted {
                String::new()
            } else {
                caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string()
            }
        })
        .to_string()
}

/// Strip all class attributes from HTML
fn strip_classes(html: &str) -> String {
    CLASS_ATTR_RE.replace_all(html, "").to_string()
}

/// Remove empty nodes from HTML
///
/// A node is empty when it holds only whitespace and line breaks. Removal
/// repeats until nothing changes or `max_passes` is reached, so wrappers
/// emptied by an earlier pass go too.
pub fn remove_empty_nodes(html: &str, max_passes: usize) -> String {
    let mut result = html.to_string();

    for _ in 0..max_passes {
        let previous = result.clone();

        for re in EMPTY_NODE_RES.iter() {
            result = re.replace_all(&result, "").to_string();
        }

        if result == previous {
            break;
        }
    }

    result
}

/// Remove nodes with high link density
///
/// Link density is the ratio of link text to total text. Nodes above the
/// threshold are removed as they're likely navigation or related-link lists.
/// Each node is judged as a whole tree node, so nested lists and sections are
/// removed without disturbing their ancestors.
fn remove_high_link_density_nodes(html: &str, max_density: f64) -> String {
    let mut fragment = Html::parse_fragment(html);
    let mut removed: Vec<NodeId> = Vec::new();

    for element in fragment.root_element().descendants().filter_map(ElementRef::wrap) {
        if !LINK_DENSITY_TAGS.contains(&element.value().name()) || element.ancestors().any(|a| removed.contains(&a.id()))
        {
            continue;
        }

        let text_length = visible_length(element);
        if text_length == 0 {
            continue;
        }

        let link_length: usize = element.select(&LINK_SELECTOR).map(visible_length).sum();
        if link_length as f64 / text_length as f64 > max_density {
            removed.push(element.id());
        }
    }

    if removed.is_empty() {
        return html.to_string();
    }

    for id in removed {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    fragment.root_element().inner_html()
}

fn visible_length(element: ElementRef<'_>) -> usize {
    normalize_spaces(&element.text().collect::<String>()).chars().count()
}
