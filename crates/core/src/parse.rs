//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and navigating the DOM tree using CSS selectors. Every element exposes
//! a stable [`NodeId`] so that scratch state such as scores can be kept in side
//! tables instead of being written into the document.
//!
//! # Example
//!
//! ```rust
//! use pith_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><meta name="author" content="Jane Roe"></head>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! assert_eq!(doc.meta_content("author"), Some("Jane Roe".to_string()));
//! ```

use std::collections::HashSet;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::{PithError, Result};

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").expect("META_SELECTOR selector"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("TITLE_SELECTOR selector"));
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("BODY_SELECTOR selector"));

/// The distinct `name` values of the document's `<meta>` elements.
///
/// Built once per document and consulted by every field extractor before it
/// queries the DOM for a meta tag. Names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaCache {
    names: HashSet<String>,
}

impl MetaCache {
    /// Scans the document once and records every meta `name`.
    pub fn build(html: &Html) -> Self {
        let names = html
            .select(&META_SELECTOR)
            .filter_map(|el| el.value().attr("name"))
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        Self { names }
    }

    /// Returns true if a meta tag with this name exists (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Returns the number of distinct meta names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the document carries no named meta tags.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Represents a parsed HTML document.
///
/// A Document wraps an HTML page and provides methods for querying elements
/// using CSS selectors and for reading meta tags through the [`MetaCache`].
///
/// # Example
///
/// ```rust
/// use pith_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
    base_url: Option<Url>,
    meta_cache: OnceCell<MetaCache>,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    ///
    /// The caller is expected to hand over an already prepared document. Use
    /// [`Document::parse_with_preprocessing`] to start from raw page markup.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None, meta_cache: OnceCell::new() })
    }

    /// Parses HTML from a string with document preparation applied first.
    ///
    /// Preparation strips script/style/form/comment nodes, promotes lazy image
    /// attributes and normalizes meta tags. See [`crate::preprocess`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use pith_core::parse::Document;
    ///
    /// let html = r#"<html><head><meta property="og:title" content="Hi"></head><body></body></html>"#;
    /// let doc = Document::parse_with_preprocessing(html, None).unwrap();
    /// assert!(doc.meta_cache().contains("og:title"));
    /// ```
    pub fn parse_with_preprocessing(html: &str, base_url: Option<Url>) -> Result<Self> {
        let config = PreprocessConfig::default();
        let cleaned = preprocess_html(html, &config);
        let html = Html::parse_document(&cleaned);

        Ok(Self { html, base_url, meta_cache: OnceCell::new() })
    }

    /// Gets the base URL used for preprocessing.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Gets the raw HTML representation.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Gets the entire HTML as a string.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PithError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pith_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Returns the first element matching the selector, ignoring invalid selectors.
    pub fn select_first(&'_ self, selector: &str) -> Option<Element<'_>> {
        let sel = Selector::parse(selector).ok()?;
        self.html.select(&sel).next().map(Element::new)
    }

    /// Iterates over every element in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap).map(Element::new)
    }

    /// Looks up an element by node id.
    pub fn element(&self, id: NodeId) -> Option<Element<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap).map(Element::new)
    }

    /// Gets the `<body>` element if the document has one.
    pub fn body(&self) -> Option<Element<'_>> {
        self.html.select(&BODY_SELECTOR).next().map(Element::new)
    }

    /// Gets the first element of the document in tree order.
    pub fn first_element(&self) -> Option<Element<'_>> {
        self.elements().next()
    }

    /// Gets the title of the document.
    ///
    /// Returns the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        self.html.select(&TITLE_SELECTOR).next().map(|el| el.text().collect::<String>())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }

    /// Returns the meta-name cache, building it on first use.
    pub fn meta_cache(&self) -> &MetaCache {
        self.meta_cache.get_or_init(|| MetaCache::build(&self.html))
    }

    /// Reads the trimmed `content` of the first `<meta name=..>` with this name.
    ///
    /// The [`MetaCache`] is consulted first so that absent names never trigger a
    /// document scan.
    pub fn meta_content(&self, name: &str) -> Option<String> {
        if !self.meta_cache().contains(name) {
            return None;
        }

        self.html
            .select(&META_SELECTOR)
            .filter(|el| el.value().attr("name").is_some_and(|n| n.trim().eq_ignore_ascii_case(name)))
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    }
}

/// A wrapper around scraper's ElementRef for easier DOM navigation.
///
/// # Example
///
/// ```rust
/// use pith_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Stable identity of this element within its document.
    pub fn node_id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Gets the parent element, if the parent is an element.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Gets the element children in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::new).collect()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PithError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PithError::HtmlParseError(format!("Invalid selector: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="Description" content="  A page about tests  ">
            <meta name="author" content="">
            <meta name="author" content="Jane Roe">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <div id="wrap"><p class="content">Paragraph 1</p><p class="content">Paragraph 2</p></div>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("https://example.com"));
        assert_eq!(elements[0].text(), "Link");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PithError::HtmlParseError(_))));
        assert!(doc.select_first("[[invalid").is_none());
    }

    #[test]
    fn test_parent_and_children() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let wrap = doc.select_first("#wrap").unwrap();
        let children = wrap.children();

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].parent().unwrap().node_id(), wrap.node_id());
        assert_eq!(wrap.parent().unwrap().tag_name(), "body");
    }

    #[test]
    fn test_element_lookup_by_id() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let h1 = doc.select_first("h1").unwrap();
        let found = doc.element(h1.node_id()).unwrap();
        assert_eq!(found.text(), "Heading");
    }

    #[test]
    fn test_elements_in_document_order() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let tags: Vec<String> = doc.elements().map(|el| el.tag_name()).collect();

        assert_eq!(tags[0], "html");
        let h1 = tags.iter().position(|t| t == "h1").unwrap();
        let a = tags.iter().position(|t| t == "a").unwrap();
        assert!(h1 < a);
        assert_eq!(doc.first_element().unwrap().tag_name(), "html");
    }

    #[test]
    fn test_meta_cache_names() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let cache = doc.meta_cache();

        assert!(cache.contains("description"));
        assert!(cache.contains("AUTHOR"));
        assert!(!cache.contains("og:title"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_meta_content_skips_empty_values() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.meta_content("author"), Some("Jane Roe".to_string()));
        assert_eq!(doc.meta_content("description"), Some("A page about tests".to_string()));
        assert_eq!(doc.meta_content("keywords"), None);
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.text_content();

        assert!(text.contains("Heading"));
        assert!(text.contains("Paragraph 1"));
        assert!(text.contains("Paragraph 2"));
    }
}
