//! Document preparation.
//!
//! The extraction core expects a document that has already been stripped of
//! executable and interactive nodes, with lazy-loaded images promoted onto their
//! real attributes and meta tags normalized so that Open Graph `property`
//! entries are visible under `name`. This module performs that preparation on
//! raw markup with `lol_html` streaming rewrites.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("COMMENT regex"));
static HIDDEN_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("HIDDEN_STYLE regex"));

/// Attributes that lazy-loading scripts use to park the real image source.
const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-url"];

/// Configuration for document preparation
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove noscript tags
    pub remove_noscript: bool,
    /// Whether to remove iframe tags
    pub remove_iframes: bool,
    /// Whether to remove svg tags
    pub remove_svg: bool,
    /// Whether to remove canvas tags
    pub remove_canvas: bool,
    /// Whether to remove form tags
    pub remove_forms: bool,
    /// Whether to remove elements hidden with inline styles
    pub remove_hidden: bool,
    /// Whether to copy lazy-load attributes onto `src`/`srcset`
    pub promote_lazy_images: bool,
    /// Whether to copy meta `property`/`value` onto `name`/`content`
    pub normalize_meta: bool,
    /// Base URL for converting relative URLs
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_styles: true,
            remove_noscript: true,
            remove_iframes: true,
            remove_svg: true,
            remove_canvas: true,
            remove_forms: true,
            remove_hidden: true,
            promote_lazy_images: true,
            normalize_meta: true,
            base_url: None,
        }
    }
}

/// Prepare raw HTML for extraction.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = remove_comments(html);
    processed = remove_unwanted_tags(&processed, config);

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if config.promote_lazy_images || config.normalize_meta {
        processed = normalize_attributes(&processed, config);
    }

    if let Some(base_url) = &config.base_url {
        processed = convert_relative_urls(&processed, base_url);
    }

    processed
}

fn unwanted_tags(config: &PreprocessConfig) -> Vec<&'static str> {
    [
        (config.remove_scripts, "script"),
        (config.remove_styles, "style"),
        (config.remove_noscript, "noscript"),
        (config.remove_iframes, "iframe"),
        (config.remove_svg, "svg"),
        (config.remove_canvas, "canvas"),
        (config.remove_forms, "form"),
    ]
    .into_iter()
    .filter_map(|(enabled, tag)| enabled.then_some(tag))
    .collect()
}

/// JSON-LD blocks survive script removal; metadata extraction reads them.
fn is_structured_data(el: &lol_html::html_content::Element<'_, '_>) -> bool {
    el.tag_name() == "script"
        && el.get_attribute("type").is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
}

/// Remove script, style, noscript, iframe, svg, canvas and form elements
fn remove_unwanted_tags(html: &str, config: &PreprocessConfig) -> String {
    let tags = unwanted_tags(config);
    if tags.is_empty() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: tags
                .into_iter()
                .map(|tag| {
                    lol_html::element!(tag, |el| {
                        if is_structured_data(el) {
                            return Ok(());
                        }
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
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

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENT.replace_all(html, "").to_string()
}

/// Promote lazy image sources and normalize meta tag attributes
fn normalize_attributes(html: &str, config: &PreprocessConfig) -> String {
    let promote = config.promote_lazy_images;
    let normalize_meta = config.normalize_meta;

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("img", move |el| {
                    if !promote {
                        return Ok(());
                    }

                    let needs_src = el
                        .get_attribute("src")
                        .is_none_or(|src| src.trim().is_empty() || src.starts_with("data:"));
                    if needs_src
                        && let Some(lazy) = LAZY_SRC_ATTRS
                            .iter()
                            .find_map(|attr| el.get_attribute(attr).filter(|v| !v.trim().is_empty()))
                    {
                        el.set_attribute("src", &lazy).ok();
                    }

                    if !el.has_attribute("srcset")
                        && let Some(srcset) = el.get_attribute("data-srcset")
                    {
                        el.set_attribute("srcset", &srcset).ok();
                    }
                    Ok(())
                }),
                lol_html::element!("meta", move |el| {
                    if !normalize_meta {
                        return Ok(());
                    }

                    if !el.has_attribute("name")
                        && let Some(property) = el.get_attribute("property")
                    {
                        el.set_attribute("name", &property).ok();
                    }

                    if !el.has_attribute("content")
                        && let Some(value) = el.get_attribute("value")
                    {
                        el.set_attribute("content", &value).ok();
                    }
                    Ok(())
                }),
            ],
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

/// Convert relative URLs to absolute URLs
pub fn convert_relative_urls(html: &str, base_url: &Url) -> String {
    const URL_ATTRS: [(&str, &str); 5] =
        [("a[href]", "href"), ("link[href]", "href"), ("img[src]", "src"), ("source[src]", "src"), ("video[src]", "src")];

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: URL_ATTRS
                .into_iter()
                .map(|(selector, attr)| {
                    lol_html::element!(selector, move |el| {
                        if let Some(value) = el.get_attribute(attr)
                            && !value.starts_with('#')
                            && let Ok(absolute) = base_url.join(&value)
                        {
                            el.set_attribute(attr, absolute.as_str()).ok();
                        }
                        Ok(())
                    })
                })
                .collect(),
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

/// Remove elements with display:none or visibility:hidden styles
fn remove_hidden_elements(html: &str) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("[style]", |el| {
                if let Some(style) = el.get_attribute("style")
                    && HIDDEN_STYLE.is_match(&style)
                {
                    el.remove();
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
