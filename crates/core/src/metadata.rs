//! Generic field extractors and site-level metadata.
//!
//! Every extractor here is a read-only query over a [`Document`]. Meta tags
//! are always looked up through the document's [`crate::parse::MetaCache`], so
//! names absent from the page cost nothing. An extractor that finds nothing
//! returns `None`; none of them fail.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use crate::dates::{date_from_url, parse_date};
use crate::formatters::text::normalize_spaces;
use crate::parse::Document;
use crate::title::clean_title;

/// Meta names that reliably carry the article title.
const STRONG_TITLE_META: &[&str] = &["tweetmeme-title", "dc.title", "rbtitle", "headline", "title"];

const STRONG_TITLE_SELECTORS: &[&str] =
    &[".hentry .entry-title", "h1#articleHeader", "h1.articleHeader", "h1.article", ".instapaper_title", "#meebo-title"];

const WEAK_TITLE_META: &[&str] = &["og:title", "twitter:title"];

const WEAK_TITLE_SELECTORS: &[&str] = &[
    "article h1",
    "#entry-title",
    ".entry-title",
    "#entryTitle",
    "#entrytitle",
    ".entryTitle",
    ".entrytitle",
    "#articleTitle",
    ".articleTitle",
    "h1.title",
    "h2.article",
];

const AUTHOR_META: &[&str] =
    &["byl", "clmst", "dc.author", "dcsext.author", "dc.creator", "rbauthors", "authors", "author", "article:author"];

const AUTHOR_SELECTORS: &[&str] = &[
    ".entry .entry-author",
    ".author.vcard .fn",
    ".author .vcard .fn",
    ".byline.vcard .fn",
    ".byline .vcard .fn",
    ".byline .by .author",
    ".byline .by",
    ".byline .author",
    ".post-author.vcard",
    ".post-author .vcard",
    "a[rel=author]",
    "#by_author",
    ".by_author",
    "#entryAuthor",
    ".entryAuthor",
    ".byline a[href*=author]",
    "#author .authorname",
    ".author .authorname",
    "#author",
    ".author",
    ".articleauthor",
    ".ArticleAuthor",
];

/// Byline containers accepted only when their text starts with "By".
const BYLINE_SELECTORS: &[&str] = &["#byline", ".byline"];

const MAX_AUTHOR_CHARS: usize = 300;

const DATE_META: &[&str] = &[
    "article:published_time",
    "displaydate",
    "dc.date",
    "dc.date.issued",
    "rbpubdate",
    "publish_date",
    "pub_date",
    "pagedate",
    "pubdate",
    "revision_date",
    "doc_date",
    "date_created",
    "content_create_date",
    "lastmodified",
    "created",
    "date",
];

const DATE_SELECTORS: &[&str] = &[
    ".hentry .dtstamp.published",
    ".hentry .published",
    ".hentry .dtstamp.updated",
    ".hentry .updated",
    ".single .published",
    ".meta .published",
    ".meta .postDate",
    ".entry-date",
    ".byline .date",
    ".postmetadata .date",
    ".article_datetime",
    ".date-header",
    ".story-date",
    ".dateStamp",
    "#story .datetime",
    ".dateline",
    ".pubdate",
];

const LEAD_IMAGE_META: &[&str] = &["og:image", "twitter:image", "image_src"];

const DEK_SELECTORS: &[&str] =
    &[".dek", ".deck", ".subtitle", ".standfirst", ".article-subtitle", ".subheadline", ".article-summary"];

const MIN_DEK_CHARS: usize = 5;
const MAX_DEK_CHARS: usize = 1000;

const DESCRIPTION_META: &[&str] = &["description", "og:description", "twitter:description"];

const SITE_NAME_META: &[&str] = &["og:site_name", "application-name"];

const SITE_IMAGE_META: &[&str] = &["og:image", "twitter:image"];

/// `<link rel>` values for site icons, in priority order.
const FAVICON_RELS: &[&str] = &["icon", "shortcut icon", "apple-touch-icon", "apple-touch-icon-precomposed"];

const LANGUAGE_META: &[&str] = &["content-language", "language", "og:locale", "dc.language"];

static BYLINE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*by\b").expect("BYLINE_PREFIX_RE regex"));

static AUTHOR_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*((posted|written)\s+)?by\b\s*:?\s*").expect("AUTHOR_PREFIX_RE regex")
});

static IMAGE_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(sprite|icon|logo|avatar|badge|spacer|pixel|\bads?[-_/])").expect("IMAGE_NOISE_RE regex"));

/// Site-level metadata gathered alongside the article fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub site_name: Option<String>,
    pub site_title: Option<String>,
    pub site_image: Option<String>,
    pub favicon: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// Strip "By" and similar prefixes from an author string.
///
/// Returns `None` when nothing usable remains or the result is too long to
/// be a name.
pub fn clean_author(raw: &str) -> Option<String> {
    let stripped = AUTHOR_PREFIX_RE.replace(raw, "");
    let author = normalize_spaces(&stripped);

    if author.is_empty() || author.chars().count() >= MAX_AUTHOR_CHARS { None } else { Some(author) }
}

/// Resolve a possibly relative URL against the page URL.
pub fn resolve_url(base: Option<&Url>, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    match base {
        Some(base) => base.join(value).ok().map(|u| u.to_string()),
        None => Some(value.to_string()),
    }
}

/// Normalize a language tag to its lower-case primary subtag.
pub fn normalize_language(raw: &str) -> Option<String> {
    let primary = raw.trim().split(['-', '_', ',', ';']).next()?.trim().to_lowercase();
    if primary.is_empty() || !primary.chars().all(|c| c.is_ascii_alphabetic()) { None } else { Some(primary) }
}

fn non_empty(text: String) -> Option<String> {
    let text = normalize_spaces(&text);
    if text.is_empty() { None } else { Some(text) }
}

impl Document {
    /// First non-empty meta content among `names`, in order.
    fn first_meta(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.meta_content(name))
    }

    /// Text of the first element matched by the first selector that yields text.
    fn first_selector_text(&self, selectors: &[&str]) -> Option<String> {
        selectors
            .iter()
            .filter_map(|selector| self.select_first(selector))
            .find_map(|el| non_empty(el.text()))
    }

    /// Extract the article title.
    ///
    /// Order: strong meta names, strong selectors, JSON-LD `headline`, weak
    /// meta names, weak selectors. The winner is passed through
    /// [`clean_title`]. `<title>` and bare `<h1>` are left to the fallback
    /// chain.
    pub fn extract_title(&self, url: Option<&Url>) -> Option<String> {
        let raw = self
            .first_meta(STRONG_TITLE_META)
            .or_else(|| self.first_selector_text(STRONG_TITLE_SELECTORS))
            .or_else(|| self.json_ld_string("headline"))
            .or_else(|| self.first_meta(WEAK_TITLE_META))
            .or_else(|| self.first_selector_text(WEAK_TITLE_SELECTORS));

        let Some(raw) = raw else {
            trace!("no title candidate");
            return None;
        };

        let cleaned = clean_title(&raw, url, self);
        if cleaned.is_empty() { None } else { Some(cleaned) }
    }

    /// Extract the author.
    ///
    /// Order: meta names, byline selectors, "By ..." byline containers,
    /// JSON-LD `author`.
    pub fn extract_author(&self) -> Option<String> {
        if let Some(author) = self.first_meta(AUTHOR_META).and_then(|a| clean_author(&a)) {
            return Some(author);
        }

        for selector in AUTHOR_SELECTORS {
            if let Some(el) = self.select_first(selector)
                && let Some(author) = clean_author(&el.text())
            {
                return Some(author);
            }
        }

        for selector in BYLINE_SELECTORS {
            if let Some(el) = self.select_first(selector) {
                let text = el.text();
                if BYLINE_PREFIX_RE.is_match(&text)
                    && let Some(author) = clean_author(&text)
                {
                    return Some(author);
                }
            }
        }

        let author = self.json_ld_value("author").and_then(|v| json_ld_author(&v)).and_then(|a| clean_author(&a));
        if author.is_none() {
            trace!("no author candidate");
        }
        author
    }

    /// Extract the publication date.
    ///
    /// Order: meta names, `time[datetime]`, date selectors, JSON-LD
    /// `datePublished`, then a `/YYYY/MM/DD/` segment of the URL.
    pub fn extract_date_published(&self, url: Option<&Url>) -> Option<DateTime<Utc>> {
        for name in DATE_META {
            if let Some(date) = self.meta_content(name).and_then(|v| parse_date(&v)) {
                return Some(date);
            }
        }

        if let Ok(times) = self.select("time[datetime]") {
            for time in times {
                if let Some(date) = time.attr("datetime").and_then(parse_date) {
                    return Some(date);
                }
            }
        }

        for selector in DATE_SELECTORS {
            if let Some(el) = self.select_first(selector) {
                let value = el.attr("datetime").or(el.attr("title")).map(str::to_string).unwrap_or_else(|| el.text());
                if let Some(date) = parse_date(&value) {
                    return Some(date);
                }
            }
        }

        if let Some(date) = self.json_ld_string("datePublished").and_then(|v| parse_date(&v)) {
            return Some(date);
        }

        url.and_then(|u| date_from_url(u.as_str()))
    }

    /// Extract the lead image URL.
    ///
    /// Meta images and `link[rel=image_src]` come first. When `content` is
    /// given, the first eligible `<img>` in it is used as a last resort.
    pub fn extract_lead_image(&self, url: Option<&Url>, content: Option<&str>) -> Option<String> {
        if let Some(image) = self.first_meta(LEAD_IMAGE_META) {
            return resolve_url(url, &image);
        }

        if let Some(href) = self.select_first("link[rel=image_src]").and_then(|el| el.attr("href")) {
            return resolve_url(url, href);
        }

        if let Some(image) = self.json_ld_value("image").and_then(|v| json_ld_image(&v)) {
            return resolve_url(url, &image);
        }

        let content = Document::parse(content?).ok()?;
        let images = content.select("img[src]").ok()?;
        images
            .iter()
            .filter_map(|img| img.attr("src"))
            .find(|src| !src.starts_with("data:") && !IMAGE_NOISE_RE.is_match(src))
            .and_then(|src| resolve_url(url, src))
    }

    /// Extract the dek (subtitle).
    ///
    /// Dek selectors come first. When an excerpt is given, the description
    /// meta tag is also accepted, unless it is just the opening of that
    /// excerpt.
    pub fn extract_dek(&self, excerpt: Option<&str>) -> Option<String> {
        for selector in DEK_SELECTORS {
            if let Some(el) = self.select_first(selector)
                && let Some(text) = non_empty(el.text())
            {
                let len = text.chars().count();
                if (MIN_DEK_CHARS..=MAX_DEK_CHARS).contains(&len) {
                    return Some(text);
                }
            }
        }

        let excerpt = normalize_spaces(excerpt?.trim_end_matches('…'));
        let description = normalize_spaces(&self.first_meta(DESCRIPTION_META)?);
        if description.chars().count() < MIN_DEK_CHARS {
            return None;
        }

        let opening: String = description.chars().take(excerpt.chars().count()).collect();
        if !excerpt.is_empty() && (excerpt.starts_with(&opening) || description.starts_with(&excerpt)) {
            trace!("description repeats the excerpt, not a dek");
            return None;
        }

        Some(description)
    }

    /// Extract the site name.
    pub fn extract_site_name(&self) -> Option<String> {
        self.first_meta(SITE_NAME_META).or_else(|| {
            self.json_ld_value("publisher")
                .and_then(|p| p.get("name").and_then(|n| n.as_str()).map(str::to_string))
                .and_then(non_empty)
        })
    }

    /// Extract the site title: `<title>`, then meta `title`.
    pub fn extract_site_title(&self) -> Option<String> {
        self.title().and_then(non_empty).or_else(|| self.meta_content("title"))
    }

    /// Extract the site image.
    pub fn extract_site_image(&self, url: Option<&Url>) -> Option<String> {
        self.first_meta(SITE_IMAGE_META).and_then(|image| resolve_url(url, &image))
    }

    /// Extract the favicon URL.
    ///
    /// Icon link variants are tried in priority order. Without any, the
    /// conventional `/favicon.ico` of the page's origin is returned.
    pub fn extract_favicon(&self, url: Option<&Url>) -> Option<String> {
        let links = self.select("link[rel][href]").unwrap_or_default();

        for rel in FAVICON_RELS {
            let found = links.iter().find(|link| {
                link.attr("rel").is_some_and(|r| normalize_spaces(r).eq_ignore_ascii_case(rel))
            });
            if let Some(href) = found.and_then(|link| link.attr("href")) {
                return resolve_url(url, href);
            }
        }

        url.and_then(|u| u.join("/favicon.ico").ok()).map(|u| u.to_string())
    }

    /// Extract the site description.
    pub fn extract_description(&self) -> Option<String> {
        self.first_meta(DESCRIPTION_META).and_then(non_empty)
    }

    /// Extract the content language as a primary subtag.
    ///
    /// Order: `<html lang>`, `http-equiv=content-language`, then language meta
    /// names including `og:locale`.
    pub fn extract_language(&self) -> Option<String> {
        if let Some(lang) = self.select_first("html[lang]").and_then(|el| el.attr("lang")).and_then(normalize_language)
        {
            return Some(lang);
        }

        if let Some(lang) = self
            .select_first("meta[http-equiv][content]")
            .filter(|el| el.attr("http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("content-language")))
            .and_then(|el| el.attr("content"))
            .and_then(normalize_language)
        {
            return Some(lang);
        }

        LANGUAGE_META.iter().find_map(|name| self.meta_content(name).and_then(|v| normalize_language(&v)))
    }

    /// Extract all site metadata sequentially.
    pub fn extract_site_metadata(&self, url: Option<&Url>) -> SiteMetadata {
        SiteMetadata {
            site_name: self.extract_site_name(),
            site_title: self.extract_site_title(),
            site_image: self.extract_site_image(url),
            favicon: self.extract_favicon(url),
            description: self.extract_description(),
            language: self.extract_language(),
        }
    }

    /// Every JSON-LD object in the document, flattening arrays and `@graph`.
    fn json_ld_objects(&self) -> Vec<serde_json::Value> {
        let scripts = self.select("script[type=\"application/ld+json\"]").unwrap_or_default();
        let mut objects = Vec::new();

        for script in scripts {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(script.text().trim()) else {
                continue;
            };

            let items = match value {
                serde_json::Value::Array(items) => items,
                other => vec![other],
            };

            for mut item in items {
                match item.get_mut("@graph").map(serde_json::Value::take) {
                    Some(serde_json::Value::Array(graph)) => objects.extend(graph),
                    _ => objects.push(item),
                }
            }
        }

        objects
    }

    /// First JSON-LD value stored under `key`.
    fn json_ld_value(&self, key: &str) -> Option<serde_json::Value> {
        self.json_ld_objects().into_iter().find_map(|mut obj| obj.get_mut(key).map(serde_json::Value::take))
    }

    fn json_ld_string(&self, key: &str) -> Option<String> {
        self.json_ld_value(key).and_then(|v| v.as_str().map(str::to_string)).and_then(non_empty)
    }
}

/// Author name from a JSON-LD `author` value: string, object or array.
fn json_ld_author(author: &serde_json::Value) -> Option<String> {
    match author {
        serde_json::Value::String(name) => Some(name.clone()),
        serde_json::Value::Object(obj) => obj.get("name").and_then(|n| n.as_str()).map(str::to_string),
        serde_json::Value::Array(items) => items.iter().find_map(json_ld_author),
        _ => None,
    }
}

/// Image URL from a JSON-LD `image` value: string, `ImageObject` or array.
fn json_ld_image(image: &serde_json::Value) -> Option<String> {
    match image {
        serde_json::Value::String(url) => Some(url.clone()),
        serde_json::Value::Object(obj) => obj.get("url").and_then(|u| u.as_str()).map(str::to_string),
        serde_json::Value::Array(items) => items.iter().find_map(json_ld_image),
        _ => None,
    }
}
