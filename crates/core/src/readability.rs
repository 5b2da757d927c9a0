//! Field extraction orchestrator.
//!
//! [`Readability`] turns a prepared [`Document`] and its target URL into an
//! [`Article`]. It decides between a per-domain [`CustomExtractor`] and the
//! generic heuristics, fans independent extractors out with `tokio::join!`,
//! applies the fallback chains and derives word count, excerpt and the output
//! representation once the content is settled.
//!
//! # Example
//!
//! ```rust
//! use pith_core::Readability;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> pith_core::Result<()> {
//! let html = r#"<html><head><title>Hello</title></head>
//!     <body><article><h1>Hello</h1><p>Some article text, long enough to count as prose for the scorer.</p></article></body></html>"#;
//!
//! let reader = Readability::new();
//! let article = reader.parse_html(html, "https://example.com/hello", &CancellationToken::new()).await?;
//! assert_eq!(article.domain, "example.com");
//! assert!(article.extractor_used.is_none());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::article::{Article, ContentType, convert_content, count_words, make_excerpt, text_direction};
use crate::custom::{CustomExtractor, ExtractorRegistry, Field, select_content, select_text};
use crate::dates::parse_date;
use crate::extract::{ExtractConfig, extract_content};
use crate::formatters::text::{html_to_plain_text, normalize_spaces};
use crate::metadata::{SiteMetadata, clean_author, resolve_url};
use crate::parse::Document;
use crate::postprocess::PostProcessConfig;
use crate::preprocess::convert_relative_urls;
use crate::title::clean_title;
use crate::{PithError, Result};

/// Known article containers, tried as one selector in the content fallback.
const ARTICLE_CONTAINER_SELECTOR: &str = "article, [itemprop=articleBody], .post-content, .entry-content, \
     .article-content, .article-body, #article-body, .story-body";

/// Content fallback chain, first non-empty match wins.
const CONTENT_FALLBACK_SELECTORS: &[&str] = &[ARTICLE_CONTAINER_SELECTOR, "main", "[role=main]", "body"];

/// Configuration for an extraction call.
///
/// # Example
///
/// ```rust
/// use pith_core::{ContentType, ReadabilityConfig};
///
/// let config = ReadabilityConfig::builder()
///     .fallback(false)
///     .content_type(ContentType::Markdown)
///     .header("User-Agent", "pith")
///     .build();
///
/// assert!(!config.fallback);
/// assert_eq!(config.headers.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ReadabilityConfig {
    /// Multi-page merge (accepted, not implemented; default: false).
    pub fetch_all_pages: bool,

    /// Enables every fallback chain (default: true).
    pub fallback: bool,

    /// Representation of the `content` field (default: html).
    pub content_type: ContentType,

    /// Pass-through request headers, unused by extraction.
    pub headers: HashMap<String, String>,

    /// Explicit extractor that bypasses registry lookup.
    pub custom_extractor: Option<CustomExtractor>,

    /// Unwrap low-signal class/id wrappers before scoring (default: true).
    pub strip_unlikely: bool,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            fetch_all_pages: false,
            fallback: true,
            content_type: ContentType::Html,
            headers: HashMap::new(),
            custom_extractor: None,
            strip_unlikely: true,
        }
    }
}

impl ReadabilityConfig {
    /// Creates a new builder for ReadabilityConfig.
    pub fn builder() -> ReadabilityConfigBuilder {
        ReadabilityConfigBuilder::new()
    }
}

/// Builder for ReadabilityConfig.
pub struct ReadabilityConfigBuilder {
    config: ReadabilityConfig,
}

impl ReadabilityConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ReadabilityConfig::default() }
    }

    pub fn fetch_all_pages(mut self, value: bool) -> Self {
        self.config.fetch_all_pages = value;
        self
    }

    /// Sets whether fallback chains run.
    pub fn fallback(mut self, value: bool) -> Self {
        self.config.fallback = value;
        self
    }

    /// Sets the content representation.
    pub fn content_type(mut self, value: ContentType) -> Self {
        self.config.content_type = value;
        self
    }

    /// Adds a pass-through header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    /// Replaces all pass-through headers.
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.config.headers = headers;
        self
    }

    /// Forces a specific extractor regardless of the target domain.
    pub fn custom_extractor(mut self, extractor: CustomExtractor) -> Self {
        self.config.custom_extractor = Some(extractor);
        self
    }

    /// Sets whether low-signal wrappers are stripped before scoring.
    pub fn strip_unlikely(mut self, value: bool) -> Self {
        self.config.strip_unlikely = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ReadabilityConfig {
        self.config
    }
}

impl Default for ReadabilityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Field values gathered before the derived fields are computed.
#[derive(Debug, Default)]
struct Fields {
    title: Option<String>,
    author: Option<String>,
    date_published: Option<DateTime<Utc>>,
    lead_image_url: Option<String>,
    dek: Option<String>,
    excerpt: Option<String>,
    content: Option<String>,
}

/// Main entry point for extraction.
///
/// Holds the configuration and an injected [`ExtractorRegistry`]. One
/// instance can serve any number of calls; each call works on its own
/// document.
#[derive(Debug, Clone, Default)]
pub struct Readability {
    config: ReadabilityConfig,
    registry: ExtractorRegistry,
}

impl Readability {
    /// Default configuration and an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReadabilityConfig) -> Self {
        Self { config, registry: ExtractorRegistry::new() }
    }

    /// Configuration plus a registry of custom extractors.
    pub fn with_registry(config: ReadabilityConfig, registry: ExtractorRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ReadabilityConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Prepare raw HTML, parse it and extract.
    pub async fn parse_html(&self, html: &str, url: &str, cancel: &CancellationToken) -> Result<Article> {
        let target = parse_target(url)?;
        let doc = Document::parse_with_preprocessing(html, Some(target))?;
        self.extract(&doc, url, cancel).await
    }

    /// Like [`Readability::extract`], but failures come back as a soft-failure
    /// record with `error` set and the message filled in.
    pub async fn extract_or_report(&self, doc: &Document, url: &str, cancel: &CancellationToken) -> Article {
        match self.extract(doc, url, cancel).await {
            Ok(article) => article,
            Err(e) => {
                let domain = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase));
                Article::failure(url, domain, e.to_string())
            }
        }
    }

    /// Extract an [`Article`] from a prepared document.
    ///
    /// # Errors
    ///
    /// [`PithError::InvalidUrl`] when `url` does not parse or has no host,
    /// and [`PithError::Cancelled`] when `cancel` fires before a phase
    /// boundary. Missing fields are never errors.
    pub async fn extract(&self, doc: &Document, url: &str, cancel: &CancellationToken) -> Result<Article> {
        let target = parse_target(url)?;
        let domain = target.host_str().map(str::to_lowercase).unwrap_or_default();
        let base = Some(&target);

        let extractor = self.resolve_extractor(&domain);

        let (site_name, site_title, site_image, favicon, description, language) = tokio::join!(
            async { doc.extract_site_name() },
            async { doc.extract_site_title() },
            async { doc.extract_site_image(base) },
            async { doc.extract_favicon(base) },
            async { doc.extract_description() },
            async { doc.extract_language() },
        );
        let site = SiteMetadata { site_name, site_title, site_image, favicon, description, language };
        checkpoint(cancel, "after metadata extraction")?;

        let mut fields = Fields::default();
        let mut extractor_used = None;

        if let Some(extractor) = extractor {
            debug!(domain = %extractor.domain, "using custom extractor");
            fields = custom_fields(doc, extractor, &target);
            extractor_used = Some(format!("custom:{}", extractor.domain));
        }

        let generic = extractor.is_none() || self.config.fallback;

        if generic {
            let (want_title, want_author, want_date) =
                (fields.title.is_none(), fields.author.is_none(), fields.date_published.is_none());
            let (want_image, want_dek) = (fields.lead_image_url.is_none(), fields.dek.is_none());

            let (title, author, date_published, lead_image_url, dek) = tokio::join!(
                async { if want_title { doc.extract_title(base) } else { None } },
                async { if want_author { doc.extract_author() } else { None } },
                async { if want_date { doc.extract_date_published(base) } else { None } },
                async { if want_image { doc.extract_lead_image(base, None) } else { None } },
                async { if want_dek { doc.extract_dek(None) } else { None } },
            );

            fields.title = fields.title.or(title);
            fields.author = fields.author.or(author);
            fields.date_published = fields.date_published.or(date_published);
            fields.lead_image_url = fields.lead_image_url.or(lead_image_url);
            fields.dek = fields.dek.or(dek);
        }
        checkpoint(cancel, "after field extraction")?;

        if generic && fields.content.is_none() {
            let config = ExtractConfig {
                strip_unlikely: self.config.strip_unlikely,
                postprocess: PostProcessConfig {
                    title: fields.title.clone(),
                    base_url: Some(target.clone()),
                    ..Default::default()
                },
            };

            match extract_content(doc, &config) {
                Some(extracted) => {
                    debug!(top_score = extracted.top_score, elements = extracted.element_count, "extracted content");
                    fields.content = Some(extracted.content);
                }
                None => trace!("generic content extraction found nothing"),
            }

            if let Some(content) = fields.content.as_deref() {
                if fields.lead_image_url.is_none() {
                    fields.lead_image_url = doc.extract_lead_image(base, Some(content));
                }
                if fields.dek.is_none() {
                    let excerpt = fields.excerpt.clone().or_else(|| make_excerpt(content));
                    fields.dek = doc.extract_dek(excerpt.as_deref());
                }
            }
        }

        if self.config.fallback && fields.title.is_none() {
            fields.title = fallback_title(doc, &target);
        }

        if self.config.fallback && fields.content.is_none() {
            checkpoint(cancel, "before content fallback")?;
            fields.content = fallback_content(doc);
        }

        Ok(self.finish(doc, url, domain, fields, site, extractor_used))
    }

    /// Explicit override first, then the registry by host: exact, without
    /// `www.`, with `www.`.
    fn resolve_extractor(&self, host: &str) -> Option<&CustomExtractor> {
        if let Some(extractor) = &self.config.custom_extractor {
            match extractor.validate() {
                Ok(()) => return Some(extractor),
                Err(e) => {
                    warn!(domain = %extractor.domain, error = %e, "ignoring invalid custom extractor override");
                    return None;
                }
            }
        }

        lookup_extractor(&self.registry, host)
    }

    /// Compute the derived fields from the settled content and assemble the
    /// record.
    fn finish(
        &self, doc: &Document, url: &str, domain: String, fields: Fields, site: SiteMetadata,
        extractor_used: Option<String>,
    ) -> Article {
        let text = fields.content.as_deref().map(html_to_plain_text).unwrap_or_default();
        let excerpt = fields.excerpt.or_else(|| fields.content.as_deref().and_then(make_excerpt));
        let direction = fields.content.as_ref().map(|_| text_direction(explicit_direction(doc).as_deref(), &text));
        let content = fields.content.map(|html| convert_content(&html, self.config.content_type));

        Article {
            title: fields.title,
            content,
            author: fields.author,
            date_published: fields.date_published,
            lead_image_url: fields.lead_image_url,
            dek: fields.dek,
            excerpt,
            url: url.to_string(),
            domain,
            word_count: count_words(&text),
            direction,
            total_pages: 1,
            rendered_pages: 1,
            site,
            extractor_used,
            error: false,
            message: None,
        }
    }
}

/// Registry lookup with the `www.` fallback: exact host, then the host
/// without `www.`, then the host with `www.` added.
pub fn lookup_extractor<'r>(registry: &'r ExtractorRegistry, host: &str) -> Option<&'r CustomExtractor> {
    let host = host.trim().to_lowercase();
    if host.is_empty() {
        return None;
    }

    registry
        .get(&host)
        .or_else(|| host.strip_prefix("www.").and_then(|bare| registry.get(bare)))
        .or_else(|| if host.starts_with("www.") { None } else { registry.get(&format!("www.{host}")) })
}

/// Parse the target URL, requiring a host.
fn parse_target(url: &str) -> Result<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(PithError::InvalidUrl("empty URL".to_string()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| PithError::InvalidUrl(format!("{trimmed}: {e}")))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(PithError::InvalidUrl(format!("{trimmed}: missing host")));
    }

    Ok(parsed)
}

#[cfg(test)]
thread_local! {
    /// Observer invoked as each phase boundary is reached.
    static PHASE_HOOK: std::cell::RefCell<Option<Box<dyn Fn(&'static str)>>> = const { std::cell::RefCell::new(None) };
}

fn checkpoint(cancel: &CancellationToken, phase: &'static str) -> Result<()> {
    #[cfg(test)]
    PHASE_HOOK.with(|hook| {
        if let Some(hook) = hook.borrow().as_ref() {
            hook(phase);
        }
    });

    if cancel.is_cancelled() {
        debug!(phase, "extraction cancelled");
        return Err(PithError::Cancelled { phase });
    }
    trace!(phase, "phase complete");
    Ok(())
}

/// Apply a custom extractor's rules, cleaning each field the way the generic
/// extractors clean theirs.
fn custom_fields(doc: &Document, extractor: &CustomExtractor, target: &Url) -> Fields {
    let text = |field: Field| extractor.rules(field).and_then(|rules| select_text(doc, rules));

    let fields = Fields {
        title: text(Field::Title)
            .map(|raw| clean_title(&raw, Some(target), doc))
            .filter(|title| !title.is_empty()),
        author: text(Field::Author).and_then(|raw| clean_author(&raw)),
        date_published: text(Field::DatePublished).and_then(|raw| parse_date(&raw)),
        lead_image_url: text(Field::LeadImageUrl).and_then(|raw| resolve_url(Some(target), &raw)),
        dek: text(Field::Dek),
        excerpt: text(Field::Excerpt),
        content: extractor
            .rules(Field::Content)
            .and_then(|rules| select_content(doc, rules))
            .map(|html| convert_relative_urls(&html, target)),
    };

    for field in Field::ALL {
        if extractor.rules(field).is_some() && !has_field(&fields, field) {
            trace!(field = field.as_str(), "custom rules matched nothing");
        }
    }

    fields
}

fn has_field(fields: &Fields, field: Field) -> bool {
    match field {
        Field::Title => fields.title.is_some(),
        Field::Author => fields.author.is_some(),
        Field::DatePublished => fields.date_published.is_some(),
        Field::LeadImageUrl => fields.lead_image_url.is_some(),
        Field::Dek => fields.dek.is_some(),
        Field::Excerpt => fields.excerpt.is_some(),
        Field::Content => fields.content.is_some(),
    }
}

/// `<title>`, then the first `<h1>`.
fn fallback_title(doc: &Document, target: &Url) -> Option<String> {
    let raw = doc
        .title()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| doc.select_first("h1").map(|h1| h1.text()).filter(|t| !t.trim().is_empty()))?;

    let title = clean_title(&raw, Some(target), doc);
    if title.is_empty() { None } else { Some(title) }
}

/// Known containers, `main`, `[role=main]`, then `body`; markup taken verbatim.
fn fallback_content(doc: &Document) -> Option<String> {
    CONTENT_FALLBACK_SELECTORS.iter().find_map(|selector| {
        let element = doc.select(selector).ok()?.into_iter().find(|el| !el.text().trim().is_empty())?;
        debug!(selector, "content fallback matched");
        Some(element.inner_html())
    })
}

fn explicit_direction(doc: &Document) -> Option<String> {
    ["html[dir]", "body[dir]"]
        .iter()
        .find_map(|selector| doc.select_first(selector).and_then(|el| el.attr("dir")).map(normalize_spaces))
}

/// Parse and extract with default configuration.
pub async fn parse(html: &str, url: &str) -> Result<Article> {
    Readability::new().parse_html(html, url, &CancellationToken::new()).await
}
