//! Title cleaning.
//!
//! Raw titles often carry a site name ("Story - Site") or a navigation trail
//! ("Home >> News >> Story"). [`clean_title`] strips markup, resolves both
//! shapes and falls back to the document's only `<h1>` when a title is
//! implausibly long.
//!
//! # Example
//!
//! ```rust
//! use pith_core::parse::Document;
//! use pith_core::title::clean_title;
//! use url::Url;
//!
//! let doc = Document::parse("<html><body></body></html>").unwrap();
//! let url = Url::parse("https://www.nytimes.com/2024/01/01/story.html").unwrap();
//! assert_eq!(clean_title("NYTimes - Some Article Title", Some(&url), &doc), "Some Article Title");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::formatters::text::{normalize_spaces, strip_tags};
use crate::parse::Document;

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(: | - | \| | – | — | » | >> | :: | / )").expect("SEPARATOR_RE regex"));

/// Domain endings removed before fuzzy comparison, longest first.
const DOMAIN_ENDINGS: &[&str] = &[".co.uk", ".com.au", ".com", ".net", ".org", ".info", ".news", ".io", ".co"];

const MAX_TITLE_CHARS: usize = 150;

/// A breadcrumb token must recur at least this often.
const MIN_BREADCRUMB_REPEATS: usize = 2;
/// And be no longer than this many characters.
const MAX_BREADCRUMB_DIVIDER: usize = 4;
/// Breadcrumb resolution needs at least this many tokens.
const MIN_BREADCRUMB_TOKENS: usize = 6;
/// A resolved breadcrumb segment must be longer than this.
const MIN_SEGMENT_CHARS: usize = 10;

const DOMAIN_MATCH_RATIO: f64 = 0.4;
const MIN_DOMAIN_SLUG_CHARS: usize = 5;

/// Clean a raw title.
///
/// Strips markup and resolves breadcrumb or site-name segments. A result
/// longer than 150 characters is replaced by the text of the document's `<h1>`
/// when there is exactly one. Whitespace is collapsed last.
pub fn clean_title(raw: &str, url: Option<&Url>, doc: &Document) -> String {
    let mut title = strip_tags(raw).trim().to_string();

    if SEPARATOR_RE.is_match(&title) {
        title = resolve_split_title(&title, url);
    }

    if title.chars().count() > MAX_TITLE_CHARS
        && let Ok(headings) = doc.select("h1")
        && headings.len() == 1
    {
        title = headings[0].text();
    }

    normalize_spaces(&title)
}

/// Split a title into text and separator tokens.
///
/// Separators are kept as their own tokens so that joining the tokens
/// reconstructs the input exactly.
pub fn tokenize(title: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for m in SEPARATOR_RE.find_iter(title) {
        if m.start() > last {
            tokens.push(&title[last..m.start()]);
        }
        tokens.push(m.as_str());
        last = m.end();
    }

    if last < title.len() {
        tokens.push(&title[last..]);
    }

    tokens
}

fn resolve_split_title(title: &str, url: Option<&Url>) -> String {
    let tokens = tokenize(title);

    if let Some(resolved) = clean_breadcrumbs(title, &tokens) {
        return resolved;
    }

    clean_domain_from_title(&tokens, url).unwrap_or_else(|| title.to_string())
}

/// Resolve a navigation-trail title.
///
/// Returns `None` when the breadcrumb shape does not apply, and the original
/// title when it applies but neither end segment is long enough.
fn clean_breadcrumbs(title: &str, tokens: &[&str]) -> Option<String> {
    if tokens.len() < MIN_BREADCRUMB_TOKENS {
        return None;
    }

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for token in tokens.iter().filter(|t| SEPARATOR_RE.is_match(t)) {
        match counts.iter_mut().find(|(t, _)| t == token) {
            Some((_, count)) => *count += 1,
            None => counts.push((*token, 1)),
        }
    }

    let mut divider: Option<(&str, usize)> = None;
    for (token, count) in counts {
        if count < MIN_BREADCRUMB_REPEATS || token.chars().count() > MAX_BREADCRUMB_DIVIDER {
            continue;
        }
        if divider.is_none_or(|(_, best)| count > best) {
            divider = Some((token, count));
        }
    }

    let (divider, _) = divider?;
    let segments: Vec<&str> = title.split(divider).collect();
    let first = segments.first().map(|s| s.trim()).unwrap_or_default();
    let last = segments.last().map(|s| s.trim()).unwrap_or_default();
    let longer = if last.chars().count() > first.chars().count() { last } else { first };

    if longer.chars().count() > MIN_SEGMENT_CHARS { Some(longer.to_string()) } else { Some(title.to_string()) }
}

/// Drop a leading or trailing segment that names the site.
fn clean_domain_from_title(tokens: &[&str], url: Option<&Url>) -> Option<String> {
    let host = url.and_then(Url::host_str)?;
    let naked = naked_domain(host);

    if tokens.len() < 3 {
        return None;
    }

    let start = slug(tokens[0]);
    if similarity(&start, &naked) > DOMAIN_MATCH_RATIO && start.chars().count() > MIN_DOMAIN_SLUG_CHARS {
        return Some(tokens[2..].concat());
    }

    let end = slug(tokens[tokens.len() - 1]);
    if similarity(&end, &naked) > DOMAIN_MATCH_RATIO && end.chars().count() > MIN_DOMAIN_SLUG_CHARS {
        return Some(tokens[..tokens.len() - 2].concat());
    }

    None
}

fn slug(token: &str) -> String {
    token.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
}

/// Lower-case host without `www.` and without a common domain ending.
pub fn naked_domain(host: &str) -> String {
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    DOMAIN_ENDINGS
        .iter()
        .find_map(|ending| host.strip_suffix(ending))
        .unwrap_or(host)
        .to_string()
}

/// Levenshtein edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Similarity ratio `1 - distance / max_len`, clamped at 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    (1.0 - levenshtein(a, b) as f64 / max_len as f64).max(0.0)
}
