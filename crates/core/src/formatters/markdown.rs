use crate::Result;

/// Convert HTML content to Markdown
///
/// Conversion failures are returned to the caller, which degrades to plain
/// text rather than failing the extraction.
pub fn convert_to_markdown(html: &str) -> Result<String> {
    let markdown = html_to_markdown(html)?;
    Ok(markdown.trim().to_string())
}

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> Result<String> {
    Ok(htmd::convert(html)?)
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> Result<String> {
    Ok(super::text::convert_to_text(html))
}

#[cfg(all(test, feature = "markdown"))]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_markdown_basic() {
        let markdown = convert_to_markdown(r#"<h1>Title</h1><p>This is a paragraph.</p>"#).unwrap();
        assert!(markdown.contains("# Title"));
        assert!(markdown.contains("This is a paragraph."));
    }

    #[test]
    fn test_html_to_markdown_with_links() {
        let html = r#"<p>Check out <a href="https://example.com">this link</a>.</p>"#;
        let markdown = convert_to_markdown(html).unwrap();
        assert!(markdown.contains("[this link](https://example.com)"));
    }

    #[test]
    fn test_html_to_markdown_with_images() {
        let html = r#"<p>An image: <img src="photo.jpg" alt="A photo"></p>"#;
        let markdown = convert_to_markdown(html).unwrap();
        assert!(markdown.contains("![A photo](photo.jpg)"));
    }

    #[test]
    fn test_html_to_markdown_with_blockquotes() {
        let markdown = convert_to_markdown(r#"<blockquote>This is a quote</blockquote>"#).unwrap();
        assert!(markdown.contains("> This is a quote"));
    }
}
