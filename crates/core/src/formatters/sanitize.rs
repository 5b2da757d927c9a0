use super::text::html_to_plain_text;

/// Elements removed outright, content included.
const UNSAFE_TAGS: [&str; 12] = [
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "form", "input", "button", "textarea",
];

/// Attributes that carry URLs and are checked for script schemes.
const URL_ATTRS: [&str; 4] = ["href", "src", "action", "formaction"];

fn is_script_url(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    let lower = compact.to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:text/html")
}

/// Make extracted HTML safe to embed
///
/// Drops script-capable elements, inline event handlers and script URLs.
/// Degrades to escaped plain text if the rewriter fails.
pub fn sanitize_html(html: &str) -> String {
    let mut handlers: Vec<_> = UNSAFE_TAGS
        .into_iter()
        .map(|tag| {
            lol_html::element!(tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    handlers.push(lol_html::element!("*", |el| {
        let unsafe_attrs: Vec<String> = el
            .attributes()
            .iter()
            .filter(|attr| {
                let name = attr.name();
                name.starts_with("on") || (URL_ATTRS.contains(&name.as_str()) && is_script_url(&attr.value()))
            })
            .map(|attr| attr.name())
            .collect();

        for name in unsafe_attrs {
            el.remove_attribute(&name);
        }
        Ok(())
    }));

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return escape_text(&html_to_plain_text(html));
    }

    output
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
