//! Streaming rewrites applied to a selection before it is read.

use std::collections::BTreeMap;

use lol_html::{HtmlRewriter, Settings, element};
use tracing::warn;

use super::definition::Transform;

/// Run the configured transforms over a fragment.
///
/// Transforms are applied in one streaming pass, ordered by selector.
pub fn apply_transforms(html: &str, transforms: &BTreeMap<String, Transform>) -> String {
    if transforms.is_empty() {
        return html.to_string();
    }

    let handlers = transforms
        .iter()
        .map(|(selector, transform)| {
            element!(selector, move |el| {
                match transform {
                    Transform::Rename { value } => {
                        if let Err(e) = el.set_tag_name(value) {
                            warn!(selector = %selector, error = %e, "rename transform skipped");
                        }
                    }
                    Transform::Unwrap => el.remove_and_keep_content(),
                    Transform::NoscriptToDiv => {
                        if el.tag_name() == "noscript" {
                            let _ = el.set_tag_name("div");
                        }
                    }
                    Transform::MoveAttr { from, to } => {
                        if let Some(value) = el.get_attribute(from) {
                            let _ = el.set_attribute(to, &value);
                            el.remove_attribute(from);
                        }
                    }
                    Transform::SetAttr { name, value } => {
                        let _ = el.set_attribute(name, value);
                    }
                    Transform::Remove => el.remove(),
                }
                Ok(())
            })
        })
        .collect();

    let mut output = String::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| output.push_str(&String::from_utf8_lossy(c)),
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    output
}

/// Remove every element matching one of `selectors`, content included.
pub fn remove_matching(html: &str, selectors: &[String]) -> String {
    if selectors.is_empty() {
        return html.to_string();
    }

    let handlers = selectors
        .iter()
        .map(|selector| {
            element!(selector, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    let mut output = String::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| output.push_str(&String::from_utf8_lossy(c)),
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    output
}
