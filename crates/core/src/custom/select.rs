//! Evaluating a field's selector rules against a document.
//!
//! Rules are tried in order and the first one yielding a non-empty value
//! wins. A [`SelectorRule::MultiMatch`] group is considered only when every
//! member matches at least one element.

use std::collections::HashSet;

use ego_tree::NodeId;

use super::definition::{FieldRules, SelectorRule};
use super::transform::{apply_transforms, remove_matching};
use crate::formatters::text::{html_to_plain_text, normalize_spaces};
use crate::parse::{Document, Element};

/// Resolve a text field (title, author, date, ...).
///
/// Text rules read the first matched element whose cleaned text is
/// non-empty. A group reads the first match of each member and joins the
/// texts with a space.
pub fn select_text(doc: &Document, rules: &FieldRules) -> Option<String> {
    rules.selectors.iter().find_map(|rule| match rule {
        SelectorRule::Text(selector) => doc
            .select(selector)
            .ok()?
            .iter()
            .map(|el| element_text(el, rules))
            .find(|text| !text.is_empty()),
        SelectorRule::Attribute { selector, attribute } => attribute_value(doc, selector, attribute),
        SelectorRule::MultiMatch(group) => {
            let texts = group
                .iter()
                .map(|selector| doc.select(selector).ok()?.first().map(|el| element_text(el, rules)))
                .collect::<Option<Vec<_>>>()?;
            let joined = normalize_spaces(&texts.join(" "));
            (!joined.is_empty()).then_some(joined)
        }
    })
}

/// Resolve the content field.
///
/// Every element matched by the winning rule contributes its inner markup.
/// Fragments are joined with newlines in document order, each element at
/// most once. Clean selectors and transforms run over the joined markup.
pub fn select_content(doc: &Document, rules: &FieldRules) -> Option<String> {
    rules.selectors.iter().find_map(|rule| {
        let markup = match rule {
            SelectorRule::Text(selector) => {
                let matched = doc.select(selector).ok()?;
                join_in_document_order(doc, &matched)
            }
            SelectorRule::Attribute { selector, attribute } => {
                let values: Vec<&str> = doc
                    .select(selector)
                    .ok()?
                    .iter()
                    .filter_map(|el| el.attr(attribute))
                    .filter(|value| !value.trim().is_empty())
                    .collect();
                values.join("\n")
            }
            SelectorRule::MultiMatch(group) => {
                let mut matched = Vec::new();
                for selector in group {
                    let found = doc.select(selector).ok()?;
                    if found.is_empty() {
                        return None;
                    }
                    matched.extend(found);
                }
                join_in_document_order(doc, &matched)
            }
        };

        let cleaned = clean_markup(&markup, rules);
        (!html_to_plain_text(&cleaned).is_empty()).then_some(cleaned)
    })
}

fn clean_markup(html: &str, rules: &FieldRules) -> String {
    let transformed = apply_transforms(html, &rules.transforms);
    remove_matching(&transformed, &rules.clean)
}

fn element_text(el: &Element<'_>, rules: &FieldRules) -> String {
    if rules.clean.is_empty() && rules.transforms.is_empty() {
        return normalize_spaces(&el.text());
    }
    html_to_plain_text(&clean_markup(&el.outer_html(), rules))
}

fn attribute_value(doc: &Document, selector: &str, attribute: &str) -> Option<String> {
    doc.select(selector)
        .ok()?
        .iter()
        .filter_map(|el| el.attr(attribute))
        .map(normalize_spaces)
        .find(|value| !value.is_empty())
}

fn join_in_document_order(doc: &Document, matched: &[Element<'_>]) -> String {
    let wanted: HashSet<NodeId> = matched.iter().map(Element::node_id).collect();
    doc.elements()
        .filter(|el| wanted.contains(&el.node_id()))
        .map(|el| el.inner_html())
        .collect::<Vec<_>>()
        .join("\n")
}
