use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PithError, Result};

/// How a field value is read from the document.
///
/// JSON forms: a string is [`SelectorRule::Text`], an object with `selector`
/// and `attribute` is [`SelectorRule::Attribute`], an array of strings is
/// [`SelectorRule::MultiMatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorRule {
    /// Read the text (or markup, for content) of the matched elements
    Text(String),
    /// Read an attribute of the matched elements
    Attribute { selector: String, attribute: String },
    /// A group that applies only when every member matches something
    MultiMatch(Vec<String>),
}

impl SelectorRule {
    /// Every CSS selector referenced by this rule.
    pub fn selectors(&self) -> Vec<&str> {
        match self {
            SelectorRule::Text(selector) => vec![selector.as_str()],
            SelectorRule::Attribute { selector, .. } => vec![selector.as_str()],
            SelectorRule::MultiMatch(group) => group.iter().map(String::as_str).collect(),
        }
    }
}

/// A rewrite applied to elements of a selected field before it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Rename the element to a different tag
    Rename { value: String },
    /// Remove the element but keep its children in place
    Unwrap,
    /// Replace `<noscript>` with `<div>`, keeping its markup
    NoscriptToDiv,
    /// Move an attribute value from `from` to `to`
    MoveAttr { from: String, to: String },
    /// Set attribute to a fixed value
    SetAttr { name: String, value: String },
    /// Remove the element and its content
    Remove,
}

/// Extraction rules for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Rules tried in order; the first that yields a non-empty value wins
    #[serde(default)]
    pub selectors: Vec<SelectorRule>,
    /// Elements removed from the selection
    #[serde(default)]
    pub clean: Vec<String>,
    /// Transforms keyed by the selector they apply to
    #[serde(default)]
    pub transforms: BTreeMap<String, Transform>,
}

/// The fields a custom extractor can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Author,
    DatePublished,
    LeadImageUrl,
    Dek,
    Excerpt,
    Content,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Author,
        Field::DatePublished,
        Field::LeadImageUrl,
        Field::Dek,
        Field::Excerpt,
        Field::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::DatePublished => "date_published",
            Field::LeadImageUrl => "lead_image_url",
            Field::Dek => "dek",
            Field::Excerpt => "excerpt",
            Field::Content => "content",
        }
    }
}

/// A per-domain declarative override of the generic extraction rules.
///
/// # Example
///
/// ```rust
/// use pith_core::custom::{CustomExtractor, Field, SelectorRule};
///
/// let json = r#"{
///     "domain": "example.com",
///     "title": { "selectors": ["h1.headline"] },
///     "content": { "selectors": [["p.one", "p.two"]], "clean": [".ad"] }
/// }"#;
///
/// let extractor = CustomExtractor::from_json(json).unwrap();
/// let content = extractor.rules(Field::Content).unwrap();
/// assert!(matches!(content.selectors[0], SelectorRule::MultiMatch(_)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomExtractor {
    /// Primary domain this extractor applies to
    pub domain: String,
    /// Additional domains served by the same rules
    #[serde(default)]
    pub supported_domains: Vec<String>,
    #[serde(default)]
    pub title: Option<FieldRules>,
    #[serde(default)]
    pub author: Option<FieldRules>,
    #[serde(default)]
    pub date_published: Option<FieldRules>,
    #[serde(default)]
    pub lead_image_url: Option<FieldRules>,
    #[serde(default)]
    pub dek: Option<FieldRules>,
    #[serde(default)]
    pub excerpt: Option<FieldRules>,
    #[serde(default)]
    pub content: Option<FieldRules>,
}

impl CustomExtractor {
    /// Parse and validate a single definition.
    pub fn from_json(json: &str) -> Result<Self> {
        let extractor: CustomExtractor = serde_json::from_str(json)?;
        extractor.validate()?;
        Ok(extractor)
    }

    /// Rules configured for a field, if any.
    pub fn rules(&self, field: Field) -> Option<&FieldRules> {
        match field {
            Field::Title => self.title.as_ref(),
            Field::Author => self.author.as_ref(),
            Field::DatePublished => self.date_published.as_ref(),
            Field::LeadImageUrl => self.lead_image_url.as_ref(),
            Field::Dek => self.dek.as_ref(),
            Field::Excerpt => self.excerpt.as_ref(),
            Field::Content => self.content.as_ref(),
        }
    }

    /// Every domain this extractor is registered under, lower-cased.
    pub fn domains(&self) -> Vec<String> {
        std::iter::once(&self.domain)
            .chain(self.supported_domains.iter())
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }

    /// Check every selector up front so that lookups never fail at use time.
    ///
    /// Field selectors must parse as document queries. `clean` and transform
    /// selectors must also parse for the streaming rewriter.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(PithError::RegistryError("extractor definition has an empty domain".to_string()));
        }

        for field in Field::ALL {
            let Some(rules) = self.rules(field) else { continue };

            for rule in &rules.selectors {
                if let SelectorRule::MultiMatch(group) = rule
                    && group.is_empty()
                {
                    return Err(PithError::RegistryError(format!(
                        "{}: empty selector group in field `{}`",
                        self.domain,
                        field.as_str()
                    )));
                }
                for selector in rule.selectors() {
                    validate_query(selector)?;
                }
            }

            for selector in rules.clean.iter().chain(rules.transforms.keys()) {
                validate_query(selector)?;
                validate_rewrite(selector)?;
            }

            for (selector, transform) in &rules.transforms {
                validate_transform(selector, transform)?;
            }
        }

        Ok(())
    }
}

fn validate_query(selector: &str) -> Result<()> {
    scraper::Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| PithError::InvalidSelector { selector: selector.to_string(), reason: e.to_string() })
}

/// Tag and attribute names a rewrite may write.
fn validate_transform(selector: &str, transform: &Transform) -> Result<()> {
    let invalid = |what: &str, name: &str| {
        PithError::RegistryError(format!("transform on `{selector}` has invalid {what} `{name}`"))
    };

    match transform {
        Transform::Rename { value } if !is_tag_name(value) => Err(invalid("tag name", value)),
        Transform::MoveAttr { from, to } => match [from, to].into_iter().find(|name| !is_attr_name(name)) {
            Some(name) => Err(invalid("attribute name", name)),
            None => Ok(()),
        },
        Transform::SetAttr { name, .. } if !is_attr_name(name) => Err(invalid("attribute name", name)),
        _ => Ok(()),
    }
}

fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| !c.is_whitespace() && !c.is_control() && !matches!(c, '/' | '>' | '=' | '"' | '\''))
}

fn validate_rewrite(selector: &str) -> Result<()> {
    lol_html::Selector::from_str(selector)
        .map(|_| ())
        .map_err(|e| PithError::InvalidSelector { selector: selector.to_string(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"{
        "domain": "Example.com",
        "supported_domains": ["news.example.com"],
        "title": { "selectors": ["h1.title", {"selector": "meta[name=\"og:title\"]", "attribute": "content"}] },
        "content": {
            "selectors": [["div.part-one", "div.part-two"], "article"],
            "clean": [".ad", "aside"],
            "transforms": {
                "h1": {"type": "rename", "value": "h2"},
                "span.wrapper": {"type": "unwrap"},
                "img": {"type": "move_attr", "from": "data-src", "to": "src"}
            }
        }
    }"#;

    #[test]
    fn test_selector_rule_forms() {
        let extractor = CustomExtractor::from_json(DEFINITION).unwrap();

        let title = extractor.rules(Field::Title).unwrap();
        assert_eq!(title.selectors[0], SelectorRule::Text("h1.title".to_string()));
        assert_eq!(
            title.selectors[1],
            SelectorRule::Attribute { selector: "meta[name=\"og:title\"]".to_string(), attribute: "content".to_string() }
        );

        let content = extractor.rules(Field::Content).unwrap();
        assert_eq!(
            content.selectors[0],
            SelectorRule::MultiMatch(vec!["div.part-one".to_string(), "div.part-two".to_string()])
        );
        assert_eq!(content.clean, vec![".ad", "aside"]);
        assert_eq!(content.transforms["h1"], Transform::Rename { value: "h2".to_string() });
        assert_eq!(content.transforms["span.wrapper"], Transform::Unwrap);
        assert!(extractor.rules(Field::Author).is_none());
    }

    #[test]
    fn test_domains_are_normalized() {
        let extractor = CustomExtractor::from_json(DEFINITION).unwrap();
        assert_eq!(extractor.domains(), vec!["example.com", "news.example.com"]);
    }

    #[test]
    fn test_invalid_field_selector_rejected() {
        let json = r#"{"domain": "example.com", "title": {"selectors": ["h1[[broken"]}}"#;
        let err = CustomExtractor::from_json(json).unwrap_err();
        assert!(matches!(err, PithError::InvalidSelector { ref selector, .. } if selector == "h1[[broken"));
    }

    #[test]
    fn test_invalid_clean_selector_rejected() {
        let json = r#"{"domain": "example.com", "content": {"selectors": ["article"], "clean": ["div >> p"]}}"#;
        assert!(matches!(CustomExtractor::from_json(json), Err(PithError::InvalidSelector { .. })));
    }

    #[test]
    fn test_empty_group_rejected() {
        let json = r#"{"domain": "example.com", "content": {"selectors": [[]]}}"#;
        assert!(matches!(CustomExtractor::from_json(json), Err(PithError::RegistryError(_))));
    }

    #[test]
    fn test_invalid_rename_target_rejected() {
        for target in ["", "bad tag", "1h", "h2>"] {
            let json = format!(
                r#"{{"domain": "example.com", "content": {{"selectors": ["article"], "transforms": {{"h1": {{"type": "rename", "value": "{target}"}}}}}}}}"#
            );
            assert!(matches!(CustomExtractor::from_json(&json), Err(PithError::RegistryError(_))), "{target:?}");
        }
    }

    #[test]
    fn test_invalid_attribute_names_rejected() {
        let json = r#"{"domain": "example.com", "content": {"selectors": ["article"],
            "transforms": {"img": {"type": "move_attr", "from": "data-src", "to": "s rc"}}}}"#;
        assert!(matches!(CustomExtractor::from_json(json), Err(PithError::RegistryError(_))));

        let json = r#"{"domain": "example.com", "content": {"selectors": ["article"],
            "transforms": {"a": {"type": "set_attr", "name": "", "value": "x"}}}}"#;
        assert!(matches!(CustomExtractor::from_json(json), Err(PithError::RegistryError(_))));
    }

    #[test]
    fn test_custom_element_rename_accepted() {
        let json = r#"{"domain": "example.com", "content": {"selectors": ["article"],
            "transforms": {"h1": {"type": "rename", "value": "my-heading"}}}}"#;
        assert!(CustomExtractor::from_json(json).is_ok());
    }

    #[test]
    fn test_empty_domain_rejected() {
        let json = r#"{"domain": "  "}"#;
        assert!(matches!(CustomExtractor::from_json(json), Err(PithError::RegistryError(_))));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(CustomExtractor::from_json("{not json"), Err(PithError::Serialization(_))));
    }
}
