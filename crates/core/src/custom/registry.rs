use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::definition::CustomExtractor;
use crate::Result;

/// Domain-keyed table of custom extractors.
///
/// Lookups are exact on the lower-cased host. The registry is an ordinary
/// value: build one, pass it to [`crate::Readability`], and replace it
/// wholesale to reload.
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    map: HashMap<String, Arc<CustomExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register an extractor under its domain and every
    /// supported domain. A later registration for the same domain replaces
    /// the earlier one.
    pub fn register(&mut self, extractor: CustomExtractor) -> Result<()> {
        extractor.validate()?;

        let extractor = Arc::new(extractor);
        for domain in extractor.domains() {
            if self.map.insert(domain.clone(), Arc::clone(&extractor)).is_some() {
                debug!(domain = %domain, "replacing custom extractor");
            }
        }

        Ok(())
    }

    /// Exact lookup by host.
    pub fn get(&self, domain: &str) -> Option<&CustomExtractor> {
        self.map.get(&domain.to_lowercase()).map(Arc::as_ref)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.map.contains_key(&domain.to_lowercase())
    }

    /// Registered domains, sorted.
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.map.keys().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PithError;

    fn extractor(json: &str) -> CustomExtractor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_register_with_supported_domains() {
        let mut registry = ExtractorRegistry::new();
        registry
            .register(extractor(
                r#"{"domain": "example.com", "supported_domains": ["m.example.com", "News.Example.com"]}"#,
            ))
            .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.domains(), vec!["example.com", "m.example.com", "news.example.com"]);
        assert_eq!(registry.get("news.example.com").map(|e| e.domain.as_str()), Some("example.com"));
        assert!(registry.contains("EXAMPLE.COM"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut registry = ExtractorRegistry::new();
        registry.register(extractor(r#"{"domain": "example.com"}"#)).unwrap();

        assert!(registry.get("www.example.com").is_none());
        assert!(registry.get("example.org").is_none());
    }

    #[test]
    fn test_later_registration_replaces() {
        let mut registry = ExtractorRegistry::new();
        registry.register(extractor(r#"{"domain": "example.com", "title": {"selectors": ["h1"]}}"#)).unwrap();
        registry.register(extractor(r#"{"domain": "example.com", "title": {"selectors": ["h2"]}}"#)).unwrap();

        assert_eq!(registry.len(), 1);
        let title = registry.get("example.com").and_then(|e| e.title.as_ref()).unwrap();
        assert_eq!(title.selectors.len(), 1);
        assert!(matches!(&title.selectors[0], crate::custom::SelectorRule::Text(s) if s == "h2"));
    }

    #[test]
    fn test_register_rejects_invalid_selector() {
        let mut registry = ExtractorRegistry::new();
        let result = registry.register(extractor(r#"{"domain": "example.com", "author": {"selectors": ["p[["]}}"#));

        assert!(matches!(result, Err(PithError::InvalidSelector { .. })));
        assert!(registry.is_empty());
    }
}
