//! Per-domain custom extractors.
//!
//! A [`CustomExtractor`] is a declarative override of the generic heuristics
//! for one site: per-field selector rules, elements to clean out and
//! transforms to apply. Definitions are JSON, validated when they enter an
//! [`ExtractorRegistry`], and looked up by exact host.
//!
//! ```rust
//! use pith_core::custom::{CustomExtractor, ExtractorRegistry};
//!
//! let mut registry = ExtractorRegistry::new();
//! registry
//!     .register(CustomExtractor::from_json(r#"{"domain": "example.com", "content": {"selectors": ["article"]}}"#).unwrap())
//!     .unwrap();
//!
//! assert!(registry.get("example.com").is_some());
//! assert!(registry.get("www.example.com").is_none());
//! ```

mod builtin;
mod definition;
mod loader;
mod registry;
mod select;
mod transform;

pub use builtin::builtin_extractors;
pub use definition::{CustomExtractor, Field, FieldRules, SelectorRule, Transform};
pub use loader::{RegistryLoader, RegistryLoaderBuilder, load_file};
pub use registry::ExtractorRegistry;
pub use select::{select_content, select_text};
pub use transform::{apply_transforms, remove_matching};
