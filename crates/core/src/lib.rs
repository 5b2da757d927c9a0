pub mod article;
pub mod custom;
pub mod dates;
pub mod error;
pub mod extract;
pub mod formatters;
pub mod metadata;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod readability;
pub mod scoring;
pub mod title;

pub use article::{Article, ContentType, convert_content};
pub use custom::{CustomExtractor, ExtractorRegistry, RegistryLoader, RegistryLoaderBuilder, SelectorRule};
pub use dates::parse_date;
pub use error::{PithError, Result};
#[doc(hidden)]
pub use extract::{Candidate, ExtractConfig, ExtractedContent, find_top_candidate, merge_siblings};
pub use extract::extract_content;
pub use formatters::{convert_to_markdown, convert_to_text, normalize_spaces, sanitize_html, strip_tags};
pub use metadata::SiteMetadata;
pub use parse::{Document, Element};
#[doc(hidden)]
pub use postprocess::PostProcessConfig;
pub use postprocess::postprocess_html;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use readability::{Readability, ReadabilityConfig, ReadabilityConfigBuilder, lookup_extractor, parse};
#[doc(hidden)]
pub use scoring::{ScoreMap, add_score, link_density, score_document, score_node, score_paragraph, weight};
pub use title::clean_title;
