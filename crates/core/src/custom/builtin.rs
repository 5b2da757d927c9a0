use super::definition::CustomExtractor;
use crate::Result;

const BUILTIN_DEFINITIONS: &str = include_str!("builtin.json");

/// Definitions shipped with the library, validated.
pub fn builtin_extractors() -> Result<Vec<CustomExtractor>> {
    let extractors: Vec<CustomExtractor> = serde_json::from_str(BUILTIN_DEFINITIONS)?;
    for extractor in &extractors {
        extractor.validate()?;
    }
    Ok(extractors)
}
