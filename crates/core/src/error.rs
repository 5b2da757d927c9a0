//! Error types for pith operations.
//!
//! This module defines the main error type [`PithError`]. Field extractors never
//! produce errors: a field that cannot be found is simply left empty. The only
//! failures that escape an extraction call are a malformed target URL and
//! cooperative cancellation. The remaining variants belong to the registry
//! loader and to document parsing helpers.
//!
//! # Example
//!
//! ```rust
//! use pith_core::{PithError, Result};
//!
//! fn require_host(url: &str) -> Result<String> {
//!     let parsed = url::Url::parse(url).map_err(|e| PithError::InvalidUrl(e.to_string()))?;
//!     parsed.host_str().map(str::to_string).ok_or_else(|| PithError::InvalidUrl(url.to_string()))
//! }
//! # assert!(require_host("https://example.com").is_ok());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction and registry operations.
#[derive(Error, Debug)]
pub enum PithError {
    /// Invalid or empty target URL.
    ///
    /// Returned at entry when the URL cannot be parsed or carries no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Extraction was cancelled by the caller.
    ///
    /// Cancellation is observed only at phase boundaries, so `phase` names the
    /// boundary at which the signal was seen.
    #[error("Extraction cancelled {phase}")]
    Cancelled { phase: &'static str },

    /// HTML parsing errors.
    ///
    /// Returned when a CSS selector handed to a document query is invalid.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// A custom extractor definition carries a selector that does not parse.
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A custom extractor definition is structurally invalid.
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors while reading definition files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors for definitions and results.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for PithError.
pub type Result<T> = std::result::Result<T, PithError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PithError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_cancelled_error_names_phase() {
        let err = PithError::Cancelled { phase: "after metadata extraction" };
        assert_eq!(err.to_string(), "Extraction cancelled after metadata extraction");
    }

    #[test]
    fn test_invalid_selector_error() {
        let err = PithError::InvalidSelector { selector: "[[x".to_string(), reason: "unexpected token".to_string() };
        assert!(err.to_string().contains("[[x"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PithError = io.into();
        assert!(matches!(err, PithError::Io(_)));
    }
}
