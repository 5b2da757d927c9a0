//! Output collaborators: HTML sanitization, Markdown conversion and plain text.

pub mod markdown;
pub mod sanitize;
pub mod text;

pub use markdown::convert_to_markdown;
pub use sanitize::sanitize_html;
pub use text::{convert_to_text, html_to_plain_text, normalize_spaces, strip_tags};
