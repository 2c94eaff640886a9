//! Utility modules for eduscout-search

pub mod retry;
pub mod text;

pub use retry::retry_transient;
pub use text::{decode_html_entities, normalize_terms, parse_iso8601_duration, render_template};
