//! eduscout-search library interface
//!
//! Contextual search-and-ranking engine for educational video content.
//! Exposes public APIs for the `eduscout` binary and integration tests.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::config::EngineConfig;
pub use crate::error::{EngineResult, SearchError};
pub use crate::models::{SearchContext, SearchResult};
pub use crate::services::{PerformanceMetrics, SearchOrchestrator};
pub use crate::types::{ContentProvider, FetchOutcome, ProviderError, SearchFilters};
