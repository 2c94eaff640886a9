//! Test helpers shared by the eduscout-search integration tests

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::capture_logs;

use eduscout_search::models::CandidateItem;
use eduscout_search::services::StaticProvider;
use eduscout_search::{EngineConfig, SearchOrchestrator};
use std::sync::Arc;

/// Candidate that scores high for a Math / fractions context
pub fn strong_fraction_video(id: &str) -> CandidateItem {
    CandidateItem::new(id, format!("Fractions Explained {}", id))
        .with_channel("Khan Academy")
        .with_description("A math lesson on fractions")
}

/// Candidate with no educational signal at all
pub fn noise_video(id: &str) -> CandidateItem {
    CandidateItem::new(id, format!("Weekend vlog {}", id)).with_channel("Random Vlogs")
}

/// Orchestrator over `provider` with default config
pub fn orchestrator(provider: StaticProvider) -> (SearchOrchestrator, Arc<StaticProvider>) {
    orchestrator_with(provider, EngineConfig::default())
}

pub fn orchestrator_with(
    provider: StaticProvider,
    config: EngineConfig,
) -> (SearchOrchestrator, Arc<StaticProvider>) {
    let provider = Arc::new(provider);
    let orchestrator = SearchOrchestrator::new(provider.clone(), &config);
    (orchestrator, provider)
}
