//! eduscout - contextual educational video search
//!
//! **Usage:**
//! ```bash
//! eduscout search "fractions" --subject Math --grade "5th grade" --topic fractions
//! eduscout search "volcanoes" --subject Science --grade "Grade 7" --fixture fixture.json
//! eduscout expand "photosynthesis" --subject Biology --grade "High School"
//! eduscout thresholds --subject Art --grade College
//! ```
//!
//! Output is JSON on stdout; logs go to stderr (`RUST_LOG` overrides the
//! configured level).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eduscout_common::config::{resolve_config_path, write_atomic};
use eduscout_search::config::CONFIG_ENV_VAR;
use eduscout_search::models::SearchPreferences;
use eduscout_search::services::{PatternCache, StaticProvider, YouTubeClient};
use eduscout_search::{ContentProvider, EngineConfig, SearchContext, SearchOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "eduscout", version)]
#[command(about = "Find and rank educational videos for a lesson context")]
struct Cli {
    /// Config file (defaults to $EDUSCOUT_CONFIG, then ~/.config/eduscout/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search and rank candidates for a term
    Search(SearchArgs),
    /// Print the alternate terms a fallback would try
    Expand {
        term: String,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Print the thresholds for a context
    Thresholds {
        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(Args, Debug)]
struct ContextArgs {
    #[arg(long, default_value = "")]
    subject: String,

    #[arg(long, default_value = "")]
    grade: String,

    #[arg(long, default_value = "")]
    topic: String,

    /// Target duration in minutes
    #[arg(long, value_name = "MINUTES")]
    duration: Option<u32>,

    /// Previously successful term (repeatable)
    #[arg(long = "previous", value_name = "TERM")]
    previous_terms: Vec<String>,

    /// Channel to boost (repeatable)
    #[arg(long = "prefer-channel", value_name = "CHANNEL")]
    preferred_channels: Vec<String>,

    /// Channel to exclude (repeatable)
    #[arg(long = "exclude-channel", value_name = "CHANNEL")]
    excluded_channels: Vec<String>,

    /// Drop results below this confidence
    #[arg(long, value_name = "0-100")]
    min_confidence: Option<u8>,
}

impl ContextArgs {
    fn to_context(&self) -> SearchContext {
        let context = SearchContext::new(&self.subject, &self.grade, &self.topic)
            .with_previous_terms(self.previous_terms.clone())
            .with_preferences(SearchPreferences {
                min_confidence: self.min_confidence,
                preferred_channels: self.preferred_channels.clone(),
                excluded_channels: self.excluded_channels.clone(),
            });
        match self.duration {
            Some(minutes) => context.with_target_duration(minutes),
            None => context,
        }
    }
}

#[derive(Args, Debug)]
struct SearchArgs {
    term: String,

    #[command(flatten)]
    context: ContextArgs,

    /// Serve candidates from a JSON fixture instead of the YouTube API
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Override `[search] max_results`
    #[arg(long)]
    max_results: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref(), CONFIG_ENV_VAR);
    let mut config = EngineConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    match cli.command {
        Command::Search(args) => {
            if let Some(max_results) = args.max_results {
                config.search.max_results = max_results;
                config.validate()?;
            }
            run_search(&config, args).await
        }
        Command::Expand { term, context } => {
            let orchestrator = build_orchestrator(&config, Arc::new(StaticProvider::new()))?;
            let alternates = orchestrator.alternates_for(&term, &context.to_context());
            print_json(&alternates)
        }
        Command::Thresholds { context } => {
            let orchestrator = build_orchestrator(&config, Arc::new(StaticProvider::new()))?;
            print_json(&orchestrator.thresholds_for(&context.to_context()))
        }
    }
}

async fn run_search(config: &EngineConfig, args: SearchArgs) -> Result<()> {
    let provider: Arc<dyn ContentProvider> = match &args.fixture {
        Some(path) => Arc::new(StaticProvider::from_json_file(path)?),
        None => Arc::new(YouTubeClient::new(&config.provider, config.resolve_api_key())?),
    };
    info!(provider = provider.name(), "Content provider ready");

    let orchestrator = build_orchestrator(config, provider)?;
    let context = args.context.to_context();

    let result = orchestrator
        .search(&args.term, &context)
        .await
        .with_context(|| format!("Search for '{}' failed", args.term))?;

    if let Some(path) = &config.cache.snapshot_path {
        save_cache(orchestrator.cache(), path)?;
    }

    print_json(&serde_json::json!({
        "result": result,
        "metrics": orchestrator.performance_metrics(),
    }))
}

/// Orchestrator with the cache snapshot (if configured) restored
fn build_orchestrator(config: &EngineConfig, provider: Arc<dyn ContentProvider>) -> Result<SearchOrchestrator> {
    let cache = Arc::new(PatternCache::from_config(&config.cache));

    if let Some(path) = &config.cache.snapshot_path {
        if path.exists() {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read cache snapshot {}", path.display()))?;
            let report = cache.restore_json(&json);
            if report.discarded > 0 {
                warn!(
                    path = %path.display(),
                    discarded = report.discarded,
                    "Cache snapshot had malformed entries"
                );
            }
            info!(path = %path.display(), contexts = report.loaded, "Pattern cache restored");
        }
    }

    Ok(SearchOrchestrator::new(provider, config).with_cache(cache))
}

fn save_cache(cache: &PatternCache, path: &Path) -> Result<()> {
    let json = cache.to_json()?;
    write_atomic(path, json.as_bytes())
        .with_context(|| format!("Failed to write cache snapshot {}", path.display()))?;
    info!(path = %path.display(), contexts = cache.len(), "Pattern cache saved");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
