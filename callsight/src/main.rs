use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callsight::analysis::AnalysisEngine;
use callsight::config::Config;
use callsight::models::{SentimentResult, Transcript, WatchThreshold};
use callsight::scoring::{ScoringProvider, SentimentOracle};

#[derive(Parser)]
#[command(name = "callsight")]
#[command(about = "Earnings-call sentiment, trend, and alerting engine")]
struct Args {
    /// Transcript JSON file to analyze
    transcript: PathBuf,

    /// JSON array of prior results for the company, most recent first
    #[arg(long)]
    history: Option<PathBuf>,

    /// JSON array of per-user watch thresholds
    #[arg(long)]
    watches: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callsight=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.scoring.is_none() {
        tracing::warn!(
            "CALLSIGHT_SCORING_URL is not set — the sentiment oracle is unavailable and analysis will fail."
        );
    }

    let oracle: Arc<dyn SentimentOracle> = Arc::new(ScoringProvider::new(config.scoring.as_ref()));
    let engine = AnalysisEngine::new(&config, oracle)?;

    let transcript: Transcript = serde_json::from_str(&std::fs::read_to_string(&args.transcript)?)?;

    let history: Vec<SentimentResult> = match &args.history {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    let watches: Vec<WatchThreshold> = match &args.watches {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let result = engine.analyze(&transcript, &history, &watches).await?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}
