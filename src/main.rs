//! story-relay entry point.
//!
//! Parses CLI flags, loads configuration (file, then environment), initializes
//! tracing, builds the prompt templates and the provider client, and serves the
//! router until SIGINT/SIGTERM. Any startup failure is logged and the process
//! exits non-zero.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use story_relay::config::{AppConfig, ConfigError, LogFormat, DEFAULT_LOG_FILTER};
use story_relay::http::start_server;
use story_relay::prompt::PromptBuilder;
use story_relay::provider::{GeminiProvider, TextProvider};
use story_relay::routes::create_router;
use story_relay::state::AppState;

/// story-relay: generate agile user stories from feature descriptions
#[derive(Parser, Debug)]
#[command(name = "story-relay", version, about)]
struct Args {
    /// Path to configuration file (defaults to config/default.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "story_relay=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Listen port (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,
}

/// Initialize tracing with priority: CLI > env > default
fn init_tracing(log_level: Option<&str>, format: LogFormat) {
    let log_filter = log_level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry = tracing_subscriber::registry().with(EnvFilter::new(&log_filter));
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run(
    args: Args,
    config: Result<AppConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config?;
    config.apply_cli_port(args.port);

    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        environment = %config.environment,
        allowed_origins = config.cors.allowed_origins.len(),
        "Loaded configuration"
    );

    let prompts = PromptBuilder::new()?;
    tracing::info!("Initialized prompt templates");

    let provider = GeminiProvider::new(&config.provider)?;
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        timeout_secs = ?config.provider.request_timeout_seconds,
        "Initialized provider"
    );

    let http_config = config.http.clone();
    let state = AppState::new(config, prompts, Arc::new(provider));
    let app = create_router(state)?;

    start_server(app, &http_config).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Configuration decides the log format, so load it first and report
    // any failure once tracing is up.
    let config = AppConfig::load(args.config.as_deref());
    let format = config
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or_default();
    init_tracing(args.log_level.as_deref(), format);

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start story-relay");
            ExitCode::FAILURE
        }
    }
}
