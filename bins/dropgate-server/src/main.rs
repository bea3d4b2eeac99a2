//! Dropgate Server
//!
//! Sells a single protected file: creates provider invoices, exchanges
//! settled invoices for short-lived signed download tokens, and streams the
//! file to bearers of a valid token.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod asset;
mod config;
mod routes;

use config::ServerConfig;
use routes::AppState;

/// Dropgate Server
#[derive(Parser)]
#[command(name = "dropgate-server")]
#[command(author, version, about)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "dropgate.toml")]
    config: PathBuf,

    /// Log level (overrides the config's logging.level)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the delivery server
    Start,

    /// Generate default config
    GenConfig {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => cmd_start(cli.config, cli.log_level).await,
        Commands::GenConfig { output } => {
            init_logging(effective_level(cli.log_level.as_deref(), "info"))?;
            cmd_gen_config(output).await
        }
    }
}

async fn cmd_start(config_path: PathBuf, log_level: Option<String>) -> Result<()> {
    let config = ServerConfig::load(&config_path).await?;
    config.validate()?;

    // CLI flag wins; the config's logging section is the fallback
    init_logging(effective_level(log_level.as_deref(), &config.logging.level))?;

    info!("Starting Dropgate server...");

    let state = AppState::from_config(&config)?;
    let app = routes::router(Arc::new(state));

    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!("Listening on {}", config.listen);
    info!("Serving asset from {}", config.asset.path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn cmd_gen_config(output: Option<PathBuf>) -> Result<()> {
    let config = ServerConfig::default();

    if let Some(path) = output {
        config.save(&path).await?;
        println!("Config written to {:?}", path);
    } else {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

fn init_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Pick the log level: the CLI flag when given, the config value otherwise
fn effective_level(cli: Option<&str>, config: &str) -> Level {
    parse_level(cli.unwrap_or(config))
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_cli_flag_overrides_config_level() {
        assert_eq!(effective_level(Some("trace"), "warn"), Level::TRACE);
    }

    #[test]
    fn test_config_level_used_without_cli_flag() {
        assert_eq!(effective_level(None, "error"), Level::ERROR);
    }
}
