//! Scribe Web Server
//!
//! Research aggregation and content generation over HTTP.

use anyhow::Context;
use clap::Parser;
use scribe_core::{init_logging, AuthMode, ScribeConfig};
use scribe_web::ScribeServerBuilder;
use std::path::PathBuf;
use tracing::{info, warn};

/// Scribe Web Server - multi-source research and AI content generation
#[derive(Parser)]
#[command(name = "scribe-web")]
#[command(about = "HTTP API for research aggregation and content generation")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file (falls back to SCRIBE_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Authentication mode (open, required)
    #[arg(long)]
    auth_mode: Option<AuthMode>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

impl Args {
    /// Layer command line flags over the loaded configuration
    fn apply(&self, config: &mut ScribeConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(mode) = self.auth_mode {
            config.auth.mode = mode;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.dev {
            config.server.dev_mode = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables before the config reads them
    dotenvy::dotenv().ok();

    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var_os("SCRIBE_CONFIG").map(PathBuf::from));
    let mut config =
        ScribeConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        address = %config.server.address(),
        dev_mode = config.server.dev_mode,
        config_file = ?config_path,
        "Scribe configuration loaded"
    );

    let backends_configured = config
        .generation
        .backend_order
        .iter()
        .any(|kind| config.providers.backend_key(*kind).is_some());
    if !backends_configured {
        warn!(
            "No generation backend key set (OPENAI_API_KEY, GROQ_API_KEY or DEEPSEEK_API_KEY); \
             /api/generate will return draft templates"
        );
    }

    let server = ScribeServerBuilder::with_config(config)
        .build()
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["scribe-web"]);
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert!(args.auth_mode.is_none());
        assert!(!args.dev);

        let args = Args::parse_from([
            "scribe-web",
            "--host",
            "0.0.0.0",
            "--port",
            "3000",
            "--auth-mode",
            "open",
            "--log-level",
            "debug",
            "--dev",
        ]);
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(3000));
        assert_eq!(args.auth_mode, Some(AuthMode::Open));
        assert!(args.dev);

        let mut config = ScribeConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.address(), "0.0.0.0:3000");
        assert_eq!(config.auth.mode, AuthMode::Open);
        assert_eq!(config.logging.level, "debug");
        assert!(config.server.dev_mode);
    }

    #[test]
    fn test_invalid_auth_mode_rejected() {
        assert!(Args::try_parse_from(["scribe-web", "--auth-mode", "sometimes"]).is_err());
    }
}
