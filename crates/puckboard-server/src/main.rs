// crates/puckboard-server/src/main.rs
// ============================================================================
// Module: Puckboard Server Binary
// Description: CLI entry point for the serving process.
// Purpose: Load configuration, build state, and serve the router.
// Dependencies: axum-server, clap, puckboard-server, tokio
// ============================================================================

//! ## Overview
//! The binary loads an optional TOML config, overlays the well-known
//! environment variables, validates fail-closed, optionally attaches the
//! object-storage signer, and serves the router until interrupted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use puckboard_config::PuckboardConfig;
use puckboard_media::S3UrlSigner;
use puckboard_server::AppState;
use puckboard_server::build_router;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Puckboard hockey-analytics serving backend.
#[derive(Debug, Parser)]
#[command(name = "puckboard-server", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the bind address from the config.
    #[arg(long)]
    bind: Option<String>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Loads configuration and runs the server.
async fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => PuckboardConfig::from_file(path).map_err(|err| err.to_string())?,
        None => PuckboardConfig::default(),
    };
    config = config.with_env_overrides();
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let bind: SocketAddr =
        config.server.bind.parse().map_err(|_| format!("invalid bind: {}", config.server.bind))?;
    let media_configured = config.media.bucket.is_some();
    let mut state = AppState::from_config(config).map_err(|err| err.to_string())?;
    if media_configured {
        state = state.with_signer(Arc::new(S3UrlSigner::from_env().await));
    }

    let router = build_router(Arc::new(state));
    axum_server::bind(bind)
        .serve(router.into_make_service())
        .await
        .map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            // The server runs under a supervisor; startup failures land on
            // stderr before the audit sink exists.
            #[allow(clippy::print_stderr, reason = "Startup failure before audit wiring.")]
            {
                eprintln!("puckboard-server: {message}");
            }
            ExitCode::FAILURE
        }
    }
}
