//! Angler entry point.
//!
//! ```text
//! angler                        Run with ./angler.toml (or defaults)
//! angler --config <path>        Load a custom config TOML
//! angler --invite-code <code>   Override the invitation code
//! angler --gen-config           Write default config to stdout
//! ```
//!
//! While running, stdin lines are sent to the server verbatim, except
//! `/fish` (start the loop) and `/stop` (stop it).

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use angler::config::AnglerConfig;
use angler::console;
use angler::service::AnglerService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "angler", about = "Unattended fishing client")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "angler.toml")]
    config: PathBuf,

    /// Game server host (overrides the config file).
    #[arg(long)]
    host: Option<String>,

    /// Game server port (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Invitation code (overrides the config file).
    #[arg(long)]
    invite_code: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&AnglerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = AnglerConfig::load(&cli.config);
    if let Some(host) = cli.host {
        config.network.host = host;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(code) = cli.invite_code {
        config.session.invite_code = code;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("angler v{}", env!("CARGO_PKG_VERSION"));
    info!("server: {}:{}", config.network.host, config.network.port);
    info!("mode: {:?}", config.advisor.mode);
    if config.session.invite_code.is_empty() {
        warn!("no invite code configured; the server will not let us in");
    }
    if config.session.player.is_empty() {
        warn!("no player name configured; inventory reports for any player will be handled");
    }

    let service = AnglerService::new(&config)?;
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop();
    });

    service.run(console::spawn_stdin()).await;

    Ok(())
}
