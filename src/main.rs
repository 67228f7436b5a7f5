mod app;

use anyhow::Result;
use clap::Parser;
use crabline::{config, logging};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "crabline", version, about = "Terminal client for Twitch chat")]
struct Cli {
    /// Config file (default: <config dir>/crabline/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Follow this channel on startup; may be repeated
    #[arg(short = 'j', long = "channel")]
    channels: Vec<String>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    for channel in &cli.channels {
        let channel = app::handler::normalize_channel(channel);
        if !channel.is_empty() && !cfg.channels.contains(&channel) {
            cfg.channels.push(channel);
        }
    }

    if cli.write_config {
        let path = cli.config.unwrap_or_else(config::config_path);
        config::save_config(&cfg, &path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    logging::init(&cfg.logging)?;

    // One process-wide crypto provider for wss:// connections
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    if let Err(e) = app::run(cfg).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
