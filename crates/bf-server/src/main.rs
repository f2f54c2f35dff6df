//! BinForge server binary
//!
//! Loads the configuration and filter set, then serves the blocking
//! request/reply loop until terminated. Startup problems (unreadable
//! config, missing impulse responses, bind failure) are fatal with a
//! diagnostic; per-request problems are logged and never stop the server.

mod frame;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use bf_engine::{Engine, EngineConfig};
use clap::Parser;

use crate::server::Server;

#[derive(Parser)]
#[command(name = "bf-server", about = "Real-time binaural synthesis server")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Listen address for the request/reply transport
    #[arg(long, default_value = "127.0.0.1:12346")]
    listen: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = EngineConfig::from_file(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let engine = Engine::new(config).context("initializing engine")?;
    let server = Server::bind(engine, args.listen)?;
    server.run()
}
