mod config;
mod errors;
mod files;
mod logging;
mod security;
mod server;
mod types;


use crate::config::{Config, Overrides};
use crate::security::Sandbox;
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG: &str = "mdtail.toml";

#[derive(Debug, Parser)]
#[command(
    name = "mdtail",
    about = "Serve a directory of Markdown notes and log files over a small JSON API"
)]
struct Cli {
    /// Config file (.toml or .json); `mdtail.toml` is picked up when present
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Address to bind, default 127.0.0.1
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on, default 8000
    #[arg(long)]
    port: Option<u16>,
    /// Directory every request is confined to
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match cli.config.as_deref() {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            Config::load(Path::new(DEFAULT_CONFIG)).context("loading mdtail.toml")?
        }
        None => Config::default(),
    };
    let cfg = cfg.apply(Overrides { host: cli.host, port: cli.port, root: cli.root });
    cfg.validate().context("validating config")?;

    logging::init(&cfg.logging);

    let sandbox = Sandbox::new(&cfg.root.root_dir).context("canonicalizing root")?;
    info!(
        addr = %format!("{}:{}", cfg.server.bind_addr, cfg.server.port),
        root = %sandbox.root().display(),
        "mdtail ready"
    );

    server::serve(cfg, sandbox).await
}
