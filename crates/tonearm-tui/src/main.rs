//! tonearm: terminal client for the Music Player Daemon.

mod action;
mod app;
mod keymap;
mod lyrics;
mod mailbox;
mod panel;
mod panels;
mod remote;
mod search;
mod session;
mod theme;
mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use tonearm_proto::config::Config;
use tonearm_proto::{platform, MpdClient};

use crate::keymap::Keymap;
use crate::lyrics::{LrcLib, LyricsExchange, LyricsWorker};

#[derive(Parser, Debug)]
#[command(name = "tonearm", version, about)]
struct Args {
    /// Server host name, or the path of a Unix socket
    #[arg(long, env = "MPD_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(long, env = "MPD_PORT")]
    port: Option<u16>,

    /// Config file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    let log_path = data_dir.join("tonearm.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG wins; keep the HTTP client internals quiet otherwise.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,reqwest=warn,hyper=warn,hyper_util=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tonearm log: {}", log_path.display());
    tracing::info!("tonearm starting");

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    if let Some(host) = args.host {
        config.mpd.host = host;
    }
    if let Some(port) = args.port {
        config.mpd.port = port;
    }
    let keymap = Keymap::with_overrides(&config.keys)?;

    let client = MpdClient::connect(
        &config.mpd.host,
        config.mpd.port,
        Duration::from_secs(config.mpd.timeout_secs),
    )
    .await
    .with_context(|| {
        format!(
            "cannot connect to MPD at {}:{}",
            config.mpd.host, config.mpd.port
        )
    })?;

    let exchange = LyricsExchange::new();
    let remote = config
        .lyrics
        .remote
        .then(|| LrcLib::new(config.lyrics.url.clone()))
        .transpose()?;
    let worker = LyricsWorker::new(exchange.clone(), remote, &config.lyrics);
    tokio::spawn(worker.run());

    let result = app::run(client, keymap, &config, exchange).await;
    if let Err(e) = &result {
        tracing::error!("tonearm exited with error: {:#}", e);
    }
    result
}
