//! `rsp-watch`: follow deployable state notifications.
//!
//! Reads newline-delimited JSON notifications from a file or stdin and prints
//! every detected transition as a JSON line. Logs go to stderr.
//!
//!   rsp-watch --input events.jsonl --server srv1 --summary

mod config;
mod watch;

use clap::Parser;
use config::WatchConfig;
use std::path::PathBuf;
use tokio::io::{AsyncRead, BufReader};
use tracing_subscriber::EnvFilter;
use watch::WatchOptions;

#[derive(Debug, Parser)]
#[command(name = "rsp-watch", version, about = "Follow deployable state notifications")]
struct Args {
    /// TOML configuration file.
    #[arg(long, env = "RSP_WATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Notification file (newline-delimited JSON). Reads stdin when omitted.
    #[arg(long, env = "RSP_WATCH_INPUT")]
    input: Option<PathBuf>,

    /// Only print events for this server id.
    #[arg(long, env = "RSP_WATCH_SERVER")]
    server: Option<String>,

    /// Print tracked deployables per server when input ends.
    #[arg(long, env = "RSP_WATCH_SUMMARY")]
    summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => WatchConfig::load(path)?,
        None => WatchConfig::default(),
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log.filter)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let input: Box<dyn AsyncRead + Unpin + Send> = match &args.input {
        Some(path) => {
            tracing::info!("Reading notifications from {}", path.display());
            Box::new(tokio::fs::File::open(path).await?)
        }
        None => Box::new(tokio::io::stdin()),
    };

    let options = WatchOptions {
        server: args.server,
        summary: args.summary,
    };
    watch::watch(BufReader::new(input), std::io::stdout(), &config, &options).await?;
    Ok(())
}
