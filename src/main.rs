//! Storefront API server.
//!
//! ```text
//!   config ──▶ connect ──▶ seed ──▶ index sync ──▶ mount ──▶ listen
//!   (fatal)    (fatal)    (best     (best effort,             (fatal)
//!                          effort)   text fallback)
//! ```
//!
//! Configuration comes from an optional TOML file (`--config` or
//! `STOREFRONT_CONFIG`) overlaid with environment variables such as
//! `MONGO_URI` and `PORT`. Any fatal startup error exits with code 1.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use storefront::config::{load_config, loader::parse_log_format, LogFormat};
use storefront::lifecycle;
use storefront::observability::logging;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront catalog, checkout and search API", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    // A broken config still gets logged in the requested format.
    let format = match &config {
        Ok(config) => config.observability.log_format,
        Err(_) => std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| parse_log_format(&v))
            .unwrap_or(LogFormat::Pretty),
    };
    logging::init(format);

    lifecycle::run(config).await
}
