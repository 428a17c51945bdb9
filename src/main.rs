//! vodka
//!
//! A Telegram bot that fetches cookie-gated videos through yt-dlp and
//! sends them back to the requesting chat. Users upload their cookies
//! file once with /setcookies, then request videos with /download.
//!
//! Also serves a plain HTTP health endpoint for the hosting platform.

mod download;
mod error;
mod health;
mod orchestrator;
mod pool;
mod store;
mod telegram;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::download::YtDlp;
use crate::orchestrator::Orchestrator;
use crate::pool::WorkerPool;
use crate::store::CookieStore;
use crate::telegram::BotConfig;

/// vodka - Telegram relay for yt-dlp downloads that need cookies
#[derive(Parser, Debug)]
#[command(name = "vodka")]
#[command(about = "Telegram bot that downloads cookie-gated videos via yt-dlp")]
#[command(version)]
struct Args {
    /// Directory for uploaded cookie files
    #[arg(long, default_value = "cookies")]
    cookies_dir: PathBuf,

    /// Directory the downloader writes into
    #[arg(long, default_value = "downloads")]
    downloads_dir: PathBuf,

    /// Downloader binary to invoke
    #[arg(long, default_value = "yt-dlp")]
    ytdlp_bin: PathBuf,

    /// Port for the HTTP health endpoint
    #[arg(long, default_value = "8000")]
    health_port: u16,

    /// Maximum downloads running at once
    #[arg(long, default_value = "4")]
    max_concurrent_downloads: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let token = std::env::var("TELEGRAM_BOT_TOKEN")
        .context("TELEGRAM_BOT_TOKEN is not set")?;

    // Data directories must exist before the first upload or download.
    // Canonicalized so stored paths and the output template stay valid
    // no matter where the process was started from.
    std::fs::create_dir_all(&args.cookies_dir)
        .with_context(|| format!("cannot create {}", args.cookies_dir.display()))?;
    std::fs::create_dir_all(&args.downloads_dir)
        .with_context(|| format!("cannot create {}", args.downloads_dir.display()))?;
    let cookies_dir = args
        .cookies_dir
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", args.cookies_dir.display()))?;
    let downloads_dir = args
        .downloads_dir
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", args.downloads_dir.display()))?;

    let ytdlp = YtDlp::new(&args.ytdlp_bin);
    let ytdlp_version = ytdlp.probe();

    // Print startup banner
    println!();
    println!("========================================================");
    println!("  vodka v{}", env!("CARGO_PKG_VERSION"));
    println!("========================================================");
    println!("  Health:        http://0.0.0.0:{}/", args.health_port);
    println!("  Cookies dir:   {}", cookies_dir.display());
    println!("  Downloads dir: {}", downloads_dir.display());
    match &ytdlp_version {
        Some(version) => println!("  yt-dlp:        {} [OK]", version),
        None => println!("  yt-dlp:        NOT FOUND (downloads will fail)"),
    }
    println!("  Max parallel:  {}", args.max_concurrent_downloads);
    println!("========================================================");
    println!();

    tokio::spawn(health::serve(args.health_port));

    let store = Arc::new(CookieStore::new(cookies_dir));
    let pool = WorkerPool::new(args.max_concurrent_downloads);
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        ytdlp,
        pool,
        downloads_dir,
    ));

    telegram::run(BotConfig { token }, store, orchestrator).await;

    Ok(())
}
