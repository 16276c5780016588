use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use sheetfeed::cache::{CacheStorage, FreshnessGate, NoopStorage, SqliteStorage};
use sheetfeed::config::{CacheConfig, Config};
use sheetfeed::projection::picture;
use sheetfeed::sheets::FeedClient;
use sheetfeed::sync::WorkbookSync;

#[derive(Parser, Debug)]
#[command(name = "sheetfeed")]
#[command(about = "Sync published spreadsheet sheets through a local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/sheetfeed/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Logical sheet to print once synced
  #[arg(short, long, default_value = "pictures")]
  sheet: String,

  /// Skip the local cache and always fetch
  #[arg(long)]
  no_cache: bool,

  /// Write logs to a daily file in this directory instead of stderr
  #[arg(long)]
  log_dir: Option<PathBuf>,
}

fn open_storage(config: &CacheConfig, no_cache: bool) -> Result<Box<dyn CacheStorage>> {
  if no_cache || !config.enabled {
    return Ok(Box::new(NoopStorage));
  }

  let storage = match &config.path {
    Some(path) => SqliteStorage::open_at(path)?,
    None => SqliteStorage::open()?,
  };
  Ok(Box::new(storage))
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = sheetfeed::logging::init(args.log_dir.as_deref())?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let storage = open_storage(&config.cache, args.no_cache)?;
  let gate = FreshnessGate::new(Arc::new(storage), config.cache.ttl())?;
  let fetcher = FeedClient::new(&config.feed)?;
  let sync = WorkbookSync::new(config.workbook, Arc::new(gate), Arc::new(fetcher));

  info!(edit_url = %sync.workbook().edit_url(), "workbook");

  let report = sync.sync_all().await;
  for (name, source) in report.loaded() {
    info!(sheet = name, source = source.as_str(), "sheet ready");
  }
  for (name, error) in report.failed() {
    if error.is_storage() {
      warn!(sheet = name, %error, "sheet loaded but not cached");
    } else {
      warn!(sheet = name, %error, "sheet not loaded");
    }
  }

  let pictures = sync
    .project(&args.sheet, picture)
    .ok_or_else(|| eyre!("Sheet {} is not loaded", args.sheet))?;

  for entry in pictures {
    println!("{}", serde_json::to_string(&entry)?);
  }

  Ok(())
}
