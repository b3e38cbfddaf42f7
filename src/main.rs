mod cache;
mod catalog;
mod chain;
mod config;
mod logging;
mod timeline;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use catalog::{CatalogClient, LookupScope};
use chain::{ChainCache, ChainResolver, ChainSnapshot, ResolveRequest, SessionController};

#[derive(Parser, Debug)]
#[command(name = "partchain")]
#[command(about = "Resolve the supersession chain of a catalog part")]
#[command(version)]
struct Args {
  /// Part number to resolve
  part_number: Option<String>,

  /// Brand the part number belongs to
  #[arg(short, long)]
  brand: Option<String>,

  /// Lookup audience: public or partner
  #[arg(short, long)]
  scope: Option<LookupScope>,

  /// Path to config file (default: $XDG_CONFIG_HOME/partchain/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Read part numbers from stdin, one per line; each line supersedes the previous one
  #[arg(short, long)]
  interactive: bool,

  /// Log to stderr instead of the log file
  #[arg(long)]
  log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(args.log_stderr)?;

  let config = config::Config::load(args.config.as_deref())?;
  let scope = args.scope.unwrap_or(config.catalog.default_scope);

  let client = CatalogClient::new(&config)?;
  let resolver = ChainResolver::new(Arc::new(client)).with_max_steps(config.resolver.max_steps);
  let cache = ChainCache::new(config.cache_ttl()).with_fallback_brand(config.cache.fallback_brand.clone());

  let (tx, rx) = mpsc::unbounded_channel();
  let controller = SessionController::new(resolver, cache, tx);
  let printer = tokio::spawn(print_snapshots(rx));

  let request = |part_number: &str| {
    let request = ResolveRequest::new(part_number.trim()).with_scope(scope);
    match &args.brand {
      Some(brand) => request.with_brand(brand.clone()),
      None => request,
    }
  };

  if args.interactive {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await? {
      if line.trim().is_empty() {
        continue;
      }
      last = Some(controller.spawn_resolve(request(&line)));
    }
    if let Some(handle) = last {
      handle.await?;
    }
  } else {
    let part_number = args
      .part_number
      .as_deref()
      .filter(|p| !p.trim().is_empty())
      .ok_or_else(|| eyre!("A part number is required unless --interactive is given"))?;
    let last = controller.resolve(request(part_number)).await;
    info!(resolved = last.is_some(), "done");
  }

  // Closing the sink lets the printer drain and exit
  drop(controller);
  printer.await?;

  Ok(())
}

/// Timeline consumer: print every published snapshot.
async fn print_snapshots(mut rx: mpsc::UnboundedReceiver<ChainSnapshot>) {
  while let Some(snapshot) = rx.recv().await {
    println!("{}", timeline::render(&snapshot));
  }
}
