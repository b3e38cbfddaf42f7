use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "PARTCHAIN_LOG";

/// Install the global tracing subscriber.
///
/// Logs go to `<data_dir>/partchain/logs/partchain.log` so stdout stays free
/// for timeline output, or to stderr when `to_stderr` is set. The returned
/// guard must be held until exit to flush buffered lines.
pub fn init(to_stderr: bool) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("partchain=info"));

  if to_stderr {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .try_init()
      .map_err(|e| eyre!("Failed to install logger: {}", e))?;
    return Ok(None);
  }

  let log_dir = log_dir()?;
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let file_appender = tracing_appender::rolling::never(&log_dir, "partchain.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(non_blocking)
    .with_ansi(false)
    .with_target(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(Some(guard))
}

fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("partchain").join("logs"))
}
