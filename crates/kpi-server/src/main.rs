//! kpi-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `KPI_*` environment variables, opens the CSV data directory, and serves the
//! dashboard API over HTTP.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use kpi_server::ServerConfig;
use kpi_store_csv::CsvStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "KPI / KRI / KCI dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("KPI"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let data_dir = expand_tilde(&server_cfg.data_dir);
  let store = CsvStore::open(&data_dir, &server_cfg.file_stem)
    .await
    .with_context(|| format!("failed to open data directory {data_dir:?}"))?;
  tracing::info!(
    data_dir = %data_dir.display(),
    yearly = server_cfg.partition_by_year,
    duplicates = ?server_cfg.duplicates,
    autosave = server_cfg.autosave,
    "store ready"
  );

  let app = kpi_server::app(store, &server_cfg);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
