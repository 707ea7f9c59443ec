//! canvass server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) overlaid by
//! `CANVASS__*` environment variables, opens the SQLite store, and serves the
//! survey API over HTTP.
//!
//! # API key hash generation
//!
//! To generate the argon2 PHC string for `api_key_hash` in config.toml:
//!
//! ```
//! cargo run -p canvass-server --bin server -- --hash-api-key
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use canvass_engine::SurveyService;
use canvass_llm::OpenAiGenerator;
use canvass_server::{ServerConfig, auth::AuthConfig};
use canvass_store_sqlite::SqliteStore;
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "canvass adaptive survey server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an API key entered on stdin and exit.
  #[arg(long)]
  hash_api_key: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a key and exit.
  if cli.hash_api_key {
    let key = read_secret()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(key.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CANVASS").separator("__"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.llm.api_key.is_empty()
    && let Ok(key) = std::env::var("OPENAI_API_KEY")
  {
    server_cfg.llm.api_key = key;
  }
  if server_cfg.llm.api_key.is_empty() {
    tracing::warn!("no LLM API key configured; question generation will fail");
  }

  let auth = AuthConfig::new(server_cfg.api_key_hash.clone())
    .context("invalid api_key_hash")?;
  if !auth.is_enabled() {
    tracing::warn!("api_key_hash is not set; the API is open to every caller");
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let generator = OpenAiGenerator::new(server_cfg.llm.clone())
    .context("failed to build LLM client")?;

  let service = SurveyService::new(Arc::new(store), Arc::new(generator))
    .with_report_config(server_cfg.report.clone());

  let app = canvass_server::router(Arc::new(service), Arc::new(auth));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a secret from stdin.
fn read_secret() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("API key: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  let key = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!key.is_empty(), "API key must not be empty");
  Ok(key)
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
