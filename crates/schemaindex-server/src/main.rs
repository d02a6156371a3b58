//! schemaindex server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `SCHEMAINDEX_*` environment variables, opens the SQLite store, and serves
//! the registry API over HTTP.
//!
//! # Accounts
//!
//! ```text
//! cargo run -p schemaindex-server --bin server -- --add-user alice
//! cargo run -p schemaindex-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use schemaindex_api::ApiState;
use schemaindex_core::manage;
use schemaindex_server::{ServerConfig, auth, fetch::ReqwestFetcher};
use schemaindex_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Schema registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create a user with a password entered on stdin and exit.
  #[arg(long, value_name = "USERNAME")]
  add_user: Option<String>,
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

  if cli.hash_password {
    let password = read_password()?;
    println!("{}", auth::hash_password(&password)?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SCHEMAINDEX"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(username) = cli.add_user {
    let password = read_password()?;
    let hash = auth::hash_password(&password)?;
    let user = manage::register_user(&store, &username, &hash)
      .await
      .with_context(|| format!("failed to create user {username:?}"))?;
    println!("{}", user.user_id);
    return Ok(());
  }

  let fetcher = ReqwestFetcher::new(server_cfg.fetch_timeout(), &server_cfg.user_agent)
    .context("failed to build HTTP client")?;

  let state = ApiState::new(
    Arc::new(store),
    Arc::new(fetcher),
    server_cfg.site_url.as_str(),
  );
  let app = schemaindex_server::app(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(site_url = %server_cfg.site_url, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
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
