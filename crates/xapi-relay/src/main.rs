//! xapi-relay server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), seeds the
//! in-memory store from the configured fixture file, and relays statements
//! to the configured LRS over HTTP.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use xapi_lrs::LrsClient;
use xapi_memory::{Fixtures, MemoryStore};
use xapi_pipeline::{Dispatcher, Pipeline};
use xapi_relay::{AppState, RelayConfig};

#[derive(Parser)]
#[command(author, version, about = "xAPI statement relay")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  // Load configuration. Nested keys are overridden with `XAPI_LRS__ENDPOINT`.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("XAPI")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let relay_cfg: RelayConfig = settings
    .try_deserialize()
    .context("failed to deserialise RelayConfig")?;

  let store = match &relay_cfg.fixtures {
    Some(path) => {
      let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixtures at {path:?}"))?;
      let fixtures = Fixtures::from_json(&json).context("invalid fixtures")?;
      tracing::info!(
        users = fixtures.users.len(),
        content = fixtures.content.len(),
        "seeding store from {path:?}"
      );
      MemoryStore::from_fixtures(fixtures).context("invalid fixtures")?
    }
    None => MemoryStore::default(),
  };
  let store = Arc::new(store);

  let lrs = LrsClient::new(relay_cfg.lrs.clone()).context("failed to build LRS client")?;
  let dispatcher = Dispatcher::new(lrs)
    .timeout(Duration::from_secs(relay_cfg.dispatch_timeout_secs));

  let pipeline = Pipeline::new(
    &relay_cfg.pipeline(),
    store.clone(),
    store.clone(),
    store.clone(),
    dispatcher,
  )
  .context("invalid pipeline configuration")?;

  let state = AppState::new(pipeline, &relay_cfg.replay_endpoints);

  let app = xapi_relay::router(state);
  let address = format!("{}:{}", relay_cfg.host, relay_cfg.port);

  tracing::info!(lrs = %relay_cfg.lrs.endpoint, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
