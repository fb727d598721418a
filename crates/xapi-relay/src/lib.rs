//! HTTP relay between learning clients, the xAPI pipeline and an LRS.
//!
//! Exposes an axum [`Router`] backed by any host store implementing the
//! collaborator traits and any [`Transport`].

pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use xapi_core::store::{ContentCatalog, FlagStore, UserDirectory};
use xapi_lrs::LrsConfig;
use xapi_pipeline::{
  IdentityConfig, Pipeline, PipelineConfig, Site, StateDefinition, Transport,
};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_dispatch_timeout_secs() -> u64 { 10 }

/// Runtime relay configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  /// JSON file of users, content and flaggings to seed the store with.
  #[serde(default)]
  pub fixtures:              Option<PathBuf>,
  #[serde(default = "default_dispatch_timeout_secs")]
  pub dispatch_timeout_secs: u64,
  pub site:                  Site,
  pub lrs:                   LrsConfig,
  #[serde(default)]
  pub identity:              IdentityConfig,
  #[serde(default)]
  pub states:                Vec<StateDefinition>,
  /// LRS endpoints `/xapi/replay?endpoint=` may send to. Empty refuses
  /// every override.
  #[serde(default)]
  pub replay_endpoints:      Vec<String>,
}

impl RelayConfig {
  pub fn pipeline(&self) -> PipelineConfig {
    PipelineConfig {
      site:     self.site.clone(),
      identity: self.identity.clone(),
      states:   self.states.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// The pipeline as wired by the relay: one store backs every collaborator.
pub type RelayPipeline<S, T> = Pipeline<S, S, S, T>;

/// Shared state threaded through all axum handlers.
pub struct AppState<S, T> {
  pub pipeline:         Arc<RelayPipeline<S, T>>,
  pub replay_endpoints: Arc<[String]>,
}

impl<S, T> AppState<S, T> {
  pub fn new(pipeline: RelayPipeline<S, T>, replay_endpoints: &[String]) -> Self {
    Self {
      pipeline:         Arc::new(pipeline),
      replay_endpoints: replay_endpoints
        .iter()
        .map(|e| e.trim_end_matches('/').to_string())
        .collect(),
    }
  }

  /// Whether replays may be sent to `endpoint`.
  pub fn replay_allowed(&self, endpoint: &str) -> bool {
    let endpoint = endpoint.trim_end_matches('/');
    self.replay_endpoints.iter().any(|e| e == endpoint)
  }
}

impl<S, T> Clone for AppState<S, T> {
  fn clone(&self) -> Self {
    Self {
      pipeline:         self.pipeline.clone(),
      replay_endpoints: self.replay_endpoints.clone(),
    }
  }
}

/// Bounds a host store must meet to back the relay.
pub trait RelayStore:
  UserDirectory + ContentCatalog + FlagStore + Send + Sync + 'static
{
}

impl<S> RelayStore for S where
  S: UserDirectory + ContentCatalog + FlagStore + Send + Sync + 'static
{
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the relay.
pub fn router<S, T>(state: AppState<S, T>) -> Router
where
  S: RelayStore,
  T: Transport + 'static,
{
  Router::new()
    .route(
      "/xapi/statements",
      post(handlers::statements::receive::<S, T>)
        .put(handlers::statements::put::<S, T>)
        .get(handlers::lrs::statements::<S, T>),
    )
    .route("/xapi/agents",      get(handlers::lrs::agents::<S, T>))
    .route("/xapi/about",       get(handlers::lrs::about::<S, T>))
    .route("/xapi/replay",      post(handlers::replay::replay::<S, T>))
    .route("/flags",            post(handlers::flags::changed::<S, T>))
    .route("/states/{id}/fire", post(handlers::states::fire::<S, T>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod test_support;
