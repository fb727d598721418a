//! `GET /xapi/statements`, `GET /xapi/agents` and `GET /xapi/about`, passed
//! through to the LRS unmodified.

use axum::{
  Json,
  extract::{RawQuery, State},
};
use serde_json::Value;
use xapi_pipeline::Transport;

use crate::{AppState, RelayStore, error::ApiError};

async fn pass_through<S, T>(
  state: &AppState<S, T>,
  resource: &str,
  query: Option<String>,
) -> Result<Json<Value>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  Ok(Json(state.pipeline.query(resource, query.as_deref()).await?))
}

pub async fn statements<S, T>(
  State(state): State<AppState<S, T>>,
  RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  pass_through(&state, "statements", query).await
}

pub async fn agents<S, T>(
  State(state): State<AppState<S, T>>,
  RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  pass_through(&state, "agents", query).await
}

pub async fn about<S, T>(
  State(state): State<AppState<S, T>>,
) -> Result<Json<Value>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  pass_through(&state, "about", None).await
}
