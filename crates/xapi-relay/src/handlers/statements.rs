//! `POST /xapi/statements` and `PUT /xapi/statements?statementId=`

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use xapi_pipeline::Transport;

use crate::{AppState, RelayStore, error::ApiError};

/// Relay inbound statements to the LRS, updating local flags on the way.
/// Answers with the ids the LRS assigned.
pub async fn receive<S, T>(
  State(state): State<AppState<S, T>>,
  Json(payload): Json<Value>,
) -> Result<Json<Vec<Uuid>>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  let outcome = state.pipeline.receive(payload).await?;
  Ok(Json(outcome.statement_ids))
}

#[derive(Debug, Deserialize)]
pub struct PutParams {
  #[serde(rename = "statementId")]
  pub statement_id: Option<String>,
}

/// Relay one statement stored under the client's `statementId`. The id is
/// required, and a body id must match it.
pub async fn put<S, T>(
  State(state): State<AppState<S, T>>,
  Query(params): Query<PutParams>,
  Json(payload): Json<Value>,
) -> Result<StatusCode, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  let raw = params
    .statement_id
    .ok_or_else(|| ApiError::BadRequest("statementId is required".into()))?;
  let id = Uuid::parse_str(&raw)
    .map_err(|e| ApiError::BadRequest(format!("invalid statementId {raw:?}: {e}")))?;
  state.pipeline.receive_put(id, payload).await?;
  Ok(StatusCode::NO_CONTENT)
}
