//! `POST /flags`

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xapi_pipeline::{FlagChange, FlagEvent, Transport};

use crate::{AppState, RelayStore, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct FlagBody {
  pub flag:       String,
  pub content_id: String,
  pub user:       Uuid,
  pub operation:  FlagChange,
  /// When the flag changed; defaults to now.
  #[serde(default)]
  pub at:         Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize)]
pub struct FlagResponse {
  /// Ids of the statements the LRS stored.
  pub statement_ids: Vec<Uuid>,
  /// Statements that could not be delivered.
  pub errors:        Vec<String>,
}

/// Apply a local flag change and send the statements it implies. Repeating
/// a change that is already in effect sends nothing.
pub async fn changed<S, T>(
  State(state): State<AppState<S, T>>,
  Json(body): Json<FlagBody>,
) -> Result<Json<FlagResponse>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  let event = FlagEvent {
    flag:      body.flag,
    content:   state.pipeline.content(&body.content_id).await?,
    user:      state.pipeline.user(body.user).await?,
    operation: body.operation,
    at:        body.at.unwrap_or_else(Utc::now),
  };

  let mut response = FlagResponse::default();
  for result in state.pipeline.apply_flag(&event).await? {
    match result {
      Ok(dispatched) => {
        response
          .statement_ids
          .extend(dispatched.outcome().statement_ids.iter().copied());
      }
      Err(e) => {
        tracing::warn!(flag = %event.flag, content = %event.content.id, "statement not delivered: {e}");
        response.errors.push(e.to_string());
      }
    }
  }
  Ok(Json(response))
}
