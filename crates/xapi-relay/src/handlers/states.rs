//! `POST /states/{id}/fire`

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use xapi_core::Statement;
use xapi_pipeline::Transport;

use crate::{AppState, RelayStore, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct FireBody {
  #[serde(default)]
  pub content_id: Option<String>,
  /// Omitted for statements on behalf of the site itself.
  #[serde(default)]
  pub user:       Option<Uuid>,
  #[serde(default)]
  pub at:         Option<DateTime<Utc>>,
}

/// Send the add-verb statement of a state directly.
pub async fn fire<S, T>(
  State(state): State<AppState<S, T>>,
  Path(id): Path<String>,
  Json(body): Json<FireBody>,
) -> Result<Json<Statement>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  let dispatched = state
    .pipeline
    .fire(&id, body.content_id.as_deref(), body.user, body.at)
    .await?;
  Ok(Json(dispatched.into_statement()))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;
  use xapi_core::VerbKey;

  use crate::test_support::{Relay, StubLrs};

  #[tokio::test]
  async fn fires_the_add_verb_for_a_user() {
    let relay = Relay::new(StubLrs::default());
    let learner = relay.learner();

    let (status, body) = relay
      .post("/states/completed/fire", json!({ "content_id": "42", "user": learner }))
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verb"]["id"], VerbKey::Completed.uri());
    assert_eq!(body["actor"]["mbox"], "mailto:ada@example.com");
    assert!(body["id"].is_string());
  }

  #[tokio::test]
  async fn content_type_filter_is_enforced() {
    let relay = Relay::new(StubLrs::default());
    let (status, body) = relay
      .post("/states/attended/fire", json!({ "content_id": "42" }))
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("attended"));
  }

  #[tokio::test]
  async fn unknown_state_is_not_found() {
    let relay = Relay::new(StubLrs::default());
    let (status, _) = relay.post("/states/mastered/fire", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
