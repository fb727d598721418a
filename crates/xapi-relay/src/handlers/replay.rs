//! `POST /xapi/replay[?activity_id=..&actor=..&definition=..&endpoint=..]`

use axum::{
  Json,
  extract::{RawQuery, State},
};
use xapi_core::Statement;
use xapi_pipeline::Transport;
use xapi_template::TemplateParams;

use crate::{AppState, RelayStore, error::ApiError};

/// Rewrite a packaged template statement with the launch parameters and
/// dispatch it. Answers with the statement as sent. An `endpoint` override
/// must be one of the configured replay endpoints.
pub async fn replay<S, T>(
  State(state): State<AppState<S, T>>,
  RawQuery(query): RawQuery,
  Json(template): Json<Statement>,
) -> Result<Json<Statement>, ApiError>
where
  S: RelayStore,
  T: Transport + 'static,
{
  let params = TemplateParams::from_query(query.as_deref().unwrap_or_default());
  if let Some(endpoint) = params
    .endpoint
    .as_deref()
    .filter(|e| !state.replay_allowed(e))
  {
    return Err(ApiError::BadRequest(format!(
      "{endpoint} is not an allowed replay endpoint"
    )));
  }
  let dispatched = state.pipeline.replay(&template, &params).await?;
  Ok(Json(dispatched.into_statement()))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;

  use crate::test_support::{Relay, StubLrs};

  #[tokio::test]
  async fn template_is_rehosted_before_dispatch() {
    let lrs = StubLrs::default();
    let relay = Relay::new(lrs.clone());
    let template = json!({
      "actor": { "mbox": "mailto:ada@example.com" },
      "verb": { "id": "http://adlnet.gov/expapi/verbs/experienced" },
      "object": {
        "id": "https://old.example/node/42",
        "definition": { "moreInfo": "https://old.example/node/42/info" }
      }
    });

    let (status, body) = relay
      .post(
        "/xapi/replay?activity_id=https%3A%2F%2Fnew.example%2Fnode%2F42",
        template,
      )
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"]["id"], "https://new.example/node/42");
    assert_eq!(
      body["object"]["definition"]["moreInfo"],
      "https://new.example/node/42/info"
    );
    assert_eq!(lrs.endpoints(), vec![None]);
  }

  #[tokio::test]
  async fn endpoint_parameter_retargets_the_lrs() {
    let lrs = StubLrs::default();
    let relay = Relay::new(lrs.clone());
    let template = json!({
      "actor": { "mbox": "mailto:ada@example.com" },
      "verb": { "id": "http://adlnet.gov/expapi/verbs/experienced" },
      "object": { "id": "https://lms.example/node/42" }
    });

    let (status, _) = relay
      .post("/xapi/replay?endpoint=https://lrs.partner.example/xapi", template)
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      lrs.endpoints(),
      vec![Some("https://lrs.partner.example/xapi".to_string())]
    );
  }

  #[tokio::test]
  async fn unlisted_endpoint_is_refused() {
    let lrs = StubLrs::default();
    let relay = Relay::new(lrs.clone());
    let template = json!({
      "actor": { "mbox": "mailto:ada@example.com" },
      "verb": { "id": "http://adlnet.gov/expapi/verbs/experienced" },
      "object": { "id": "https://lms.example/node/42" }
    });

    let (status, body) = relay
      .post(
        "/xapi/replay?endpoint=https%3A%2F%2Fcollector.example%2Fxapi",
        template,
      )
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("collector.example"));
    assert!(lrs.sent().is_empty());
  }
}
