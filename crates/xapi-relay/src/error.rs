//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use xapi_pipeline::DispatchError;

/// An error returned by a relay handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The LRS refused the statements or could not be reached.
  #[error("LRS error: {0}")]
  Upstream(String),

  #[error("LRS timeout: {0}")]
  Timeout(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<DispatchError> for ApiError {
  fn from(e: DispatchError) -> Self {
    match e {
      DispatchError::Rejected { .. } => ApiError::BadRequest(e.to_string()),
      DispatchError::Timeout(_) => ApiError::Timeout(e.to_string()),
      DispatchError::Transport(_) => ApiError::Upstream(e.to_string()),
      DispatchError::Serialization(e) => ApiError::Store(Box::new(e)),
    }
  }
}

impl From<xapi_pipeline::Error> for ApiError {
  fn from(e: xapi_pipeline::Error) -> Self {
    use xapi_pipeline::Error;
    match e {
      Error::UnknownState(_) | Error::UnknownContent(_) | Error::UnknownUser(_) => {
        ApiError::NotFound(e.to_string())
      }
      Error::UnsupportedContent { .. }
      | Error::InvalidPayload(_)
      | Error::Retarget(_)
      | Error::Core(_) => ApiError::BadRequest(e.to_string()),
      Error::Dispatch(e) => e.into(),
      Error::UnknownStrategy(_)
      | Error::DuplicateStrategy(_)
      | Error::DuplicateState(_)
      | Error::Store(_) => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Timeout(m) => (StatusCode::GATEWAY_TIMEOUT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
