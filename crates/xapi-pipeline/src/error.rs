//! Error types for `xapi-pipeline`.

use std::time::Duration;

use thiserror::Error;

/// Boxed collaborator or transport error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown identity strategy: {0:?}")]
  UnknownStrategy(String),

  #[error("identity strategy {0:?} configured twice")]
  DuplicateStrategy(String),

  #[error("unknown state: {0:?}")]
  UnknownState(String),

  #[error("state {0:?} defined twice")]
  DuplicateState(String),

  #[error("state {state:?} does not apply to {content_type:?} content")]
  UnsupportedContent {
    state:        String,
    content_type: String,
  },

  #[error("unknown content: {0:?}")]
  UnknownContent(String),

  #[error("unknown user: {0}")]
  UnknownUser(uuid::Uuid),

  #[error("invalid statement payload: {0}")]
  InvalidPayload(String),

  #[error("cannot retarget transport: {0}")]
  Retarget(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error(transparent)]
  Dispatch(#[from] DispatchError),

  #[error(transparent)]
  Core(#[from] xapi_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a single statement was not delivered.
#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("rejected by {hook}: {reason}")]
  Rejected { hook: String, reason: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("transport error: {0}")]
  Transport(#[source] BoxError),

  #[error("LRS did not answer within {0:?}")]
  Timeout(Duration),
}

/// Failure raised by a dispatch hook.
#[derive(Debug, Error)]
pub enum HookError {
  /// The statement must not be sent.
  #[error("{0}")]
  Veto(String),

  #[error("hook failed: {0}")]
  Failed(#[source] BoxError),
}
