//! Error type for `xapi-memory`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("fixture error: {0}")]
  Fixtures(#[from] serde_json::Error),

  #[error("two content items share the activity id {0:?}")]
  DuplicateActivityId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
