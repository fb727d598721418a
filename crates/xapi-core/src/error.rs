//! Error types for `xapi-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("actor carries both an mbox and an account")]
  AmbiguousIfi,

  #[error("actor carries neither an mbox nor an account")]
  MissingIfi,

  #[error("actor account name is empty")]
  EmptyAccountName,

  #[error("actor mbox is empty")]
  EmptyMbox,

  #[error("unknown verb: {0:?}")]
  UnknownVerb(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
