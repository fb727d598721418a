//! Error types for `xapi-template`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid launch URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
