//! Error type for `xapi-lrs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("invalid LRS endpoint {endpoint:?}: {source}")]
  InvalidEndpoint {
    endpoint: String,
    #[source]
    source:   url::ParseError,
  },

  #[error("LRS answered {status}: {body}")]
  Status { status: u16, body: String },

  #[error("LRS request failed: {0}")]
  Network(#[from] reqwest::Error),
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;
