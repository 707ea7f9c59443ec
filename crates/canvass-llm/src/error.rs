//! Error type for `canvass-llm`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("completion endpoint returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed completion response: {0}")]
  Json(#[from] serde_json::Error),

  #[error("completion response has no content")]
  EmptyCompletion,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
