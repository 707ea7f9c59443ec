//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Invalid or missing API key")]
  Unauthorized,
  #[error("api_key_hash is not a valid argon2 PHC string: {0}")]
  InvalidKeyHash(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::InvalidKeyHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
