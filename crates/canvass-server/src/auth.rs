//! Shared-secret API key middleware.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};

use crate::error::Error;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The key accepted by this server instance. `None` disables the check.
#[derive(Clone, Default)]
pub struct AuthConfig {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  api_key_hash: Option<String>,
}

impl AuthConfig {
  /// Fails if `api_key_hash` is set but is not a PHC string.
  pub fn new(api_key_hash: Option<String>) -> Result<Self, Error> {
    let api_key_hash = api_key_hash.filter(|h| !h.trim().is_empty());
    if let Some(hash) = &api_key_hash {
      PasswordHash::new(hash).map_err(|e| Error::InvalidKeyHash(e.to_string()))?;
    }
    Ok(Self { api_key_hash })
  }

  pub fn is_enabled(&self) -> bool { self.api_key_hash.is_some() }
}

/// Verify the `x-api-key` header against the configured hash.
pub fn verify_api_key(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let Some(hash) = &config.api_key_hash else {
    return Ok(());
  };

  let key = headers
    .get(API_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(key.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// `axum::middleware::from_fn_with_state` adapter for [`verify_api_key`].
pub async fn require_api_key(
  State(config): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Response {
  match verify_api_key(req.headers(), &config) {
    Ok(()) => next.run(req).await,
    Err(e) => e.into_response(),
  }
}
