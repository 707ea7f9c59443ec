//! HTTP server assembly for canvass.
//!
//! Wraps the [`canvass_api`] router with API-key auth and request tracing,
//! and defines the configuration the `server` binary reads.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use canvass_core::{generate::TextGenerator, store::SurveyStore};
use canvass_engine::{ReportConfig, SurveyService};
use canvass_llm::LlmConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_api_key};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CANVASS__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Argon2 PHC string for the `x-api-key` header; unset disables auth.
  pub api_key_hash: Option<String>,
  pub llm:          LlmConfig,
  pub report:       ReportConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_owned(),
      port:         8080,
      store_path:   PathBuf::from("~/.local/share/canvass/canvass.db"),
      api_key_hash: None,
      llm:          LlmConfig::default(),
      report:       ReportConfig::default(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: API routes behind the key check, with
/// every request traced.
pub fn router<S, G>(service: Arc<SurveyService<S, G>>, auth: Arc<AuthConfig>) -> Router
where
  S: SurveyStore + 'static,
  G: TextGenerator + 'static,
{
  canvass_api::api_router(service)
    .layer(middleware::from_fn_with_state(auth, require_api_key))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
