//! JSON HTTP API for canvass.
//!
//! Exposes an axum [`Router`] over a [`SurveyService`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = canvass_api::api_router(Arc::new(service)).layer(TraceLayer::new_for_http());
//! ```

pub mod error;
pub mod report;
pub mod survey;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use canvass_core::{generate::TextGenerator, store::SurveyStore};
use canvass_engine::SurveyService;

pub use error::ApiError;

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G>(service: Arc<SurveyService<S, G>>) -> Router<()>
where
  S: SurveyStore + 'static,
  G: TextGenerator + 'static,
{
  Router::new()
    // Respondents
    .route("/start-survey", post(survey::start::<S, G>))
    .route("/answer", post(survey::answer::<S, G>))
    .route("/progress/{survey_id}", get(survey::progress::<S, G>))
    // Reporting
    .route("/company/{company_token}/report", get(report::company::<S, G>))
    .with_state(service)
}
