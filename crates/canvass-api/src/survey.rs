//! Handlers for the respondent-facing endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/start-survey` | Body: [`StartSurvey`]; returns the opening question |
//! | `POST` | `/answer` | Body: [`SubmitAnswer`]; returns the next question or a `done`/`error` sentinel |
//! | `GET`  | `/progress/{survey_id}` | [`ProgressSnapshot`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
};
use canvass_core::{generate::TextGenerator, question::Question, store::SurveyStore};
use canvass_engine::{FirstQuestion, ProgressSnapshot, StartSurvey, SubmitAnswer, SurveyService};
use uuid::Uuid;

use crate::error::ApiError;

/// `POST /start-survey`
pub async fn start<S, G>(
  State(service): State<Arc<SurveyService<S, G>>>,
  body: Result<Json<StartSurvey>, JsonRejection>,
) -> Result<Json<FirstQuestion>, ApiError>
where
  S: SurveyStore,
  G: TextGenerator,
{
  let Json(input) = body?;
  Ok(Json(service.start(input).await?))
}

/// `POST /answer`
///
/// Generation failures are not HTTP errors: the respondent gets the `error`
/// sentinel question and may resubmit.
pub async fn answer<S, G>(
  State(service): State<Arc<SurveyService<S, G>>>,
  body: Result<Json<SubmitAnswer>, JsonRejection>,
) -> Result<Json<Question>, ApiError>
where
  S: SurveyStore,
  G: TextGenerator,
{
  let Json(input) = body?;
  let advance = service.advance(input).await?;
  Ok(Json(advance.into_question()))
}

/// `GET /progress/{survey_id}`
pub async fn progress<S, G>(
  State(service): State<Arc<SurveyService<S, G>>>,
  survey_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ProgressSnapshot>, ApiError>
where
  S: SurveyStore,
  G: TextGenerator,
{
  let Path(survey_id) = survey_id?;
  Ok(Json(service.progress(survey_id).await?))
}
