//! Handler for `GET /company/{company_token}/report`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
};
use canvass_core::{generate::TextGenerator, report::CompanyReport, store::SurveyStore};
use canvass_engine::SurveyService;

use crate::error::ApiError;

pub const NO_RESPONDENTS: &str = "No respondents for this company yet.";

/// `GET /company/{company_token}/report`
///
/// The token is matched exactly; an unknown token is a 404.
pub async fn company<S, G>(
  State(service): State<Arc<SurveyService<S, G>>>,
  company_token: Result<Path<String>, PathRejection>,
) -> Result<Json<CompanyReport>, ApiError>
where
  S: SurveyStore,
  G: TextGenerator,
{
  let Path(company_token) = company_token?;
  let report = service.report(&company_token).await?;
  if report.respondents == 0 {
    return Err(ApiError::NotFound(NO_RESPONDENTS.to_owned()));
  }
  Ok(Json(report))
}
