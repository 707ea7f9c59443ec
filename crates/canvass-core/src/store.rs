//! The `SurveyStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `canvass-store-sqlite`).
//! Higher layers (`canvass-engine`, `canvass-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  progress::SurveyProgress,
  response::{NewResponse, Response},
  survey::{NewSurvey, Survey},
};

/// Result of a version-guarded progress write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit<T> {
  /// The write went through and the stored version was bumped.
  Applied(T),
  /// The stored progress no longer has the version the caller read; nothing
  /// was written.
  Stale,
}

/// Abstraction over a canvass store backend.
///
/// Surveys are written once. Responses are append-only. Progress is a
/// versioned record: every update names the version it was derived from and
/// is rejected as [`Commit::Stale`] if someone else wrote in between.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Persist a new survey; the store assigns its id and creation time.
  fn create_survey(
    &self,
    input: NewSurvey,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  /// Retrieve a survey by id. Returns `None` if not found.
  fn get_survey(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  /// Every distinct company token in use, in order of first appearance.
  fn company_tokens(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// All surveys recorded under `company_token`, oldest first.
  fn surveys_for_company<'a>(
    &'a self,
    company_token: &'a str,
  ) -> impl Future<Output = Result<Vec<Survey>, Self::Error>> + Send + 'a;

  // ── Progress ──────────────────────────────────────────────────────────

  /// Store the initial progress record for a survey.
  fn init_progress<'a>(
    &'a self,
    progress: &'a SurveyProgress,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve a survey's progress. Returns `None` if not found.
  fn get_progress(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<Option<SurveyProgress>, Self::Error>> + Send + '_;

  /// Overwrite progress if the stored version still equals
  /// `progress.version`.
  fn save_progress<'a>(
    &'a self,
    progress: &'a SurveyProgress,
  ) -> impl Future<Output = Result<Commit<()>, Self::Error>> + Send + 'a;

  // ── Responses ─────────────────────────────────────────────────────────

  /// Append `response` and overwrite progress in one transaction, guarded
  /// like [`save_progress`](Self::save_progress). On `Stale` neither is
  /// written.
  fn commit_answer<'a>(
    &'a self,
    response: NewResponse,
    progress: &'a SurveyProgress,
  ) -> impl Future<Output = Result<Commit<Response>, Self::Error>> + Send + 'a;

  /// All responses to surveys with exactly this company token, in the order
  /// they were recorded.
  fn responses_for_company<'a>(
    &'a self,
    company_token: &'a str,
  ) -> impl Future<Output = Result<Vec<Response>, Self::Error>> + Send + 'a;
}
