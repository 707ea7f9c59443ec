//! [`SurveyService`] and the values that flow in and out of it.

use std::{collections::BTreeMap, sync::Arc};

use canvass_core::{
  question::{Question, QuestionKind},
  response::Answer,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Text of the question every survey opens with.
pub const FIRST_QUESTION_TEXT: &str = "Do you know these goals?";

/// Question id returned once a survey is complete.
pub const DONE_QUESTION_ID: &str = "done";
pub const COMPLETION_TEXT: &str = "Thank you, you have completed the survey.";

/// Question id returned when the next question could not be generated.
pub const ERROR_QUESTION_ID: &str = "error";
pub const GENERATION_ERROR_TEXT: &str = "There was an error generating the next question.";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Limits applied while building a company report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
  /// Responses per theme sent to the sentiment classifier.
  pub max_responses_per_theme: usize,
  /// Answers per theme included in the summary prompt.
  pub summary_answer_limit:    usize,
  /// Below this many respondents every block carries a caution note.
  pub small_sample_threshold:  usize,
  /// Sentiment classifications in flight at once.
  pub classify_concurrency:    usize,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      max_responses_per_theme: 60,
      summary_answer_limit:    200,
      small_sample_threshold:  5,
      classify_concurrency:    8,
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The survey progression and report aggregation engine.
///
/// Generic over the store and the generator; the HTTP layer holds it behind
/// an [`Arc`]. Every operation is independent, so one service instance serves
/// all requests.
pub struct SurveyService<S, G> {
  pub(crate) store:     Arc<S>,
  pub(crate) generator: Arc<G>,
  pub(crate) report:    ReportConfig,
}

impl<S, G> SurveyService<S, G> {
  pub fn new(store: Arc<S>, generator: Arc<G>) -> Self {
    Self { store, generator, report: ReportConfig::default() }
  }

  pub fn with_report_config(mut self, report: ReportConfig) -> Self {
    self.report = report;
    self
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Everything needed to begin a survey.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSurvey {
  pub full_name:     String,
  pub email:         String,
  /// Free text; resolved to a canonical company token.
  pub company_name:  String,
  pub role:          String,
  pub business_area: String,
  pub goals:         Vec<String>,
}

impl StartSurvey {
  /// Reject blank fields and goal lists with no usable entry. Goals are
  /// returned trimmed with blanks removed.
  pub(crate) fn validate(&self) -> Result<Vec<String>> {
    let fields = [
      ("full_name", &self.full_name),
      ("email", &self.email),
      ("company_name", &self.company_name),
      ("role", &self.role),
      ("business_area", &self.business_area),
    ];
    if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
      return Err(Error::Validation(format!("{name} must not be blank")));
    }

    let goals: Vec<String> = self
      .goals
      .iter()
      .map(|g| g.trim().to_owned())
      .filter(|g| !g.is_empty())
      .collect();
    if goals.is_empty() {
      return Err(Error::Validation("goals must contain at least one goal".into()));
    }
    Ok(goals)
  }
}

/// An answer to the question the respondent was shown.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswer {
  pub survey_id:     Uuid,
  pub question_id:   String,
  pub question_text: String,
  pub answer:        Answer,
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// The opening question of a freshly started survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstQuestion {
  pub survey_id: Uuid,
  #[serde(flatten)]
  pub question:  Question,
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
  /// The answer was recorded; ask this next.
  Next(Question),
  /// The survey is finished.
  Completed,
  /// The generator failed; nothing was recorded and the respondent may
  /// resubmit.
  GenerationFailed,
}

impl Advance {
  /// The question to show, with the `done`/`error` sentinels for the
  /// terminal outcomes.
  pub fn into_question(self) -> Question {
    match self {
      Self::Next(q) => q,
      Self::Completed => sentinel(DONE_QUESTION_ID, COMPLETION_TEXT),
      Self::GenerationFailed => sentinel(ERROR_QUESTION_ID, GENERATION_ERROR_TEXT),
    }
  }
}

fn sentinel(id: &str, text: &str) -> Question {
  Question {
    question_id: id.to_owned(),
    text:        text.to_owned(),
    kind:        QuestionKind::Text,
    options:     Vec::new(),
  }
}

/// Read-only view of a survey's progress plus the context a client needs to
/// render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
  pub survey_id:             Uuid,
  pub completed:             bool,
  pub current_theme:         String,
  pub completed_themes:      Vec<String>,
  pub themes_left:           Vec<String>,
  pub theme_sequence:        Vec<String>,
  pub total_question_count:  u32,
  /// `None` once the survey is complete.
  pub next_question_id:      Option<String>,
  pub last_question_text:    Option<String>,
  pub question_history_tail: Vec<String>,
  pub theme_question_counts: BTreeMap<String, u32>,
  pub role:                  Option<String>,
  pub business_area:         Option<String>,
  pub goals:                 Vec<String>,
}
