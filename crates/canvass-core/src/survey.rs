//! Survey: one record per respondent session.
//!
//! A survey holds identity and context captured at start. It is never updated;
//! everything that changes while the respondent answers lives in
//! [`SurveyProgress`](crate::progress::SurveyProgress).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted survey session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
  pub survey_id:     Uuid,
  pub created_at:    DateTime<Utc>,
  pub full_name:     String,
  pub email:         String,
  /// Canonical company identifier, already resolved from free text.
  pub company_token: String,
  pub role:          String,
  pub business_area: String,
  /// The respondent's goals, in the order they were supplied.
  pub goals:         Vec<String>,
}

/// Input to [`crate::store::SurveyStore::create_survey`].
/// `survey_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSurvey {
  pub full_name:     String,
  pub email:         String,
  pub company_token: String,
  pub role:          String,
  pub business_area: String,
  pub goals:         Vec<String>,
}
