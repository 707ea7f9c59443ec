//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (goals,
//! theme lists, question history, per-theme counts, answers) are stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use std::collections::BTreeMap;

use canvass_core::{
  progress::SurveyProgress,
  response::{Answer, Response},
  survey::Survey,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

/// Lists are read leniently: a column that is not a JSON array of strings
/// decodes as empty rather than failing the whole row.
pub fn decode_list(s: &str) -> Vec<String> {
  serde_json::from_str(s).unwrap_or_default()
}

pub fn encode_counts(counts: &BTreeMap<String, u32>) -> Result<String> {
  Ok(serde_json::to_string(counts)?)
}

pub fn decode_counts(s: &str) -> BTreeMap<String, u32> {
  serde_json::from_str(s).unwrap_or_default()
}

pub fn encode_answer(answer: &Answer) -> Result<String> {
  Ok(serde_json::to_string(answer)?)
}

pub fn decode_answer(s: &str) -> Result<Answer> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `surveys` row.
pub struct RawSurvey {
  pub survey_id:     String,
  pub created_at:    String,
  pub full_name:     String,
  pub email:         String,
  pub company_token: String,
  pub role:          String,
  pub business_area: String,
  pub goals:         String,
}

impl RawSurvey {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      survey_id:     row.get(0)?,
      created_at:    row.get(1)?,
      full_name:     row.get(2)?,
      email:         row.get(3)?,
      company_token: row.get(4)?,
      role:          row.get(5)?,
      business_area: row.get(6)?,
      goals:         row.get(7)?,
    })
  }

  pub fn into_survey(self) -> Result<Survey> {
    Ok(Survey {
      survey_id:     decode_uuid(&self.survey_id)?,
      created_at:    decode_dt(&self.created_at)?,
      full_name:     self.full_name,
      email:         self.email,
      company_token: self.company_token,
      role:          self.role,
      business_area: self.business_area,
      goals:         decode_list(&self.goals),
    })
  }
}

/// Column list matching [`RawSurvey::from_row`].
pub const SURVEY_COLUMNS: &str =
  "survey_id, created_at, full_name, email, company_token, role, business_area, goals";

/// Raw values read directly from a `survey_progress` row.
pub struct RawProgress {
  pub survey_id:             String,
  pub current_question_id:   String,
  pub current_theme:         String,
  pub theme_sequence:        String,
  pub completed_themes:      String,
  pub question_history:      String,
  pub theme_question_counts: String,
  pub total_question_count:  i64,
  pub completed:             bool,
  pub version:               i64,
}

impl RawProgress {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      survey_id:             row.get(0)?,
      current_question_id:   row.get(1)?,
      current_theme:         row.get(2)?,
      theme_sequence:        row.get(3)?,
      completed_themes:      row.get(4)?,
      question_history:      row.get(5)?,
      theme_question_counts: row.get(6)?,
      total_question_count:  row.get(7)?,
      completed:             row.get(8)?,
      version:               row.get(9)?,
    })
  }

  pub fn into_progress(self) -> Result<SurveyProgress> {
    Ok(SurveyProgress {
      survey_id:             decode_uuid(&self.survey_id)?,
      current_question_id:   self.current_question_id,
      current_theme:         self.current_theme,
      theme_sequence:        decode_list(&self.theme_sequence),
      completed_themes:      decode_list(&self.completed_themes),
      question_history:      decode_list(&self.question_history),
      theme_question_counts: decode_counts(&self.theme_question_counts),
      total_question_count:  u32::try_from(self.total_question_count).unwrap_or(0),
      completed:             self.completed,
      version:               u64::try_from(self.version).unwrap_or(0),
    })
  }
}

/// Column list matching [`RawProgress::from_row`].
pub const PROGRESS_COLUMNS: &str = "survey_id, current_question_id, current_theme, \
   theme_sequence, completed_themes, question_history, theme_question_counts, \
   total_question_count, completed, version";

/// Progress fields encoded for an INSERT or UPDATE.
pub struct EncodedProgress {
  pub survey_id:             String,
  pub current_question_id:   String,
  pub current_theme:         String,
  pub theme_sequence:        String,
  pub completed_themes:      String,
  pub question_history:      String,
  pub theme_question_counts: String,
  pub total_question_count:  i64,
  pub completed:             bool,
  pub version:               i64,
  pub updated_at:            String,
}

impl EncodedProgress {
  pub fn new(p: &SurveyProgress) -> Result<Self> {
    Ok(Self {
      survey_id:             encode_uuid(p.survey_id),
      current_question_id:   p.current_question_id.clone(),
      current_theme:         p.current_theme.clone(),
      theme_sequence:        encode_list(&p.theme_sequence)?,
      completed_themes:      encode_list(&p.completed_themes)?,
      question_history:      encode_list(&p.question_history)?,
      theme_question_counts: encode_counts(&p.theme_question_counts)?,
      total_question_count:  i64::from(p.total_question_count),
      completed:             p.completed,
      version:               i64::try_from(p.version).unwrap_or(i64::MAX),
      updated_at:            encode_dt(Utc::now()),
    })
  }
}

/// Raw strings read directly from a `responses` row.
pub struct RawResponse {
  pub response_id:   String,
  pub survey_id:     String,
  pub question_id:   String,
  pub question_text: String,
  pub answer_json:   String,
  pub theme:         Option<String>,
  pub recorded_at:   String,
}

impl RawResponse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      response_id:   row.get(0)?,
      survey_id:     row.get(1)?,
      question_id:   row.get(2)?,
      question_text: row.get(3)?,
      answer_json:   row.get(4)?,
      theme:         row.get(5)?,
      recorded_at:   row.get(6)?,
    })
  }

  pub fn into_response(self) -> Result<Response> {
    Ok(Response {
      response_id:   decode_uuid(&self.response_id)?,
      survey_id:     decode_uuid(&self.survey_id)?,
      question_id:   self.question_id,
      question_text: self.question_text,
      answer:        decode_answer(&self.answer_json)?,
      theme:         self.theme.filter(|t| !t.trim().is_empty()),
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}

/// Column list matching [`RawResponse::from_row`].
pub const RESPONSE_COLUMNS: &str =
  "response_id, survey_id, question_id, question_text, answer_json, theme, recorded_at";
