//! Responses: one immutable record per answered question.
//!
//! Responses are append-only: once written they are never updated or deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-form answer. Clients send strings, numbers, booleans or lists; the
/// engine stores the value as-is and only ever renders it as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
  Flag(bool),
  Number(serde_json::Number),
  Text(String),
  Choices(Vec<String>),
  /// Anything else (mixed lists, objects, null).
  Other(serde_json::Value),
}

impl fmt::Display for Answer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Flag(b) => write!(f, "{b}"),
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
      Self::Choices(items) => f.write_str(&items.join(", ")),
      Self::Other(serde_json::Value::Null) => Ok(()),
      Self::Other(v) => write!(f, "{v}"),
    }
  }
}

/// A persisted answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub response_id:   Uuid,
  pub survey_id:     Uuid,
  pub question_id:   String,
  pub question_text: String,
  pub answer:        Answer,
  /// The theme that was active when the question was answered.
  pub theme:         Option<String>,
  /// Server-assigned; never changes after creation.
  pub recorded_at:   DateTime<Utc>,
}

impl Response {
  /// The text fed to the sentiment classifier: the answer followed by the
  /// question it responds to.
  pub fn sentiment_text(&self) -> String {
    format!("{} | Q: {}", self.answer, self.question_text)
      .trim()
      .to_owned()
  }
}

/// Input to [`crate::store::SurveyStore::commit_answer`].
#[derive(Debug, Clone)]
pub struct NewResponse {
  pub survey_id:     Uuid,
  pub question_id:   String,
  pub question_text: String,
  pub answer:        Answer,
  pub theme:         Option<String>,
}
