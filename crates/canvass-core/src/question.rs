//! Questions as presented to the respondent.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How the client should render a question.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum QuestionKind {
  Text,
  Select,
  MultiSelect,
}

impl QuestionKind {
  /// Interpret a generator-supplied type name. Unknown names fall back to
  /// `select` when there are options to pick from, `text` otherwise.
  pub fn parse_lenient(raw: Option<&str>, has_options: bool) -> Self {
    match raw.map(str::trim).and_then(|s| s.parse().ok()) {
      Some(kind) => kind,
      None if has_options => Self::Select,
      None => Self::Text,
    }
  }
}

/// A question ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id: String,
  pub text:        String,
  #[serde(rename = "type")]
  pub kind:        QuestionKind,
  #[serde(default)]
  pub options:     Vec<String>,
}

/// The id of the `n`th question of a survey: `q1`, `q2`, …
pub fn question_id(n: u32) -> String { format!("q{n}") }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_serializes_kebab_case() {
    let json = serde_json::to_string(&QuestionKind::MultiSelect).unwrap();
    assert_eq!(json, "\"multi-select\"");
    assert_eq!(QuestionKind::MultiSelect.as_ref(), "multi-select");
  }

  #[test]
  fn lenient_parse_accepts_known_names_in_any_case() {
    assert_eq!(QuestionKind::parse_lenient(Some("Select"), false), QuestionKind::Select);
    assert_eq!(QuestionKind::parse_lenient(Some(" text "), true), QuestionKind::Text);
  }

  #[test]
  fn lenient_parse_falls_back_on_options() {
    assert_eq!(QuestionKind::parse_lenient(Some("rating"), true), QuestionKind::Select);
    assert_eq!(QuestionKind::parse_lenient(Some("rating"), false), QuestionKind::Text);
    assert_eq!(QuestionKind::parse_lenient(None, false), QuestionKind::Text);
  }
}
