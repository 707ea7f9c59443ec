//! Parsing and validation of generator replies.
//!
//! Models wrap JSON in Markdown fences, prepend chatter, or drop fields. The
//! helpers here pull the first JSON object out of the reply and validate it,
//! so that callers only ever see well-formed values or an error.

use canvass_core::{question::QuestionKind, report::Sentiment};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplyError {
  #[error("reply contains no JSON object")]
  NoJson,

  #[error("reply JSON does not match the expected shape: {0}")]
  Shape(#[from] serde_json::Error),

  #[error("reply has no question text")]
  BlankText,
}

// ─── JSON extraction ─────────────────────────────────────────────────────────

/// Every balanced `{...}` in `text`, in order of the opening brace.
fn object_spans(text: &str) -> impl Iterator<Item = &str> {
  text
    .char_indices()
    .filter(|&(_, c)| c == '{')
    .filter_map(move |(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Length of the balanced object at the start of `text`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (idx, c) in text.char_indices() {
    if in_string {
      match c {
        _ if escaped => escaped = false,
        '\\' => escaped = true,
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match c {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(idx + 1);
        }
      }
      _ => {}
    }
  }
  None
}

/// Decode the first object in `raw` that deserializes as `T`.
///
/// Returns the error from the first candidate when none fit, so the log line
/// names what was wrong with the most likely payload.
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, ReplyError> {
  let mut first_err = None;
  for span in object_spans(raw) {
    match serde_json::from_str(span) {
      Ok(value) => return Ok(value),
      Err(e) => {
        first_err.get_or_insert(e);
      }
    }
  }
  Err(first_err.map_or(ReplyError::NoJson, ReplyError::Shape))
}

// ─── Question replies ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawQuestionReply {
  #[serde(default)]
  switch_theme: Option<bool>,
  #[serde(default)]
  next_theme:   Option<String>,
  #[serde(default)]
  text:         Option<String>,
  #[serde(default, rename = "type")]
  kind:         Option<String>,
  #[serde(default)]
  options:      Option<Vec<String>>,
}

/// A validated next-question decision. Any id the generator proposed has
/// already been discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReply {
  pub switch_theme: bool,
  pub next_theme:   Option<String>,
  pub text:         String,
  pub kind:         QuestionKind,
  pub options:      Vec<String>,
}

pub fn parse_question(raw: &str) -> Result<QuestionReply, ReplyError> {
  let reply: RawQuestionReply = parse_object(raw)?;

  let text = reply
    .text
    .map(|t| t.trim().to_owned())
    .filter(|t| !t.is_empty())
    .ok_or(ReplyError::BlankText)?;

  let options: Vec<String> = reply
    .options
    .unwrap_or_default()
    .into_iter()
    .map(|o| o.trim().to_owned())
    .filter(|o| !o.is_empty())
    .collect();

  Ok(QuestionReply {
    switch_theme: reply.switch_theme.unwrap_or(false),
    next_theme: reply
      .next_theme
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty()),
    kind: QuestionKind::parse_lenient(reply.kind.as_deref(), !options.is_empty()),
    text,
    options,
  })
}

// ─── Sentiment replies ───────────────────────────────────────────────────────

/// Read a one-word label, tolerating case, quotes and trailing punctuation.
pub fn parse_sentiment(raw: &str) -> Option<Sentiment> {
  raw
    .trim()
    .trim_matches(|c: char| !c.is_alphabetic())
    .parse()
    .ok()
}

// ─── Summary replies ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ThemeSummaryReply {
  #[serde(default)]
  pub trending_issues: Vec<String>,
  #[serde(default)]
  pub recommendations: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverallSummaryReply {
  #[serde(default)]
  pub recurring_issues: Vec<String>,
  #[serde(default)]
  pub recommendations:  Vec<String>,
}

/// Trim every item, drop blanks and keep at most `limit`.
pub fn clean_items(items: Vec<String>, limit: usize) -> Vec<String> {
  items
    .into_iter()
    .map(|i| i.trim().to_owned())
    .filter(|i| !i.is_empty())
    .take(limit)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_json() {
    let reply = parse_question(
      r#"{"switch_theme": false, "next_theme": null, "question_id": "q7",
          "text": "Which goal drives your work most?", "type": "select",
          "options": ["Ship faster", "Reduce bugs"]}"#,
    )
    .unwrap();
    assert!(!reply.switch_theme);
    assert_eq!(reply.next_theme, None);
    assert_eq!(reply.text, "Which goal drives your work most?");
    assert_eq!(reply.kind, QuestionKind::Select);
    assert_eq!(reply.options.len(), 2);
  }

  #[test]
  fn strips_fences_and_prose() {
    let raw = "Sure! Here is the next question:\n```json\n{\"switch_theme\": true, \
               \"text\": \"How often are metrics reviewed?\", \"type\": \"text\"}\n```\nGood luck.";
    let reply = parse_question(raw).unwrap();
    assert!(reply.switch_theme);
    assert_eq!(reply.kind, QuestionKind::Text);
    assert!(reply.options.is_empty());
  }

  #[test]
  fn skips_brace_noise_before_the_payload() {
    let raw = r#"Note {not json} then {"text": "What is measured instead?", "options": ["Outputs"]}"#;
    let reply = parse_question(raw).unwrap();
    assert_eq!(reply.text, "What is measured instead?");
    assert_eq!(reply.kind, QuestionKind::Select);
  }

  #[test]
  fn braces_inside_strings_do_not_end_the_object() {
    let raw = r#"{"text": "Rate {G1} from 1-5", "type": "text"}"#;
    assert_eq!(parse_question(raw).unwrap().text, "Rate {G1} from 1-5");
  }

  #[test]
  fn missing_switch_defaults_to_false() {
    let reply = parse_question(r#"{"text": "Why?"}"#).unwrap();
    assert!(!reply.switch_theme);
    assert_eq!(reply.kind, QuestionKind::Text);
  }

  #[test]
  fn blank_text_is_rejected() {
    assert!(matches!(
      parse_question(r#"{"switch_theme": true, "text": "  "}"#),
      Err(ReplyError::BlankText)
    ));
  }

  #[test]
  fn prose_only_is_rejected() {
    assert!(matches!(parse_question("I cannot help with that."), Err(ReplyError::NoJson)));
    assert!(matches!(parse_question(r#"{"text": "unterminated"#), Err(ReplyError::NoJson)));
  }

  #[test]
  fn wrongly_typed_fields_are_rejected() {
    assert!(matches!(
      parse_question(r#"{"switch_theme": "maybe", "text": "Why?"}"#),
      Err(ReplyError::Shape(_))
    ));
  }

  #[test]
  fn sentiment_labels_are_read_leniently() {
    assert_eq!(parse_sentiment("positive"), Some(Sentiment::Positive));
    assert_eq!(parse_sentiment(" Negative.\n"), Some(Sentiment::Negative));
    assert_eq!(parse_sentiment("\"neutral\""), Some(Sentiment::Neutral));
    assert_eq!(parse_sentiment("mostly positive"), None);
    assert_eq!(parse_sentiment(""), None);
  }

  #[test]
  fn summary_items_are_cleaned_and_capped() {
    let reply: ThemeSummaryReply = parse_object(
      r#"{"trending_issues": [" a ", "", "b", "c", "d", "e", "f"], "recommendations": []}"#,
    )
    .unwrap();
    assert_eq!(clean_items(reply.trending_issues, 5), vec!["a", "b", "c", "d", "e"]);
    assert!(reply.recommendations.is_empty());
  }
}
