//! Survey progress: the mutable half of a survey and its state machine.
//!
//! Progress is a versioned aggregate: every write is a read-modify-write
//! guarded by [`SurveyProgress::version`], so two concurrent answers to the
//! same survey cannot both be applied.
//!
//! Themes are visited once each. A theme is left when the generator asks to
//! switch or when it reaches [`MAX_QUESTIONS_PER_THEME`]; the survey is
//! complete once every theme in the sequence has been completed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  question::question_id,
  theme::MAX_QUESTIONS_PER_THEME,
};

/// Appended to a generated question whose text repeats an earlier one.
pub const DUPLICATE_SUFFIX: &str = " - please be specific.";

/// Progress of one survey. 1:1 with [`Survey`](crate::survey::Survey).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyProgress {
  pub survey_id:             Uuid,
  /// Always `q{total_question_count}`.
  pub current_question_id:   String,
  pub current_theme:         String,
  /// Fixed at creation.
  pub theme_sequence:        Vec<String>,
  /// Grows monotonically; set semantics, kept in completion order.
  pub completed_themes:      Vec<String>,
  /// Texts of every question asked so far, oldest first.
  pub question_history:      Vec<String>,
  pub theme_question_counts: BTreeMap<String, u32>,
  pub total_question_count:  u32,
  /// Flips false→true once and never back.
  pub completed:             bool,
  /// Optimistic-concurrency counter, bumped by the store on every write.
  pub version:               u64,
}

/// What the generator decided after an answer.
#[derive(Debug, Clone, Copy)]
pub struct Decision<'a> {
  pub switch_theme: bool,
  pub next_theme:   Option<&'a str>,
  pub text:         &'a str,
}

/// The outcome of applying a [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub question_id: String,
  /// The question text after duplicate adjustment.
  pub text:        String,
  /// Whether the previous theme was completed by this step.
  pub switched:    bool,
  /// Whether the survey is now complete.
  pub completed:   bool,
}

impl SurveyProgress {
  /// Progress for a freshly started survey whose first question (`q1`) has
  /// already been asked in the first theme.
  pub fn start(
    survey_id: Uuid,
    theme_sequence: Vec<String>,
    first_question: &str,
  ) -> Result<Self> {
    let first_theme = theme_sequence
      .first()
      .cloned()
      .ok_or(Error::EmptyThemeSequence)?;

    Ok(Self {
      survey_id,
      current_question_id: question_id(1),
      theme_question_counts: BTreeMap::from([(first_theme.clone(), 1)]),
      current_theme: first_theme,
      theme_sequence,
      completed_themes: Vec::new(),
      question_history: vec![first_question.to_owned()],
      total_question_count: 1,
      completed: false,
      version: 0,
    })
  }

  /// True when `completed_themes` equals `theme_sequence` as sets.
  pub fn all_themes_completed(&self) -> bool {
    self
      .theme_sequence
      .iter()
      .all(|t| self.completed_themes.contains(t))
      && self
        .completed_themes
        .iter()
        .all(|t| self.theme_sequence.contains(t))
  }

  /// Whether no further questions should be asked.
  pub fn is_finished(&self) -> bool {
    self.completed || self.all_themes_completed()
  }

  /// Themes neither completed nor current, in sequence order.
  pub fn themes_left(&self) -> Vec<&str> {
    self
      .theme_sequence
      .iter()
      .filter(|t| !self.completed_themes.contains(t) && **t != self.current_theme)
      .map(String::as_str)
      .collect()
  }

  /// The id the next question will receive. Never reused, never skipped.
  pub fn next_question_id(&self) -> String {
    question_id(self.total_question_count + 1)
  }

  /// The last `n` question texts, oldest first.
  pub fn recent_questions(&self, n: usize) -> &[String] {
    let start = self.question_history.len().saturating_sub(n);
    &self.question_history[start..]
  }

  /// Questions asked so far in the current theme.
  pub fn current_theme_count(&self) -> u32 {
    self
      .theme_question_counts
      .get(&self.current_theme)
      .copied()
      .unwrap_or(0)
  }

  /// Count an answer against the current theme. Returns `true` when the theme
  /// has hit its cap and must be left regardless of the generator.
  pub fn record_answer(&mut self) -> bool {
    let count = self
      .theme_question_counts
      .entry(self.current_theme.clone())
      .or_insert(0);
    *count += 1;
    *count >= MAX_QUESTIONS_PER_THEME
  }

  /// Apply the generator's decision after [`record_answer`](Self::record_answer).
  ///
  /// Appends the (deduplicated) question to the history, advances the question
  /// id, completes the current theme when switching or `forced`, and marks the
  /// survey completed once every theme is done.
  pub fn apply(&mut self, forced: bool, decision: Decision<'_>) -> Step {
    let question_id = self.next_question_id();
    let text = self.dedupe(decision.text.trim());

    self.question_history.push(text.clone());
    self.total_question_count += 1;
    self.current_question_id = question_id.clone();

    let switched = decision.switch_theme || forced;
    if switched {
      self.complete_current_theme(decision.next_theme);
    }

    if self.all_themes_completed() {
      self.completed = true;
    }

    Step { question_id, text, switched, completed: self.completed }
  }

  /// Mark the survey permanently completed. Idempotent.
  pub fn mark_completed(&mut self) { self.completed = true; }

  fn dedupe(&self, text: &str) -> String {
    let lowered = text.to_lowercase();
    let repeated = self
      .question_history
      .iter()
      .any(|prev| prev.to_lowercase() == lowered);
    if repeated {
      format!("{text}{DUPLICATE_SUFFIX}")
    } else {
      text.to_owned()
    }
  }

  /// Add the current theme to `completed_themes` and pick the next one.
  ///
  /// A requested theme is honoured only if it belongs to the sequence and is
  /// still open; otherwise the first open theme in sequence order is taken.
  /// With nothing left the current theme stays put and the survey completes.
  fn complete_current_theme(&mut self, requested: Option<&str>) {
    let finished = self.current_theme.clone();
    if !self.completed_themes.contains(&finished) {
      self.completed_themes.push(finished.clone());
    }

    let is_open = |t: &str| {
      t != finished.as_str() && !self.completed_themes.iter().any(|c| c.as_str() == t)
    };

    let requested = requested.map(str::trim).filter(|&t| {
      self.theme_sequence.iter().any(|s| s.as_str() == t) && is_open(t)
    });

    let next = requested.map(str::to_owned).or_else(|| {
      self
        .theme_sequence
        .iter()
        .find(|t| is_open(t.as_str()))
        .cloned()
    });

    if let Some(next) = next {
      self.current_theme = next;
    }
  }
}
