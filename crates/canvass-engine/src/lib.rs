//! The canvass survey engine.
//!
//! [`SurveyService`] runs the adaptive survey (start, advance, progress) and
//! builds company reports. It talks to storage and to the language model only
//! through the [`canvass_core::store::SurveyStore`] and
//! [`canvass_core::generate::TextGenerator`] traits, and treats every
//! generator reply as untrusted input.

pub mod error;
pub mod prompt;
pub mod reply;
mod report;
mod service;
mod survey;

pub use error::{Error, Result};
pub use report::{fallback_overall_summary, fallback_theme_summary};
pub use service::{
  Advance, COMPLETION_TEXT, DONE_QUESTION_ID, ERROR_QUESTION_ID, FIRST_QUESTION_TEXT,
  FirstQuestion, GENERATION_ERROR_TEXT, ProgressSnapshot, ReportConfig, StartSurvey,
  SubmitAnswer, SurveyService,
};

#[cfg(test)]
mod tests;
