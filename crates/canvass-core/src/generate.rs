//! The `TextGenerator` trait: the language model seen as an untrusted
//! oracle.
//!
//! A generator takes a prompt and returns free text. Callers ask for JSON in
//! the prompt but must validate everything: nothing about the reply is
//! guaranteed.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// What a generation is for. Backends may pick a different model per purpose.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Purpose {
  /// The next survey question.
  Question,
  /// A one-word sentiment label.
  Sentiment,
  /// Theme and company summaries.
  Summary,
}

/// One prompt to the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
  pub purpose:     Purpose,
  /// Role/behaviour instruction.
  pub system:      String,
  /// User messages, sent in order.
  pub messages:    Vec<String>,
  pub temperature: f32,
}

impl GenerationRequest {
  pub fn new(purpose: Purpose, system: impl Into<String>, temperature: f32) -> Self {
    Self { purpose, system: system.into(), messages: Vec::new(), temperature }
  }

  /// Append a user message.
  pub fn message(mut self, content: impl Into<String>) -> Self {
    self.messages.push(content.into());
    self
  }
}

/// Abstraction over a text-generation backend.
pub trait TextGenerator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run `request` and return the raw reply text.
  fn generate(
    &self,
    request: GenerationRequest,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}
