//! Chat-completions client.

use std::time::Duration;

use canvass_core::generate::{GenerationRequest, Purpose, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

// ─── Config ──────────────────────────────────────────────────────────────────

/// Endpoint, credentials and the model used for each [`Purpose`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  /// Base URL up to and including the API version, e.g.
  /// `https://api.openai.com/v1`.
  pub base_url:        String,
  /// Bearer token. Empty means no `Authorization` header is sent.
  pub api_key:         String,
  pub question_model:  String,
  pub sentiment_model: String,
  pub summary_model:   String,
  pub timeout_secs:    u64,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      base_url:        "https://api.openai.com/v1".to_owned(),
      api_key:         String::new(),
      question_model:  "gpt-4".to_owned(),
      sentiment_model: "gpt-4o-mini".to_owned(),
      summary_model:   "gpt-4o".to_owned(),
      timeout_secs:    60,
    }
  }
}

impl LlmConfig {
  pub fn model_for(&self, purpose: Purpose) -> &str {
    match purpose {
      Purpose::Question => &self.question_model,
      Purpose::Sentiment => &self.sentiment_model,
      Purpose::Summary => &self.summary_model,
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  temperature: f32,
  messages:    Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
  content: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiGenerator {
  client: Client,
  config: LlmConfig,
}

impl OpenAiGenerator {
  pub fn new(config: LlmConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  async fn complete(&self, request: GenerationRequest) -> Result<String> {
    let model = self.config.model_for(request.purpose);

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.system.is_empty() {
      messages.push(ChatMessage { role: "system", content: &request.system });
    }
    messages.extend(
      request
        .messages
        .iter()
        .map(|m| ChatMessage { role: "user", content: m }),
    );
    let body = ChatRequest { model, temperature: request.temperature, messages };

    let mut req = self.client.post(self.url()).json(&body);
    if !self.config.api_key.is_empty() {
      req = req.bearer_auth(&self.config.api_key);
    }

    debug!(purpose = %request.purpose, model, "requesting completion");
    let resp = req.send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
      return Err(Error::Status { status: status.as_u16(), body: text });
    }

    let parsed: ChatResponse = serde_json::from_str(&text)?;
    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message)
      .and_then(|m| m.content)
      .map(|c| c.trim().to_owned())
      .filter(|c| !c.is_empty())
      .ok_or(Error::EmptyCompletion)
  }
}

impl TextGenerator for OpenAiGenerator {
  type Error = Error;

  async fn generate(&self, request: GenerationRequest) -> Result<String> {
    self.complete(request).await
  }
}
