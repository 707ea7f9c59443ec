//! [`OpenAiGenerator`]: a [`canvass_core::generate::TextGenerator`] backed by
//! any OpenAI-compatible chat-completions endpoint.

pub mod error;
mod openai;

pub use error::{Error, Result};
pub use openai::{LlmConfig, OpenAiGenerator};
