//! Error types for `canvass-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("survey not found: {0}")]
  SurveyNotFound(Uuid),

  #[error("progress not found for survey {0}")]
  ProgressNotFound(Uuid),

  #[error("a survey needs at least one theme")]
  EmptyThemeSequence,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether this error means the referenced survey data is absent.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SurveyNotFound(_) | Self::ProgressNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
