//! The fixed theme catalogue every survey walks through.

/// The five canonical themes, in the order a survey visits them.
pub const THEMES: [&str; 5] = [
  "Clarity of Goals",
  "Measurement of Progress",
  "Visibility of Reports",
  "Frontline Impact",
  "Priority Ranking",
];

/// Once a theme has this many questions, the survey moves on regardless of
/// what the generator decided.
pub const MAX_QUESTIONS_PER_THEME: u32 = 5;

/// Bucket for responses recorded without a theme.
pub const UNKNOWN_THEME: &str = "Unknown";

/// The theme sequence assigned to a new survey.
pub fn default_sequence() -> Vec<String> {
  THEMES.iter().map(|t| (*t).to_owned()).collect()
}
