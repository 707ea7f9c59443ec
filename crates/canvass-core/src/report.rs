//! Company report: the computed, anonymized read model over a company's
//! surveys. Never stored, always derived.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};
use strum::{AsRefStr, Display, EnumString};

// ─── Sentiment ───────────────────────────────────────────────────────────────

/// The label assigned to one response.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sentiment {
  Positive,
  #[default]
  Neutral,
  Negative,
}

/// Raw label counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SentimentCounts {
  pub positive: u32,
  pub neutral:  u32,
  pub negative: u32,
}

impl SentimentCounts {
  pub fn add(&mut self, label: Sentiment) {
    match label {
      Sentiment::Positive => self.positive += 1,
      Sentiment::Neutral => self.neutral += 1,
      Sentiment::Negative => self.negative += 1,
    }
  }

  pub fn merge(&mut self, other: &Self) {
    self.positive += other.positive;
    self.neutral += other.neutral;
    self.negative += other.negative;
  }

  pub fn total(&self) -> u32 { self.positive + self.neutral + self.negative }

  /// Per-label percentages, each rounded independently (half to even), so
  /// they need not sum to exactly 100.
  pub fn percentages(&self) -> SentimentPercentages {
    let total = f64::from(self.total().max(1));
    let pct = |n: u32| (f64::from(n) / total * 100.0).round_ties_even() as u32;
    SentimentPercentages {
      positive: pct(self.positive),
      neutral:  pct(self.neutral),
      negative: pct(self.negative),
    }
  }
}

/// Percentages per label; serialized as `"75%"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SentimentPercentages {
  #[serde(serialize_with = "as_percent")]
  pub positive: u32,
  #[serde(serialize_with = "as_percent")]
  pub neutral:  u32,
  #[serde(serialize_with = "as_percent")]
  pub negative: u32,
}

impl SentimentPercentages {
  /// positive% − negative%, in `-100..=100`.
  pub fn positivity_score(&self) -> i32 {
    self.positive as i32 - self.negative as i32
  }
}

fn as_percent<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&format!("{value}%"))
}

// ─── Theme blocks ────────────────────────────────────────────────────────────

/// Issues and recommendations summarised for one theme.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ThemeSummary {
  pub trending_issues: Vec<String>,
  pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeReport {
  /// All responses recorded for the theme (not only the classified sample).
  pub responses:              usize,
  pub sentiment_counts:       SentimentCounts,
  pub sentiment:              SentimentPercentages,
  pub trending_issues:        Vec<String>,
  pub recommendations:        Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sentiment_percent_note: Option<String>,
}

/// Theme blocks in order of first appearance; serialized as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeReports(pub Vec<(String, ThemeReport)>);

impl ThemeReports {
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn get(&self, theme: &str) -> Option<&ThemeReport> {
    self.0.iter().find(|(t, _)| t == theme).map(|(_, r)| r)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ThemeReport)> {
    self.0.iter().map(|(t, r)| (t.as_str(), r))
  }
}

impl Serialize for ThemeReports {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.0.len()))?;
    for (theme, report) in &self.0 {
      map.serialize_entry(theme, report)?;
    }
    map.end()
  }
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeRank {
  pub theme:            String,
  pub positivity_score: i32,
  pub summary:          String,
  /// 1-based.
  pub rank:             usize,
}

/// A coarse verdict for a positivity score.
pub fn standing(score: i32) -> &'static str {
  match score {
    s if s >= 60 => "Strongest theme; highly positive sentiment.",
    s if s >= 30 => "Generally positive with a few concerns.",
    s if s >= 10 => "Mixed but leaning positive.",
    s if s > -10 => "Mixed/neutral sentiment.",
    _ => "Weak area; address concerns urgently.",
  }
}

/// Rank themes by positivity score, highest first. The sort is stable, so
/// equal scores keep their report order.
pub fn rank_themes(themes: &ThemeReports) -> Vec<ThemeRank> {
  let mut ranking: Vec<ThemeRank> = themes
    .iter()
    .map(|(theme, report)| {
      let score = report.sentiment.positivity_score();
      ThemeRank {
        theme:            theme.to_owned(),
        positivity_score: score,
        summary:          standing(score).to_owned(),
        rank:             0,
      }
    })
    .collect();

  ranking.sort_by(|a, b| b.positivity_score.cmp(&a.positivity_score));
  for (idx, entry) in ranking.iter_mut().enumerate() {
    entry.rank = idx + 1;
  }
  ranking
}

// ─── Company report ──────────────────────────────────────────────────────────

/// Issues and recommendations across all themes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OverallSummary {
  pub recurring_issues: Vec<String>,
  pub recommendations:  Vec<String>,
}

/// Disclaimer attached to every report.
pub const ANONYMIZED_NOTE: &str = "Anonymized; no names/emails/IDs included.";

/// Caution attached when fewer than the threshold of respondents answered.
pub fn small_sample_note(respondents: usize) -> String {
  format!("Based on {respondents} respondents; interpret with caution.")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyReport {
  pub company:                  String,
  pub respondents:              usize,
  pub roles:                    BTreeMap<String, u32>,
  pub business_areas:           BTreeMap<String, u32>,
  pub themes:                   ThemeReports,
  pub overall_sentiment_counts: SentimentCounts,
  pub overall_sentiment:        SentimentPercentages,
  pub overall_summary:          OverallSummary,
  pub theme_ranking:            Vec<ThemeRank>,
  pub notes:                    Vec<String>,
}

impl CompanyReport {
  /// The report for a token with no surveys.
  pub fn empty(company: impl Into<String>) -> Self {
    Self {
      company:                  company.into(),
      respondents:              0,
      roles:                    BTreeMap::new(),
      business_areas:           BTreeMap::new(),
      themes:                   ThemeReports::default(),
      overall_sentiment_counts: SentimentCounts::default(),
      overall_sentiment:        SentimentPercentages::default(),
      overall_summary:          OverallSummary::default(),
      theme_ranking:            Vec::new(),
      notes:                    vec![ANONYMIZED_NOTE.to_owned()],
    }
  }
}
