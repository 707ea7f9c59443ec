//! Report aggregation: sentiment, summaries and ranking for one company.

use std::collections::BTreeMap;

use canvass_core::{
  generate::{GenerationRequest, TextGenerator},
  report::{
    ANONYMIZED_NOTE, CompanyReport, OverallSummary, Sentiment, SentimentCounts, ThemeReport,
    ThemeReports, ThemeSummary, rank_themes, small_sample_note,
  },
  response::Response,
  store::SurveyStore,
  theme::UNKNOWN_THEME,
};
use futures_util::{StreamExt as _, stream};
use tracing::{debug, info, warn};

use crate::{
  Error, Result, prompt,
  reply::{self, OverallSummaryReply, ThemeSummaryReply},
  service::SurveyService,
};

const THEME_SUMMARY_ITEMS: usize = 5;
const OVERALL_SUMMARY_ITEMS: usize = 3;
/// A summary list shorter than this is replaced by canned text.
const MIN_SUMMARY_ITEMS: usize = 2;

impl<S, G> SurveyService<S, G>
where
  S: SurveyStore,
  G: TextGenerator,
{
  /// Build the anonymized report for `company_token`.
  ///
  /// A token with no surveys yields [`CompanyReport::empty`]; callers decide
  /// whether that is an error.
  pub async fn report(&self, company_token: &str) -> Result<CompanyReport> {
    let surveys = self
      .store
      .surveys_for_company(company_token)
      .await
      .map_err(Error::store)?;
    if surveys.is_empty() {
      return Ok(CompanyReport::empty(company_token));
    }

    let respondents = surveys.len();
    let small_sample = respondents < self.report.small_sample_threshold;
    let roles = distribution(surveys.iter().map(|s| s.role.as_str()));
    let business_areas = distribution(surveys.iter().map(|s| s.business_area.as_str()));

    let responses = self
      .store
      .responses_for_company(company_token)
      .await
      .map_err(Error::store)?;

    let mut themes = Vec::new();
    let mut overall_counts = SentimentCounts::default();
    let mut all_issues = Vec::new();
    let mut all_recommendations = Vec::new();

    for (theme, texts) in group_by_theme(&responses) {
      let sample = &texts[..texts.len().min(self.report.max_responses_per_theme)];
      let counts = self.classify_all(sample).await;
      overall_counts.merge(&counts);

      let summary = self
        .summarize_theme(company_token, &theme, &roles, &business_areas, &texts)
        .await;
      all_issues.extend(summary.trending_issues.iter().cloned());
      all_recommendations.extend(summary.recommendations.iter().cloned());

      themes.push((theme, ThemeReport {
        responses:              texts.len(),
        sentiment_counts:       counts,
        sentiment:              counts.percentages(),
        trending_issues:        summary.trending_issues,
        recommendations:        summary.recommendations,
        sentiment_percent_note: small_sample.then(|| small_sample_note(respondents)),
      }));
    }

    let themes = ThemeReports(themes);
    let overall_summary = self
      .summarize_overall(company_token, &all_issues, &all_recommendations)
      .await;
    let theme_ranking = rank_themes(&themes);

    let mut notes = vec![ANONYMIZED_NOTE.to_owned()];
    if small_sample {
      notes.push(small_sample_note(respondents));
    }

    info!(company = %company_token, respondents, themes = themes.len(), "report built");

    Ok(CompanyReport {
      company: company_token.to_owned(),
      respondents,
      roles,
      business_areas,
      themes,
      overall_sentiment_counts: overall_counts,
      overall_sentiment: overall_counts.percentages(),
      overall_summary,
      theme_ranking,
      notes,
    })
  }

  // ── Sentiment ─────────────────────────────────────────────────────────────

  async fn classify_all(&self, texts: &[String]) -> SentimentCounts {
    let pending: Vec<_> = texts.iter().map(|t| self.classify(t)).collect();
    let labels: Vec<Sentiment> = stream::iter(pending)
      .buffered(self.report.classify_concurrency.max(1))
      .collect()
      .await;

    let mut counts = SentimentCounts::default();
    for label in labels {
      counts.add(label);
    }
    counts
  }

  /// Classify one text; any failure counts as neutral.
  async fn classify(&self, text: &str) -> Sentiment {
    match self.generator.generate(prompt::classify_sentiment(text)).await {
      Ok(raw) => reply::parse_sentiment(&raw).unwrap_or_else(|| {
        debug!(reply = %raw, "unrecognised sentiment label; counting as neutral");
        Sentiment::Neutral
      }),
      Err(e) => {
        warn!(error = %e, "sentiment classification failed; counting as neutral");
        Sentiment::Neutral
      }
    }
  }

  // ── Summaries ─────────────────────────────────────────────────────────────

  async fn summarize_theme(
    &self,
    company: &str,
    theme: &str,
    roles: &BTreeMap<String, u32>,
    business_areas: &BTreeMap<String, u32>,
    answers: &[String],
  ) -> ThemeSummary {
    let request = prompt::theme_summary(
      company,
      theme,
      roles,
      business_areas,
      answers,
      self.report.summary_answer_limit,
    );
    let parsed: ThemeSummaryReply = self.summary_reply(request, theme).await;

    let fallback = fallback_theme_summary(theme);
    ThemeSummary {
      trending_issues: or_fallback(
        reply::clean_items(parsed.trending_issues, THEME_SUMMARY_ITEMS),
        fallback.trending_issues,
      ),
      recommendations: or_fallback(
        reply::clean_items(parsed.recommendations, THEME_SUMMARY_ITEMS),
        fallback.recommendations,
      ),
    }
  }

  async fn summarize_overall(
    &self,
    company: &str,
    issues: &[String],
    recommendations: &[String],
  ) -> OverallSummary {
    let request = prompt::overall_summary(company, issues, recommendations);
    let parsed: OverallSummaryReply = self.summary_reply(request, "overall").await;

    let fallback = fallback_overall_summary();
    OverallSummary {
      recurring_issues: or_fallback(
        reply::clean_items(parsed.recurring_issues, OVERALL_SUMMARY_ITEMS),
        fallback.recurring_issues,
      ),
      recommendations:  or_fallback(
        reply::clean_items(parsed.recommendations, OVERALL_SUMMARY_ITEMS),
        fallback.recommendations,
      ),
    }
  }

  /// Run a summary request; failures decode as an empty reply.
  async fn summary_reply<T>(&self, request: GenerationRequest, scope: &str) -> T
  where
    T: serde::de::DeserializeOwned + Default,
  {
    match self.generator.generate(request).await {
      Ok(raw) => reply::parse_object(&raw).unwrap_or_else(|e| {
        warn!(scope, error = %e, "unusable summary reply; using fallback");
        T::default()
      }),
      Err(e) => {
        warn!(scope, error = %e, "summary generation failed; using fallback");
        T::default()
      }
    }
  }
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// Counts per non-blank value.
fn distribution<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, u32> {
  let mut counts = BTreeMap::new();
  for value in values.map(str::trim).filter(|v| !v.is_empty()) {
    *counts.entry(value.to_owned()).or_insert(0) += 1;
  }
  counts
}

/// Sentiment texts grouped by theme, themes in order of first appearance.
/// Responses without a theme go to [`UNKNOWN_THEME`].
fn group_by_theme(responses: &[Response]) -> Vec<(String, Vec<String>)> {
  let mut groups: Vec<(String, Vec<String>)> = Vec::new();
  for response in responses {
    let text = response.sentiment_text();
    if text.is_empty() {
      continue;
    }
    let theme = response.theme.as_deref().unwrap_or(UNKNOWN_THEME);
    match groups.iter_mut().find(|(t, _)| t == theme) {
      Some((_, texts)) => texts.push(text),
      None => groups.push((theme.to_owned(), vec![text])),
    }
  }
  groups
}

// ─── Fallbacks ───────────────────────────────────────────────────────────────

fn or_fallback(items: Vec<String>, fallback: Vec<String>) -> Vec<String> {
  if items.len() < MIN_SUMMARY_ITEMS { fallback } else { items }
}

/// Canned summary naming `theme`, used when the generator gives too little.
pub fn fallback_theme_summary(theme: &str) -> ThemeSummary {
  let theme = theme.to_lowercase();
  ThemeSummary {
    trending_issues: vec![
      format!("Mixed clarity around {theme} across roles"),
      format!("Inconsistent practices regarding {theme} between departments"),
    ],
    recommendations: vec![
      format!("Define clear ownership and KPIs for {theme}"),
      format!("Create a monthly cadence to review {theme} progress"),
    ],
  }
}

pub fn fallback_overall_summary() -> OverallSummary {
  OverallSummary {
    recurring_issues: vec![
      "Cross-theme clarity gaps".to_owned(),
      "Reporting cadence limits timely actions".to_owned(),
    ],
    recommendations:  vec![
      "Tailor goal communication".to_owned(),
      "Adopt more frequent reporting cadence".to_owned(),
    ],
  }
}
