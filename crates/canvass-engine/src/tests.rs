//! `SurveyService` driven end to end over an in-memory `SqliteStore` and a
//! scripted generator.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use canvass_core::{
  generate::{GenerationRequest, Purpose, TextGenerator},
  question::{Question, QuestionKind},
  report::ANONYMIZED_NOTE,
  response::{Answer, NewResponse},
  store::SurveyStore,
  theme::{THEMES, UNKNOWN_THEME},
};
use canvass_store_sqlite::SqliteStore;
use serde_json::json;
use uuid::Uuid;

use crate::{
  Advance, Error, ReportConfig, StartSurvey, SubmitAnswer, SurveyService,
  fallback_overall_summary, fallback_theme_summary,
};

// ─── Scripted generator ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("generator unavailable")]
struct Unavailable;

/// Question replies are served from a queue (empty queue = failure).
/// Sentiment follows keywords in the text. Summaries return one fixed reply
/// or fail.
#[derive(Default)]
struct ScriptedGenerator {
  questions: Mutex<VecDeque<String>>,
  summary:   Mutex<Option<String>>,
  requests:  Mutex<Vec<GenerationRequest>>,
  /// When set, the next question request first bumps this survey's stored
  /// progress, as a concurrent answer would.
  interfere: Mutex<Option<(SqliteStore, Uuid)>>,
}

impl ScriptedGenerator {
  fn queue(&self, reply: impl Into<String>) {
    self.questions.lock().unwrap().push_back(reply.into());
  }

  fn question_requests(&self) -> Vec<GenerationRequest> {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.purpose == Purpose::Question)
      .cloned()
      .collect()
  }
}

impl TextGenerator for ScriptedGenerator {
  type Error = Unavailable;

  async fn generate(&self, request: GenerationRequest) -> Result<String, Unavailable> {
    self.requests.lock().unwrap().push(request.clone());
    match request.purpose {
      Purpose::Question => {
        let interloper = self.interfere.lock().unwrap().take();
        if let Some((store, survey_id)) = interloper {
          let progress = store.get_progress(survey_id).await.unwrap().unwrap();
          store.save_progress(&progress).await.unwrap();
        }
        self.questions.lock().unwrap().pop_front().ok_or(Unavailable)
      }
      Purpose::Sentiment => {
        let text = request.messages.join("\n");
        let label = if text.contains("great") {
          "Positive."
        } else if text.contains("awful") {
          "negative"
        } else {
          "neutral"
        };
        Ok(label.to_owned())
      }
      Purpose::Summary => self.summary.lock().unwrap().clone().ok_or(Unavailable),
    }
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
  service:   SurveyService<SqliteStore, ScriptedGenerator>,
  store:     SqliteStore,
  generator: Arc<ScriptedGenerator>,
}

async fn harness() -> Harness {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let generator = Arc::new(ScriptedGenerator::default());
  let service = SurveyService::new(Arc::new(store.clone()), generator.clone());
  Harness { service, store, generator }
}

fn start_input(company: &str) -> StartSurvey {
  StartSurvey {
    full_name:     "Ada Obi".into(),
    email:         "ada@example.com".into(),
    company_name:  company.into(),
    role:          "Engineer".into(),
    business_area: "Platform".into(),
    goals:         vec!["Ship faster".into(), "Reduce bugs".into()],
  }
}

fn question_reply(text: &str, switch_theme: bool, next_theme: Option<&str>) -> String {
  json!({
    "switch_theme": switch_theme,
    "next_theme": next_theme,
    "question_id": "q99",
    "text": text,
    "type": "select",
    "options": ["Yes", "Partial", "No"],
  })
  .to_string()
}

async fn answer(h: &Harness, survey_id: Uuid, shown: &Question, answer: &str) -> Advance {
  h.service
    .advance(SubmitAnswer {
      survey_id,
      question_id: shown.question_id.clone(),
      question_text: shown.text.clone(),
      answer: Answer::Text(answer.into()),
    })
    .await
    .unwrap()
}

fn next(advance: Advance) -> Question {
  match advance {
    Advance::Next(q) => q,
    other => panic!("expected a next question, got {other:?}"),
  }
}

// ─── Start ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_returns_goal_question() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  assert_eq!(first.question.question_id, "q1");
  assert_eq!(first.question.text, "Do you know these goals?");
  assert_eq!(first.question.kind, QuestionKind::MultiSelect);
  assert_eq!(first.question.options, vec!["Ship faster", "Reduce bugs"]);

  let progress = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert_eq!(progress.current_question_id, "q1");
  assert_eq!(progress.current_theme, THEMES[0]);
  assert_eq!(progress.total_question_count, 1);
  assert_eq!(progress.question_history, vec!["Do you know these goals?"]);
  assert_eq!(progress.theme_question_counts.get(THEMES[0]), Some(&1));
}

#[tokio::test]
async fn start_rejects_blank_fields_and_goals() {
  let h = harness().await;

  let mut input = start_input("Acme Corp");
  input.full_name = "  ".into();
  assert!(matches!(h.service.start(input).await, Err(Error::Validation(_))));

  let mut input = start_input("Acme Corp");
  input.goals = vec![" ".into()];
  assert!(matches!(h.service.start(input).await, Err(Error::Validation(_))));

  assert!(h.store.company_tokens().await.unwrap().is_empty());
}

#[tokio::test]
async fn start_resolves_company_variants() {
  let h = harness().await;
  let a = h.service.start(start_input("acme corp")).await.unwrap();
  let b = h.service.start(start_input("ACME Corporation")).await.unwrap();
  let c = h.service.start(start_input("Globex")).await.unwrap();

  let token = |id| {
    let store = h.store.clone();
    async move { store.get_survey(id).await.unwrap().unwrap().company_token }
  };
  assert_eq!(token(a.survey_id).await, "Acme Corp");
  assert_eq!(token(b.survey_id).await, "Acme Corp");
  assert_eq!(token(c.survey_id).await, "Globex");
}

// ─── Advance ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn advance_unknown_survey_is_not_found() {
  let h = harness().await;
  let err = h
    .service
    .advance(SubmitAnswer {
      survey_id:     Uuid::new_v4(),
      question_id:   "q1".into(),
      question_text: "Do you know these goals?".into(),
      answer:        Answer::Text("Yes".into()),
    })
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn advance_assigns_ids_locally() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  let mut shown = first.question;
  for (expected, text) in [("q2", "Which goal drives you?"), ("q3", "How does it show up?")] {
    h.generator.queue(question_reply(text, false, None));
    shown = next(answer(&h, first.survey_id, &shown, "Yes").await);
    assert_eq!(shown.question_id, expected);
    assert_eq!(shown.text, text);
    assert_eq!(shown.kind, QuestionKind::Select);
  }

  let prompts = h.generator.question_requests();
  assert!(prompts[0].messages[0].contains("\"question_id\": \"q2\""));
  assert!(prompts[1].messages[0].contains("\"question_id\": \"q3\""));

  let progress = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert_eq!(progress.total_question_count, 3);
  assert_eq!(progress.question_history.len(), 3);
  assert_eq!(progress.version, 2);
}

#[tokio::test]
async fn generator_failure_changes_nothing() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();
  let before = h.store.get_progress(first.survey_id).await.unwrap().unwrap();

  // Nothing queued: the generator errors.
  let outcome = answer(&h, first.survey_id, &first.question, "Yes").await;
  assert_eq!(outcome, Advance::GenerationFailed);

  // Prose instead of JSON.
  h.generator.queue("Sorry, I can't do that.");
  let outcome = answer(&h, first.survey_id, &first.question, "Yes").await;
  assert_eq!(outcome, Advance::GenerationFailed);

  let after = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert_eq!(after, before);
  let responses = h.store.responses_for_company("Acme Corp").await.unwrap();
  assert!(responses.is_empty());

  let sentinel = outcome.into_question();
  assert_eq!(sentinel.question_id, "error");
  assert_eq!(sentinel.kind, QuestionKind::Text);
  assert!(sentinel.options.is_empty());
}

#[tokio::test]
async fn resubmission_after_failure_records_once() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  answer(&h, first.survey_id, &first.question, "Yes").await;
  h.generator.queue(question_reply("Which goal drives you?", false, None));
  let shown = next(answer(&h, first.survey_id, &first.question, "Yes").await);
  assert_eq!(shown.question_id, "q2");

  let responses = h.store.responses_for_company("Acme Corp").await.unwrap();
  assert_eq!(responses.len(), 1);
  assert_eq!(responses[0].question_id, "q1");
  assert_eq!(responses[0].theme.as_deref(), Some(THEMES[0]));
}

#[tokio::test]
async fn repeated_question_text_is_disambiguated() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  h.generator.queue(question_reply("do you know these goals?", false, None));
  let shown = next(answer(&h, first.survey_id, &first.question, "Yes").await);
  assert_eq!(shown.text, "do you know these goals? - please be specific.");
}

#[tokio::test]
async fn fifth_question_forces_theme_switch() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  let mut shown = first.question;
  for i in 0..4 {
    h.generator.queue(question_reply(&format!("Clarity question {i}"), false, None));
    shown = next(answer(&h, first.survey_id, &shown, "Partial").await);
  }

  let progress = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert_eq!(progress.theme_question_counts.get(THEMES[0]), Some(&5));
  assert_eq!(progress.completed_themes, vec![THEMES[0]]);
  assert_eq!(progress.current_theme, THEMES[1]);
  assert_eq!(shown.question_id, "q5");
}

#[tokio::test]
async fn explicit_next_theme_is_honoured_only_when_open() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  h.generator.queue(question_reply("Connected?", true, Some("Frontline Impact")));
  let shown = next(answer(&h, first.survey_id, &first.question, "Yes").await);
  let snapshot = h.service.progress(first.survey_id).await.unwrap();
  assert_eq!(snapshot.current_theme, "Frontline Impact");

  h.generator.queue(question_reply("Measured?", true, Some("Clarity of Goals")));
  next(answer(&h, first.survey_id, &shown, "No").await);
  let snapshot = h.service.progress(first.survey_id).await.unwrap();
  assert_eq!(snapshot.current_theme, "Measurement of Progress");
  assert_eq!(snapshot.completed_themes, vec!["Clarity of Goals", "Frontline Impact"]);
}

#[tokio::test]
async fn survey_completes_after_every_theme() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  let mut shown = first.question;
  for i in 0..4 {
    h.generator.queue(question_reply(&format!("Theme opener {i}"), true, None));
    shown = next(answer(&h, first.survey_id, &shown, "Yes").await);
  }
  h.generator.queue(question_reply("Never shown", true, None));
  let done = answer(&h, first.survey_id, &shown, "Ship faster, Reduce bugs").await;
  assert_eq!(done, Advance::Completed);

  let progress = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert!(progress.completed);
  assert_eq!(progress.completed_themes.len(), THEMES.len());
  assert_eq!(progress.total_question_count, 6);

  // Further answers are not recorded.
  let again = answer(&h, first.survey_id, &shown, "Anything").await;
  assert_eq!(again, Advance::Completed);
  let after = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert_eq!(after, progress);
  let responses = h.store.responses_for_company("Acme Corp").await.unwrap();
  assert_eq!(responses.len(), 5);

  let sentinel = again.into_question();
  assert_eq!(sentinel.question_id, "done");
  assert_eq!(sentinel.text, crate::COMPLETION_TEXT);
}

#[tokio::test]
async fn concurrent_write_is_a_conflict() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();

  *h.generator.interfere.lock().unwrap() = Some((h.store.clone(), first.survey_id));
  h.generator.queue(question_reply("Which goal drives you?", false, None));

  let err = h
    .service
    .advance(SubmitAnswer {
      survey_id:     first.survey_id,
      question_id:   "q1".into(),
      question_text: "Do you know these goals?".into(),
      answer:        Answer::Text("Yes".into()),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(id) if id == first.survey_id));

  let responses = h.store.responses_for_company("Acme Corp").await.unwrap();
  assert!(responses.is_empty());
  let progress = h.store.get_progress(first.survey_id).await.unwrap().unwrap();
  assert_eq!(progress.total_question_count, 1);
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_snapshot_reflects_state() {
  let h = harness().await;
  let first = h.service.start(start_input("Acme Corp")).await.unwrap();
  h.generator.queue(question_reply("Which goal drives you?", false, None));
  answer(&h, first.survey_id, &first.question, "Yes").await;

  let snapshot = h.service.progress(first.survey_id).await.unwrap();
  assert!(!snapshot.completed);
  assert_eq!(snapshot.total_question_count, 2);
  assert_eq!(snapshot.next_question_id.as_deref(), Some("q3"));
  assert_eq!(snapshot.last_question_text.as_deref(), Some("Which goal drives you?"));
  assert_eq!(snapshot.question_history_tail.len(), 2);
  assert_eq!(snapshot.themes_left.len(), 4);
  assert_eq!(snapshot.role.as_deref(), Some("Engineer"));
  assert_eq!(snapshot.goals, vec!["Ship faster", "Reduce bugs"]);

  let json = serde_json::to_value(&snapshot).unwrap();
  assert_eq!(json["next_question_id"], "q3");
  assert_eq!(json["theme_question_counts"][THEMES[0]], 2);
}

#[tokio::test]
async fn progress_for_unknown_survey_is_not_found() {
  let h = harness().await;
  let err = h.service.progress(Uuid::new_v4()).await.unwrap_err();
  assert!(err.is_not_found());
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Two respondents at Acme: one positive and one neutral answer in Clarity of
/// Goals, one negative answer in Measurement of Progress.
async fn seeded_company(h: &Harness) {
  let a = h.service.start(start_input("Acme Corp")).await.unwrap();
  let mut b_input = start_input("acme corporation");
  b_input.role = "Manager".into();
  let b = h.service.start(b_input).await.unwrap();

  h.generator.queue(question_reply("Are tasks measured?", true, None));
  let a2 = next(answer(h, a.survey_id, &a.question, "great, all clear").await);
  h.generator.queue(question_reply("Which goal is clearest?", false, None));
  next(answer(h, b.survey_id, &b.question, "somewhat").await);
  h.generator.queue(question_reply("What is measured instead?", false, None));
  next(answer(h, a.survey_id, &a2, "awful, nothing is tracked").await);
}

#[tokio::test]
async fn report_for_unknown_company_is_empty() {
  let h = harness().await;
  let report = h.service.report("Nobody").await.unwrap();
  assert_eq!(report.respondents, 0);
  assert!(report.themes.is_empty());
  assert_eq!(report.notes, vec![ANONYMIZED_NOTE]);
}

#[tokio::test]
async fn report_aggregates_sentiment_and_ranks_themes() {
  let h = harness().await;
  seeded_company(&h).await;

  let report = h.service.report("Acme Corp").await.unwrap();
  assert_eq!(report.respondents, 2);
  assert_eq!(report.roles.get("Engineer"), Some(&1));
  assert_eq!(report.roles.get("Manager"), Some(&1));
  assert_eq!(report.business_areas.get("Platform"), Some(&2));

  let names: Vec<&str> = report.themes.iter().map(|(t, _)| t).collect();
  assert_eq!(names, vec![THEMES[0], THEMES[1]]);

  let clarity = report.themes.get(THEMES[0]).unwrap();
  assert_eq!(clarity.responses, 2);
  assert_eq!(clarity.sentiment_counts.positive, 1);
  assert_eq!(clarity.sentiment_counts.neutral, 1);
  assert_eq!(clarity.sentiment.positivity_score(), 50);
  assert!(clarity.sentiment_percent_note.is_some());
  assert_eq!(clarity.trending_issues, fallback_theme_summary(THEMES[0]).trending_issues);

  let measurement = report.themes.get(THEMES[1]).unwrap();
  assert_eq!(measurement.sentiment_counts.negative, 1);

  assert_eq!(report.overall_sentiment_counts.total(), 3);
  assert_eq!(report.overall_summary, fallback_overall_summary());

  assert_eq!(report.theme_ranking[0].theme, THEMES[0]);
  assert_eq!(report.theme_ranking[0].rank, 1);
  assert_eq!(report.theme_ranking[1].positivity_score, -100);
  assert_eq!(report.theme_ranking[1].summary, "Weak area; address concerns urgently.");

  assert_eq!(report.notes.len(), 2);
  assert_eq!(report.notes[1], "Based on 2 respondents; interpret with caution.");

  let json = serde_json::to_value(&report).unwrap();
  assert_eq!(json["themes"][THEMES[0]]["sentiment"]["positive"], "50%");
}

#[tokio::test]
async fn report_buckets_unthemed_responses_as_unknown() {
  let h = harness().await;
  let a = h.service.start(start_input("Acme Corp")).await.unwrap();

  // A response stored without a theme, ahead of any themed answer.
  let progress = h.store.get_progress(a.survey_id).await.unwrap().unwrap();
  h.store
    .commit_answer(
      NewResponse {
        survey_id:     a.survey_id,
        question_id:   "q1".into(),
        question_text: "Do you know these goals?".into(),
        answer:        Answer::Text("great question".into()),
        theme:         None,
      },
      &progress,
    )
    .await
    .unwrap();

  h.generator.queue(question_reply("Which goal is clearest?", false, None));
  next(answer(&h, a.survey_id, &a.question, "awful, no idea").await);

  let report = h.service.report("Acme Corp").await.unwrap();
  let names: Vec<&str> = report.themes.iter().map(|(t, _)| t).collect();
  assert_eq!(names, vec![UNKNOWN_THEME, THEMES[0]]);

  let unknown = report.themes.get(UNKNOWN_THEME).unwrap();
  assert_eq!(unknown.responses, 1);
  assert_eq!(unknown.sentiment_counts.positive, 1);
  assert_eq!(report.themes.get(THEMES[0]).unwrap().sentiment_counts.negative, 1);
}

#[tokio::test]
async fn report_uses_generated_summaries_when_usable() {
  let h = harness().await;
  seeded_company(&h).await;
  *h.generator.summary.lock().unwrap() = Some(
    "```json\n{\"trending_issues\": [\"i1\", \"i2\", \"i3\", \"i4\", \"i5\", \"i6\"], \
     \"recommendations\": [\"r1\", \"r2\", \"r3\", \"r4\"]}\n```"
      .to_owned(),
  );

  let report = h.service.report("Acme Corp").await.unwrap();
  let clarity = report.themes.get(THEMES[0]).unwrap();
  assert_eq!(clarity.trending_issues, vec!["i1", "i2", "i3", "i4", "i5"]);
  assert_eq!(clarity.recommendations, vec!["r1", "r2", "r3", "r4"]);

  // The overall reply has no `recurring_issues`, so only that list falls back.
  let fallback = fallback_overall_summary();
  assert_eq!(report.overall_summary.recurring_issues, fallback.recurring_issues);
  assert_eq!(report.overall_summary.recommendations, vec!["r1", "r2", "r3"]);
}

#[tokio::test]
async fn report_samples_sentiment_but_counts_every_response() {
  let h = harness().await;
  seeded_company(&h).await;
  let service = SurveyService::new(Arc::new(h.store.clone()), h.generator.clone())
    .with_report_config(ReportConfig {
      max_responses_per_theme: 1,
      small_sample_threshold: 1,
      ..ReportConfig::default()
    });

  let report = service.report("Acme Corp").await.unwrap();
  let clarity = report.themes.get(THEMES[0]).unwrap();
  assert_eq!(clarity.responses, 2);
  assert_eq!(clarity.sentiment_counts.total(), 1);
  assert!(clarity.sentiment_percent_note.is_none());
  assert_eq!(report.notes, vec![ANONYMIZED_NOTE]);
}
