//! Prompt construction for every generator call the engine makes.
//!
//! Each builder returns a complete [`GenerationRequest`]; callers never
//! assemble prompt text themselves.

use std::collections::BTreeMap;

use canvass_core::{
  generate::{GenerationRequest, Purpose},
  progress::SurveyProgress,
  survey::Survey,
};

pub const QUESTION_TEMPERATURE: f32 = 0.3;
pub const SENTIMENT_TEMPERATURE: f32 = 0.0;
pub const SUMMARY_TEMPERATURE: f32 = 0.2;

/// How many recent questions the generator sees when choosing the next one.
pub const RECENT_QUESTIONS: usize = 5;

const QUESTION_SYSTEM: &str = "You are an assistant that generates structured survey questions.";
const SENTIMENT_SYSTEM: &str = "You are a precise sentiment classifier that outputs only one word.";
const THEME_SUMMARY_SYSTEM: &str =
  "You are an expert HR insights analyst. Be concise, actionable, and anonymous.";
const OVERALL_SUMMARY_SYSTEM: &str =
  "You are an expert HR insights analyst. Respond in concise JSON only.";

const QUESTION_RULES: &str = r#"
Rules:
1. Ask three to five questions per theme. Once enough have been asked, set "switch_theme" to true.
2. Follow the branching guide below. Every question must follow from the latest answer; never skip a step.
3. Never repeat a question already asked, or a close paraphrase of one.
4. Personalise questions with the respondent's role and department.
5. Mix "text" and "select" questions and include 1-5 rating questions where they help gauge confidence.
6. Keep questions comparable across respondents with similar roles and goals.
7. Stay on the current theme. No filler questions.
8. [G1], [G2], [G3] stand for the respondent's goals; substitute the real goals.

Branching guide:

Clarity of Goals
- Start: "Do you know these goals: [G1], [G2], [G3]?" (Yes / Partial / No)
- Yes: "Which goal drives your work most?" then "How does that goal show up in your daily tasks?"
- Partial: "Which goal is clearest to you?" then what makes it clear or what is unclear about the others.
- No: "What prevents you from knowing the goals?" (Never told / Too complex / Not communicated)

Measurement of Progress
- Start: "Are your daily tasks measured against [G1], [G2], [G3]?" (Always / Sometimes / Never)
- Always: "Which goal is tracked most closely?"
- Sometimes: "Which goal is sometimes tracked?" then how tasks are measured or how often metrics are reviewed.
- Never: "What is measured instead?" (Outputs / Activity / Nothing clear)

Visibility of Reports
- Start: "Do you see performance data for [G1], [G2], [G3]?" (Yes / Rarely / No)
- Yes: "Which goal's data is most useful?" then "How do you use it?"
- Rarely or No: "How often do you get updates?" (Weekly / Monthly / Never) then whether the delay affects work on their top goal.

Frontline Impact
- Start: "Does your daily work feel connected to [G1], [G2], [G3]?" (Yes / Partial / No)
- Yes: "Which goal feels most connected?" then what makes the connection strong.
- Partial: "Which goal feels least connected?" then what would strengthen it.
- No: "What drives your work instead?" (Daily tasks / Boss directives / Survival)

Priority Ranking
- Final question: "Rank [G1], [G2], [G3] by importance."
"#;

/// `k(v), k(v)` or `N/A` for an empty mix.
pub fn mix_line(counts: &BTreeMap<String, u32>) -> String {
  if counts.is_empty() {
    return "N/A".to_owned();
  }
  counts
    .iter()
    .map(|(k, v)| format!("{k}({v})"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn bullets(items: &[String], empty: &str) -> String {
  if items.is_empty() {
    return format!("- {empty}");
  }
  items
    .iter()
    .map(|i| format!("- \"{i}\""))
    .collect::<Vec<_>>()
    .join("\n")
}

// ─── Next question ───────────────────────────────────────────────────────────

/// The request for the question after `answer`.
///
/// `progress` must already have the answer counted against its theme but not
/// yet the new question applied.
pub fn next_question(
  survey: &Survey,
  progress: &SurveyProgress,
  answer: &str,
  next_question_id: &str,
) -> GenerationRequest {
  let mut prompt = format!(
    "You are running a structured workplace survey that gathers actionable feedback on company goals.\n\
     \n\
     Role: {role}\n\
     Department: {area}\n\
     Goals: {goals}\n\
     \n\
     Current theme: \"{theme}\"\n\
     Latest answer: \"{answer}\"\n\
     Recent questions (do NOT ask any of these again):\n{recent}\n\
     \n\
     Themes completed: {completed}\n\
     Themes left: {left}\n\
     Questions asked in this theme: {theme_count}\n\
     Questions asked in the survey: {total}\n\
     The next question id is \"{next_question_id}\".\n",
    role = survey.role,
    area = survey.business_area,
    goals = survey.goals.join(", "),
    theme = progress.current_theme,
    recent = bullets(progress.recent_questions(RECENT_QUESTIONS), "(none yet)"),
    completed = progress.completed_themes.join(", "),
    left = progress.themes_left().join(", "),
    theme_count = progress.current_theme_count(),
    total = progress.total_question_count,
  );
  prompt.push_str(QUESTION_RULES);
  prompt.push_str(&format!(
    r#"
Respond ONLY with this JSON object:

{{
  "switch_theme": true or false,
  "next_theme": "theme name" or null,
  "question_id": "{next_question_id}",
  "text": "the next question",
  "type": "text" or "select",
  "options": ["option 1", "option 2"]
}}
"options" is empty when "type" is "text".
"#
  ));

  GenerationRequest::new(Purpose::Question, QUESTION_SYSTEM, QUESTION_TEMPERATURE).message(prompt)
}

// ─── Sentiment ───────────────────────────────────────────────────────────────

pub fn classify_sentiment(text: &str) -> GenerationRequest {
  let prompt = format!(
    "Classify the sentiment of this employee survey answer as exactly one label:\n\
     - positive\n- neutral\n- negative\n\n\
     Reply with ONLY that word.\n\nAnswer:\n{}",
    text.trim()
  );
  GenerationRequest::new(Purpose::Sentiment, SENTIMENT_SYSTEM, SENTIMENT_TEMPERATURE)
    .message(prompt)
}

// ─── Summaries ───────────────────────────────────────────────────────────────

/// Trending issues and recommendations for one theme, from at most `limit`
/// of its answers.
pub fn theme_summary(
  company: &str,
  theme: &str,
  roles: &BTreeMap<String, u32>,
  business_areas: &BTreeMap<String, u32>,
  answers: &[String],
  limit: usize,
) -> GenerationRequest {
  let sample = answers
    .iter()
    .map(|a| a.trim())
    .filter(|a| !a.is_empty())
    .take(limit)
    .collect::<Vec<_>>()
    .join("\n- ");

  let context = format!(
    "You are analysing anonymised employee survey answers for a single company.\n\n\
     Company: {company}\n\
     Theme: {theme}\n\
     Role mix: {}\n\
     Department mix: {}\n\n\
     Answers (summarise patterns; do NOT quote them):\n- {sample}",
    mix_line(roles),
    mix_line(business_areas),
  );

  let shape = "Return JSON ONLY in this shape:\n\n\
     {\n  \"trending_issues\": [\"issue 1\", \"issue 2\", \"issue 3\"],\n  \
     \"recommendations\": [\"rec 1\", \"rec 2\", \"rec 3\"]\n}\n\n\
     Each item is short (at most 18 words), concrete and specific to the theme.\n\
     Give at least 2 issues and 2 recommendations. No names, emails or quotes.";

  GenerationRequest::new(Purpose::Summary, THEME_SUMMARY_SYSTEM, SUMMARY_TEMPERATURE)
    .message(context)
    .message(shape)
}

/// Recurring issues and company-level recommendations across all themes.
pub fn overall_summary(company: &str, issues: &[String], recommendations: &[String]) -> GenerationRequest {
  let context = format!(
    "Company: {company}\n\n\
     Trending issues collected across themes:\n- {}\n\n\
     Recommendations collected across themes:\n- {}\n\n\
     Summarise the recurring cross-theme issues and give 2-3 company-level recommendations.",
    issues.join("; "),
    recommendations.join("; "),
  );

  let shape = "Return JSON ONLY in this shape:\n\n\
     {\n  \"recurring_issues\": [\"issue 1\", \"issue 2\"],\n  \
     \"recommendations\": [\"rec 1\", \"rec 2\"]\n}";

  GenerationRequest::new(Purpose::Summary, OVERALL_SUMMARY_SYSTEM, SUMMARY_TEMPERATURE)
    .message(context)
    .message(shape)
}

#[cfg(test)]
mod tests {
  use super::*;
  use canvass_core::theme::default_sequence;
  use canvass_core::survey::Survey;

  fn survey() -> Survey {
    Survey {
      survey_id:     uuid::Uuid::nil(),
      created_at:    Default::default(),
      full_name:     "Ada Obi".into(),
      email:         "ada@example.com".into(),
      company_token: "Acme Corp".into(),
      role:          "Engineer".into(),
      business_area: "Platform".into(),
      goals:         vec!["Ship faster".into(), "Reduce bugs".into()],
    }
  }

  #[test]
  fn mix_line_formats_counts() {
    let counts = BTreeMap::from([("Engineer".to_owned(), 2), ("Manager".to_owned(), 1)]);
    assert_eq!(mix_line(&counts), "Engineer(2), Manager(1)");
    assert_eq!(mix_line(&BTreeMap::new()), "N/A");
  }

  #[test]
  fn question_prompt_carries_context() {
    let survey = survey();
    let mut progress =
      SurveyProgress::start(survey.survey_id, default_sequence(), "Do you know these goals?")
        .unwrap();
    progress.record_answer();

    let request = next_question(&survey, &progress, "Yes", "q2");
    assert_eq!(request.purpose, Purpose::Question);
    assert_eq!(request.temperature, QUESTION_TEMPERATURE);

    let prompt = &request.messages[0];
    assert!(prompt.contains("Role: Engineer"));
    assert!(prompt.contains("Goals: Ship faster, Reduce bugs"));
    assert!(prompt.contains("Current theme: \"Clarity of Goals\""));
    assert!(prompt.contains("- \"Do you know these goals?\""));
    assert!(prompt.contains("Questions asked in this theme: 2"));
    assert!(prompt.contains("\"question_id\": \"q2\""));
    assert!(prompt.contains("Themes left: Measurement of Progress, Visibility of Reports"));

    assert!(prompt.starts_with("You are running a structured workplace survey"));
    assert!(prompt.contains(
      "Latest answer: \"Yes\"\n\
       Recent questions (do NOT ask any of these again):\n\
       - \"Do you know these goals?\"\n\
       \n\
       Themes completed: \n"
    ));
    assert!(prompt.contains("The next question id is \"q2\".\n"));
    assert!(prompt.contains(QUESTION_RULES));
  }

  #[test]
  fn theme_summary_samples_answers() {
    let answers: Vec<String> = (0..10).map(|i| format!("answer {i}")).collect();
    let request = theme_summary(
      "Acme Corp",
      "Frontline Impact",
      &BTreeMap::new(),
      &BTreeMap::new(),
      &answers,
      3,
    );
    assert_eq!(request.messages.len(), 2);
    assert!(request.messages[0].contains("answer 2"));
    assert!(!request.messages[0].contains("answer 3"));
    assert!(request.messages[0].contains("Role mix: N/A"));
  }
}
