//! [`SqliteStore`]: the SQLite implementation of [`SurveyStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use canvass_core::{
  progress::SurveyProgress,
  response::{NewResponse, Response},
  store::{Commit, SurveyStore},
  survey::{NewSurvey, Survey},
};

use crate::{
  encode::{
    encode_answer, encode_dt, encode_list, encode_uuid, EncodedProgress, RawProgress,
    RawResponse, RawSurvey, PROGRESS_COLUMNS, RESPONSE_COLUMNS, SURVEY_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A canvass survey store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Overwrite a progress row if its stored version still equals `p.version`.
/// Returns the number of rows changed (0 or 1).
fn update_progress(conn: &rusqlite::Connection, p: &EncodedProgress) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE survey_progress SET
       current_question_id   = ?2,
       current_theme         = ?3,
       theme_sequence        = ?4,
       completed_themes      = ?5,
       question_history      = ?6,
       theme_question_counts = ?7,
       total_question_count  = ?8,
       completed             = ?9,
       updated_at            = ?10,
       version               = version + 1
     WHERE survey_id = ?1 AND version = ?11",
    rusqlite::params![
      p.survey_id,
      p.current_question_id,
      p.current_theme,
      p.theme_sequence,
      p.completed_themes,
      p.question_history,
      p.theme_question_counts,
      p.total_question_count,
      p.completed,
      p.updated_at,
      p.version,
    ],
  )
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn create_survey(&self, input: NewSurvey) -> Result<Survey> {
    let survey = Survey {
      survey_id:     Uuid::new_v4(),
      created_at:    Utc::now(),
      full_name:     input.full_name,
      email:         input.email,
      company_token: input.company_token,
      role:          input.role,
      business_area: input.business_area,
      goals:         input.goals,
    };

    let id_str    = encode_uuid(survey.survey_id);
    let at_str    = encode_dt(survey.created_at);
    let name      = survey.full_name.clone();
    let email     = survey.email.clone();
    let token     = survey.company_token.clone();
    let role      = survey.role.clone();
    let area      = survey.business_area.clone();
    let goals_str = encode_list(&survey.goals)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO surveys (
             survey_id, created_at, full_name, email,
             company_token, role, business_area, goals
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![id_str, at_str, name, email, token, role, area, goals_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(survey)
  }

  async fn get_survey(&self, id: Uuid) -> Result<Option<Survey>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSurvey> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE survey_id = ?1"),
            rusqlite::params![id_str],
            RawSurvey::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSurvey::into_survey).transpose()
  }

  async fn company_tokens(&self) -> Result<Vec<String>> {
    let tokens = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT company_token FROM surveys
           GROUP BY company_token
           ORDER BY MIN(rowid)",
        )?;
        let rows = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(tokens)
  }

  async fn surveys_for_company(&self, company_token: &str) -> Result<Vec<Survey>> {
    let token = company_token.to_owned();

    let raws: Vec<RawSurvey> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SURVEY_COLUMNS} FROM surveys WHERE company_token = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![token], RawSurvey::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSurvey::into_survey).collect()
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  async fn init_progress(&self, progress: &SurveyProgress) -> Result<()> {
    let p = EncodedProgress::new(progress)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO survey_progress ({PROGRESS_COLUMNS}, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          rusqlite::params![
            p.survey_id,
            p.current_question_id,
            p.current_theme,
            p.theme_sequence,
            p.completed_themes,
            p.question_history,
            p.theme_question_counts,
            p.total_question_count,
            p.completed,
            p.version,
            p.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn get_progress(&self, survey_id: Uuid) -> Result<Option<SurveyProgress>> {
    let id_str = encode_uuid(survey_id);

    let raw: Option<RawProgress> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROGRESS_COLUMNS} FROM survey_progress WHERE survey_id = ?1"),
            rusqlite::params![id_str],
            RawProgress::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProgress::into_progress).transpose()
  }

  async fn save_progress(&self, progress: &SurveyProgress) -> Result<Commit<()>> {
    let p = EncodedProgress::new(progress)?;

    let changed = self
      .conn
      .call(move |conn| Ok(update_progress(conn, &p)?))
      .await?;

    Ok(if changed == 0 { Commit::Stale } else { Commit::Applied(()) })
  }

  // ── Responses ─────────────────────────────────────────────────────────────

  async fn commit_answer(
    &self,
    input: NewResponse,
    progress: &SurveyProgress,
  ) -> Result<Commit<Response>> {
    let response = Response {
      response_id:   Uuid::new_v4(),
      survey_id:     input.survey_id,
      question_id:   input.question_id,
      question_text: input.question_text,
      answer:        input.answer,
      theme:         input.theme,
      recorded_at:   Utc::now(),
    };

    let p            = EncodedProgress::new(progress)?;
    let resp_id_str  = encode_uuid(response.response_id);
    let survey_str   = encode_uuid(response.survey_id);
    let question_id  = response.question_id.clone();
    let question_txt = response.question_text.clone();
    let answer_str   = encode_answer(&response.answer)?;
    let theme        = response.theme.clone();
    let at_str       = encode_dt(response.recorded_at);

    let applied: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if update_progress(&tx, &p)? == 0 {
          // Dropping the transaction rolls it back.
          return Ok(false);
        }
        tx.execute(
          &format!(
            "INSERT INTO responses ({RESPONSE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![
            resp_id_str,
            survey_str,
            question_id,
            question_txt,
            answer_str,
            theme,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if applied { Commit::Applied(response) } else { Commit::Stale })
  }

  async fn responses_for_company(&self, company_token: &str) -> Result<Vec<Response>> {
    let token = company_token.to_owned();

    let raws: Vec<RawResponse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESPONSE_COLUMNS} FROM responses
           WHERE survey_id IN (SELECT survey_id FROM surveys WHERE company_token = ?1)
           ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![token], RawResponse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResponse::into_response).collect()
  }
}
