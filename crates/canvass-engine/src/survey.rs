//! Survey progression: starting a survey, advancing it one answer at a time,
//! and reading its progress.

use canvass_core::{
  company::resolve_company_token,
  generate::TextGenerator,
  progress::{Decision, SurveyProgress},
  question::{Question, QuestionKind, question_id},
  response::NewResponse,
  store::{Commit, SurveyStore},
  survey::{NewSurvey, Survey},
  theme::default_sequence,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result, prompt, reply,
  service::{
    Advance, FIRST_QUESTION_TEXT, FirstQuestion, ProgressSnapshot, StartSurvey, SubmitAnswer,
    SurveyService,
  },
};

impl<S, G> SurveyService<S, G>
where
  S: SurveyStore,
  G: TextGenerator,
{
  /// Validate `input`, resolve its company, persist the survey with fresh
  /// progress and return the opening question.
  pub async fn start(&self, input: StartSurvey) -> Result<FirstQuestion> {
    let goals = input.validate()?;

    let existing = self.store.company_tokens().await.map_err(Error::store)?;
    let company_token = resolve_company_token(&input.company_name, &existing);
    debug!(company_name = %input.company_name, %company_token, "resolved company token");

    let survey = self
      .store
      .create_survey(NewSurvey {
        full_name: input.full_name.trim().to_owned(),
        email: input.email.trim().to_owned(),
        company_token,
        role: input.role.trim().to_owned(),
        business_area: input.business_area.trim().to_owned(),
        goals: goals.clone(),
      })
      .await
      .map_err(Error::store)?;

    let progress =
      SurveyProgress::start(survey.survey_id, default_sequence(), FIRST_QUESTION_TEXT)?;
    self.store.init_progress(&progress).await.map_err(Error::store)?;

    info!(survey_id = %survey.survey_id, company = %survey.company_token, "survey started");

    Ok(FirstQuestion {
      survey_id: survey.survey_id,
      question:  Question {
        question_id: question_id(1),
        text:        FIRST_QUESTION_TEXT.to_owned(),
        kind:        QuestionKind::MultiSelect,
        options:     goals,
      },
    })
  }

  /// Record `input` and produce the next question.
  ///
  /// Nothing is written unless the generator produced a usable question; the
  /// response and the new progress are then committed together.
  pub async fn advance(&self, input: SubmitAnswer) -> Result<Advance> {
    let survey_id = input.survey_id;
    let (survey, progress) = self.load(survey_id).await?;

    if progress.is_finished() {
      if !progress.completed {
        let mut done = progress;
        done.mark_completed();
        if let Commit::Stale = self.store.save_progress(&done).await.map_err(Error::store)? {
          debug!(%survey_id, "completion already recorded by a concurrent request");
        }
      }
      return Ok(Advance::Completed);
    }

    let theme = progress.current_theme.clone();
    let mut next = progress;
    let forced = next.record_answer();
    let next_id = next.next_question_id();

    let request = prompt::next_question(&survey, &next, &input.answer.to_string(), &next_id);
    let raw = match self.generator.generate(request).await {
      Ok(raw) => raw,
      Err(e) => {
        warn!(%survey_id, error = %e, "question generation failed");
        return Ok(Advance::GenerationFailed);
      }
    };
    let parsed = match reply::parse_question(&raw) {
      Ok(parsed) => parsed,
      Err(e) => {
        warn!(%survey_id, error = %e, "unusable question reply");
        return Ok(Advance::GenerationFailed);
      }
    };

    let step = next.apply(forced, Decision {
      switch_theme: parsed.switch_theme,
      next_theme:   parsed.next_theme.as_deref(),
      text:         &parsed.text,
    });

    let response = NewResponse {
      survey_id,
      question_id: input.question_id,
      question_text: input.question_text,
      answer: input.answer,
      theme: Some(theme),
    };
    if let Commit::Stale = self.store.commit_answer(response, &next).await.map_err(Error::store)? {
      warn!(%survey_id, "progress changed while generating; answer rejected");
      return Err(Error::Conflict(survey_id));
    }

    if step.switched {
      debug!(%survey_id, forced, theme = %next.current_theme, "theme switched");
    }
    if step.completed {
      info!(%survey_id, questions = next.total_question_count, "survey completed");
      return Ok(Advance::Completed);
    }

    Ok(Advance::Next(Question {
      question_id: step.question_id,
      text:        step.text,
      kind:        parsed.kind,
      options:     parsed.options,
    }))
  }

  /// The progress snapshot for `survey_id`. Survey context is best-effort:
  /// progress without a survey row still yields a snapshot.
  pub async fn progress(&self, survey_id: Uuid) -> Result<ProgressSnapshot> {
    let progress = self
      .store
      .get_progress(survey_id)
      .await
      .map_err(Error::store)?
      .ok_or(canvass_core::Error::ProgressNotFound(survey_id))?;
    let survey = self.store.get_survey(survey_id).await.map_err(Error::store)?;

    let themes_left = progress.themes_left().into_iter().map(str::to_owned).collect();
    let next_question_id = (!progress.completed).then(|| progress.next_question_id());
    let last_question_text = progress.question_history.last().cloned();
    let question_history_tail = progress.recent_questions(prompt::RECENT_QUESTIONS).to_vec();
    let (role, business_area, goals) = match survey {
      Some(s) => (Some(s.role), Some(s.business_area), s.goals),
      None => (None, None, Vec::new()),
    };

    Ok(ProgressSnapshot {
      survey_id,
      completed: progress.completed,
      current_theme: progress.current_theme,
      completed_themes: progress.completed_themes,
      themes_left,
      theme_sequence: progress.theme_sequence,
      total_question_count: progress.total_question_count,
      next_question_id,
      last_question_text,
      question_history_tail,
      theme_question_counts: progress.theme_question_counts,
      role,
      business_area,
      goals,
    })
  }

  async fn load(&self, survey_id: Uuid) -> Result<(Survey, SurveyProgress)> {
    let survey = self
      .store
      .get_survey(survey_id)
      .await
      .map_err(Error::store)?
      .ok_or(canvass_core::Error::SurveyNotFound(survey_id))?;
    let progress = self
      .store
      .get_progress(survey_id)
      .await
      .map_err(Error::store)?
      .ok_or(canvass_core::Error::ProgressNotFound(survey_id))?;
    Ok((survey, progress))
  }
}
