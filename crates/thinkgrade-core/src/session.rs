//! Learner session: owns the per-exercise answers and drives the
//! draft → evaluating → scored → (revise) → draft cycle.
//!
//! Every mutation is written through to the [`KeyValueStore`] immediately,
//! and only applied in memory once the write succeeded.
//! Re-entrant submits are ruled out by the phase check in
//! [`Session::begin_submit`]; [`Session::submit`] additionally holds
//! `&mut self` across the await.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;

use crate::catalog;
use crate::error::SessionError;
use crate::model::{
    Answer, AnswerPhase, AppState, EvaluationRequest, Feedback, MAX_SCORE, REVISE_BELOW_SCORE,
};
use crate::store::KeyValueStore;
use crate::traits::EvaluationBackend;

/// Store key holding the JSON map of exercise id → [`Answer`].
pub const ANSWERS_KEY: &str = "structured-thinking-answers";
/// Store key holding the current exercise index.
pub const CURRENT_INDEX_KEY: &str = "structured-thinking-current-problem";

pub struct Session<S: KeyValueStore> {
    store: S,
    state: AppState,
    last_error: Option<String>,
}

impl<S: KeyValueStore> Session<S> {
    /// Restore the session from `store`, creating an empty draft for every
    /// catalog exercise that has no saved answer.
    pub fn load(store: S) -> Result<Self, SessionError> {
        let exercises = catalog::exercises();

        let saved = store.get(ANSWERS_KEY).map_err(store_err)?;
        let mut answers: BTreeMap<String, Answer> = match saved {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| SessionError::Store(format!("corrupt {ANSWERS_KEY}: {e}")))?,
            None => BTreeMap::new(),
        };

        let now = Utc::now();
        for exercise in &exercises {
            answers
                .entry(exercise.id.clone())
                .or_insert_with(|| Answer::empty(exercise.id.clone(), now));
        }
        for answer in answers.values_mut() {
            // The request that put it there died with the previous process.
            if answer.phase == AnswerPhase::Evaluating {
                answer.phase = AnswerPhase::Draft;
            }
        }

        let current_exercise_index = store
            .get(CURRENT_INDEX_KEY)
            .map_err(store_err)?
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&i| i < exercises.len())
            .unwrap_or(0);

        Ok(Self {
            store,
            state: AppState {
                exercises,
                answers,
                current_exercise_index,
            },
            last_error: None,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn answer(&self, exercise_id: &str) -> Result<&Answer, SessionError> {
        self.state
            .answers
            .get(exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))
    }

    /// Message from the most recent failed evaluation, cleared on the next
    /// submit.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the answer text may be edited.
    pub fn is_editable(&self, exercise_id: &str) -> bool {
        self.answer(exercise_id)
            .is_ok_and(|a| a.phase == AnswerPhase::Draft)
    }

    pub fn can_submit(&self, exercise_id: &str) -> bool {
        self.answer(exercise_id)
            .is_ok_and(|a| a.phase == AnswerPhase::Draft && !a.content.trim().is_empty())
    }

    /// Revise is offered only for scored answers below [`REVISE_BELOW_SCORE`].
    pub fn can_revise(&self, exercise_id: &str) -> bool {
        self.answer(exercise_id).is_ok_and(|a| {
            a.phase == AnswerPhase::Scored && a.score.is_some_and(|s| s < REVISE_BELOW_SCORE)
        })
    }

    pub fn update_content(&mut self, exercise_id: &str, content: &str) -> Result<(), SessionError> {
        let answer = self.answer(exercise_id)?;
        if answer.phase != AnswerPhase::Draft {
            return Err(locked(answer));
        }
        let mut updated = answer.clone();
        updated.content = content.to_string();
        updated.last_saved_at = Utc::now();
        self.commit(updated)
    }

    /// Move the answer to `Evaluating` and return the request to send.
    pub fn begin_submit(&mut self, exercise_id: &str) -> Result<EvaluationRequest, SessionError> {
        let answer = self.answer(exercise_id)?;
        match answer.phase {
            AnswerPhase::Evaluating => {
                return Err(SessionError::AlreadyEvaluating(exercise_id.to_string()))
            }
            AnswerPhase::Scored => return Err(locked(answer)),
            AnswerPhase::Draft => {}
        }
        if answer.content.trim().is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        let request = EvaluationRequest::new(exercise_id, answer.content.clone());
        let mut updated = answer.clone();
        updated.phase = AnswerPhase::Evaluating;
        self.commit(updated)?;
        self.last_error = None;
        Ok(request)
    }

    /// Apply the outcome of the request returned by [`Self::begin_submit`].
    ///
    /// Success records the feedback and counts one attempt. Failure puts the
    /// answer back into an editable draft without touching score, feedback or
    /// attempts.
    ///
    /// If the outcome cannot be stored the answer still leaves `Evaluating`:
    /// it returns to the draft it was before the submit.
    pub fn complete_submit(
        &mut self,
        exercise_id: &str,
        outcome: Result<Feedback, String>,
    ) -> Result<(), SessionError> {
        let answer = self.answer(exercise_id)?;
        if answer.phase != AnswerPhase::Evaluating {
            return Err(SessionError::NotEvaluating(exercise_id.to_string()));
        }

        let mut updated = answer.clone();
        let failure = match outcome {
            Ok(feedback) => {
                updated.score = Some(feedback.score);
                updated.feedback = Some(feedback);
                updated.attempts += 1;
                updated.phase = AnswerPhase::Scored;
                None
            }
            Err(message) => {
                updated.phase = AnswerPhase::Draft;
                tracing::warn!(exercise_id, "evaluation failed: {message}");
                Some(message)
            }
        };

        if let Err(e) = self.commit(updated) {
            self.answer_mut(exercise_id)?.phase = AnswerPhase::Draft;
            self.last_error = Some(e.to_string());
            return Err(e);
        }
        self.last_error = failure;
        Ok(())
    }

    /// Submit the current draft to `backend` and apply the result.
    pub async fn submit(
        &mut self,
        exercise_id: &str,
        backend: &dyn EvaluationBackend,
    ) -> Result<Feedback, SessionError> {
        let request = self.begin_submit(exercise_id)?;
        let outcome = backend.evaluate(&request).await;
        let failure = outcome.as_ref().err().cloned();
        self.complete_submit(exercise_id, outcome)?;

        match failure {
            Some(message) => Err(SessionError::Evaluation(message)),
            None => self
                .answer(exercise_id)?
                .feedback
                .clone()
                .ok_or_else(|| SessionError::NotEvaluating(exercise_id.to_string())),
        }
    }

    /// Reopen a scored answer for editing. Content and the last feedback are
    /// kept until the next successful evaluation replaces them.
    pub fn revise(&mut self, exercise_id: &str) -> Result<(), SessionError> {
        if !self.can_revise(exercise_id) {
            // Distinguish a typo from a policy refusal.
            self.answer(exercise_id)?;
            return Err(SessionError::ReviseUnavailable(exercise_id.to_string()));
        }
        let mut updated = self.answer(exercise_id)?.clone();
        updated.phase = AnswerPhase::Draft;
        self.commit(updated)
    }

    pub fn select_exercise(&mut self, index: usize) -> Result<(), SessionError> {
        let len = self.state.exercises.len();
        if index >= len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        self.state.current_exercise_index = index;
        self.store
            .set(CURRENT_INDEX_KEY, &index.to_string())
            .map_err(store_err)
    }

    pub fn progress(&self) -> Progress {
        let scores: Vec<u8> = self
            .state
            .exercises
            .iter()
            .filter_map(|e| self.state.answers.get(&e.id).and_then(|a| a.score))
            .collect();
        Progress {
            completed: scores.len(),
            total: self.state.exercises.len(),
            total_score: scores.iter().map(|&s| u32::from(s)).sum(),
            max_score: self.state.exercises.len() as u32 * u32::from(MAX_SCORE),
        }
    }

    fn answer_mut(&mut self, exercise_id: &str) -> Result<&mut Answer, SessionError> {
        self.state
            .answers
            .get_mut(exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))
    }

    /// Write the answer map with `answer` replaced, then apply it.
    fn commit(&mut self, answer: Answer) -> Result<(), SessionError> {
        let mut answers = self.state.answers.clone();
        answers.insert(answer.exercise_id.clone(), answer);
        let json =
            serde_json::to_string(&answers).map_err(|e| SessionError::Store(e.to_string()))?;
        self.store.set(ANSWERS_KEY, &json).map_err(store_err)?;
        self.state.answers = answers;
        Ok(())
    }
}

fn store_err(e: anyhow::Error) -> SessionError {
    SessionError::Store(format!("{e:#}"))
}

/// Why a non-draft answer cannot change.
fn locked(answer: &Answer) -> SessionError {
    match answer.score {
        Some(score) if score >= REVISE_BELOW_SCORE => {
            SessionError::Final(answer.exercise_id.clone())
        }
        _ => SessionError::Locked(answer.exercise_id.clone()),
    }
}

/// Overall progress across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub total_score: u32,
    pub max_score: u32,
}

impl Progress {
    pub fn band(&self) -> ProgressBand {
        match self.total_score {
            0..=7 => ProgressBand::BuildTheBasics,
            8..=11 => ProgressBand::GoodProgress,
            _ => ProgressBand::Excellent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    BuildTheBasics,
    GoodProgress,
    Excellent,
}

impl fmt::Display for ProgressBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressBand::BuildTheBasics => write!(f, "build the basics"),
            ProgressBand::GoodProgress => write!(f, "good progress"),
            ProgressBand::Excellent => write!(f, "excellent"),
        }
    }
}
