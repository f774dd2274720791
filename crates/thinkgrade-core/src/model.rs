//! Core data model types for thinkgrade.
//!
//! These are the types that travel between the learner session, the gateway
//! and the LLM reply validator.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum answer length, in characters, after trimming.
pub const MIN_ANSWER_CHARS: usize = 10;

/// Highest score the rubric awards.
pub const MAX_SCORE: u8 = 5;

/// Scores strictly below this may be revised and resubmitted.
pub const REVISE_BELOW_SCORE: u8 = 4;

/// One structured-thinking exercise as presented to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Stable identifier (e.g. "problem-1").
    pub id: String,
    /// Short human-readable title.
    pub title: String,
    /// The situation the learner is placed in.
    pub scenario: String,
    /// What the learner is asked to produce.
    pub question: String,
}

/// Body of `POST /evaluate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(rename = "problemId", default)]
    pub exercise_id: String,
    #[serde(rename = "answer", default)]
    pub answer_text: String,
}

impl EvaluationRequest {
    pub fn new(exercise_id: impl Into<String>, answer_text: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            answer_text: answer_text.into(),
        }
    }

    /// Check the input invariants: an exercise id is present and the trimmed
    /// answer has at least [`MIN_ANSWER_CHARS`] characters.
    ///
    /// The exercise id is not checked against the catalog; unknown ids fall
    /// back to the first rubric.
    pub fn validate(&self) -> Result<(), String> {
        if self.exercise_id.trim().is_empty() {
            return Err("problemId is required".to_string());
        }
        let len = self.answer_text.trim().chars().count();
        if len < MIN_ANSWER_CHARS {
            return Err(format!(
                "answer is too short ({len} characters, minimum {MIN_ANSWER_CHARS}); please describe it in more detail"
            ));
        }
        Ok(())
    }
}

/// Structured scoring result for one submitted answer.
///
/// Only built by [`crate::parser::parse_feedback`] (or deserialized from a
/// trusted store), so `score` is always within `0..=MAX_SCORE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Feedback {
    /// Qualitative label for the score.
    pub fn label(&self) -> ScoreLabel {
        match self.score {
            s if s >= 4 => ScoreLabel::Excellent,
            3 => ScoreLabel::Good,
            2 => ScoreLabel::NeedsImprovement,
            _ => ScoreLabel::ReviewRecommended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLabel {
    Excellent,
    Good,
    NeedsImprovement,
    ReviewRecommended,
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreLabel::Excellent => write!(f, "excellent"),
            ScoreLabel::Good => write!(f, "good"),
            ScoreLabel::NeedsImprovement => write!(f, "needs improvement"),
            ScoreLabel::ReviewRecommended => write!(f, "review recommended"),
        }
    }
}

/// Where an answer is in the draft → evaluating → scored cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPhase {
    #[default]
    Draft,
    Evaluating,
    Scored,
}

impl fmt::Display for AnswerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerPhase::Draft => write!(f, "draft"),
            AnswerPhase::Evaluating => write!(f, "evaluating"),
            AnswerPhase::Scored => write!(f, "scored"),
        }
    }
}

/// The learner's answer to one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub exercise_id: String,
    pub content: String,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub feedback: Option<Feedback>,
    #[serde(default)]
    pub attempts: u32,
    pub last_saved_at: DateTime<Utc>,
    #[serde(default)]
    pub phase: AnswerPhase,
}

impl Answer {
    /// A fresh, empty draft.
    pub fn empty(exercise_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            content: String::new(),
            score: None,
            feedback: None,
            attempts: 0,
            last_saved_at: now,
            phase: AnswerPhase::Draft,
        }
    }
}

/// Everything the learner session owns.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub exercises: Vec<Exercise>,
    pub answers: BTreeMap<String, Answer>,
    pub current_exercise_index: usize,
}

impl AppState {
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.exercises.get(self.current_exercise_index)
    }
}
