//! Best-effort chat notification of evaluation results.
//!
//! Posts a summary to a Chatwork room. Failures are logged and swallowed;
//! the caller never sees them.

use std::time::Duration;

use thiserror::Error;

use thinkgrade_core::catalog::exercise_title;
use thinkgrade_core::model::{Feedback, MAX_SCORE};

use crate::config::NotifierConfig;

/// Characters of the answer included in the message.
pub const PREVIEW_CHARS: usize = 200;

const TIMEOUT_SECS: u64 = 30;

/// Why a notification was not delivered.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("chat API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to send notification: {0}")]
    Transport(String),
}

/// Chatwork webhook client.
#[derive(Debug, Clone)]
pub struct ChatworkNotifier {
    config: NotifierConfig,
    client: reqwest::Client,
}

impl ChatworkNotifier {
    pub fn new(config: NotifierConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }

    /// Send and log the outcome. Never fails.
    pub async fn notify(&self, exercise_id: &str, answer: &str, feedback: &Feedback) {
        match self.send(exercise_id, answer, feedback).await {
            Ok(()) => tracing::info!(exercise_id, "notification sent"),
            Err(e @ NotificationError::NotConfigured(_)) => {
                tracing::warn!(exercise_id, "skipping notification: {e}")
            }
            Err(e) => tracing::error!(exercise_id, "notification failed: {e}"),
        }
    }

    /// Post one message to the configured room.
    pub async fn send(
        &self,
        exercise_id: &str,
        answer: &str,
        feedback: &Feedback,
    ) -> Result<(), NotificationError> {
        let token = configured(&self.config.api_token)
            .ok_or(NotificationError::NotConfigured("CHATWORK_API_TOKEN"))?;
        let room = configured(&self.config.room_id)
            .ok_or(NotificationError::NotConfigured("CHATWORK_ROOM_ID"))?;

        let message = format_message(exercise_id, answer, feedback);
        let url = format!(
            "{}/v2/rooms/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            room
        );

        let response = self
            .client
            .post(url)
            .header("X-ChatWorkToken", token)
            .form(&[("body", message.as_str())])
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// First [`PREVIEW_CHARS`] characters of `answer`, with `...` when cut.
pub fn answer_preview(answer: &str) -> String {
    match answer.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &answer[..cut]),
        None => answer.to_string(),
    }
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the chat message for one result.
pub fn format_message(exercise_id: &str, answer: &str, feedback: &Feedback) -> String {
    format!(
        "[info][title]Structured thinking training - evaluation complete[/title]\n\
         Exercise: {title}\n\
         Score: {score}/{MAX_SCORE}\n\
         \n\
         [Answer]\n\
         {preview}\n\
         \n\
         [Strengths]\n\
         {strengths}\n\
         \n\
         [Improvements]\n\
         {improvements}\n\
         \n\
         [Suggestions]\n\
         {suggestions}[/info]",
        title = exercise_title(exercise_id),
        score = feedback.score,
        preview = answer_preview(answer),
        strengths = numbered(&feedback.strengths),
        improvements = numbered(&feedback.improvements),
        suggestions = numbered(&feedback.suggestions),
    )
}
