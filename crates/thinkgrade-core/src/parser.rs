//! LLM reply parsing.
//!
//! Turns the model's free-form reply into a typed [`Feedback`]. Nothing is
//! coerced: the reply either has the full expected shape or it is rejected.

use serde_json::{Map, Value};

use crate::error::FeedbackError;
use crate::model::{Feedback, MAX_SCORE};

/// Extract the JSON object substring from raw model output.
///
/// Takes everything from the first `{` through the last `}`, discarding any
/// prose around it.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse raw model output into [`Feedback`].
pub fn parse_feedback(raw: &str) -> Result<Feedback, FeedbackError> {
    let json = extract_json_object(raw).ok_or(FeedbackError::NoJsonObject)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| FeedbackError::Parse(e.to_string()))?;
    feedback_from_value(&value)
}

/// Shape-check an already-parsed JSON value.
///
/// Used by the gateway on model output and by the gateway client on the
/// gateway's own response body.
pub fn feedback_from_value(value: &Value) -> Result<Feedback, FeedbackError> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid("top-level value is not an object"))?;

    Ok(Feedback {
        score: score_field(object)?,
        strengths: string_list(object, "strengths")?,
        improvements: string_list(object, "improvements")?,
        suggestions: string_list(object, "suggestions")?,
    })
}

fn score_field(object: &Map<String, Value>) -> Result<u8, FeedbackError> {
    let raw = object
        .get("score")
        .ok_or_else(|| invalid("missing `score`"))?;
    let number = raw
        .as_f64()
        .ok_or_else(|| invalid("`score` is not a number"))?;

    if number.fract() != 0.0 {
        return Err(invalid(format!("`score` {number} is not an integer")));
    }
    if !(0.0..=f64::from(MAX_SCORE)).contains(&number) {
        return Err(invalid(format!(
            "`score` {number} is outside 0..={MAX_SCORE}"
        )));
    }
    Ok(number as u8)
}

fn string_list(object: &Map<String, Value>, field: &str) -> Result<Vec<String>, FeedbackError> {
    let items = object
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("`{field}` is not an array")))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| invalid(format!("`{field}` contains a non-string element")))
        })
        .collect()
}

fn invalid(detail: impl Into<String>) -> FeedbackError {
    FeedbackError::InvalidStructure(detail.into())
}
