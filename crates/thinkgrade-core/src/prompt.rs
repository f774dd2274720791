//! Evaluation prompt rendering.

use std::fmt::Write as _;

use crate::catalog::rubric_for;

/// Reply shape the model is asked to produce. Kept in sync with
/// [`crate::parser::parse_feedback`].
const OUTPUT_SHAPE: &str = r#"{
  "score": <integer from 0 to 5>,
  "strengths": ["strength 1", "strength 2"],
  "improvements": ["improvement 1", "improvement 2"],
  "suggestions": ["concrete suggestion 1", "concrete suggestion 2"]
}"#;

const SCORING_GUIDE: [(&str, &str); 5] = [
    ("0-1", "not structured; the framework is not understood"),
    ("2", "a basic structure exists, but logic or depth is lacking"),
    ("3", "the framework is applied appropriately and logically"),
    ("4", "excellent structure and deep analysis"),
    ("5", "a model example of structured thinking"),
];

/// Build the instruction text sent to the LLM for one answer.
///
/// Total over its inputs: an unknown exercise id is graded against the
/// first rubric.
pub fn build_evaluation_prompt(exercise_id: &str, answer_text: &str) -> String {
    let rubric = rubric_for(exercise_id);
    let mut prompt = String::new();

    prompt.push_str(
        "You are an expert in structured thinking for home-care medicine. \
         Evaluate the following answer.\n\n",
    );
    let _ = writeln!(prompt, "Scenario: {}", rubric.scenario);
    let _ = writeln!(prompt, "Framework: {}", rubric.framework);

    prompt.push_str("\nEvaluation criteria:\n");
    for (i, criterion) in rubric.criteria.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, criterion);
    }

    prompt.push_str("\nLearner's answer:\n");
    prompt.push_str(answer_text);
    prompt.push_str("\n\nReturn your evaluation in the following JSON format:\n");
    prompt.push_str(OUTPUT_SHAPE);

    prompt.push_str("\n\nScoring guide:\n");
    for (points, anchor) in SCORING_GUIDE {
        let _ = writeln!(prompt, "- {points} points: {anchor}");
    }

    prompt.push_str("\nReturn only the JSON object.");
    prompt
}
