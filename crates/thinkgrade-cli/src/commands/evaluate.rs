//! The `thinkgrade evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use thinkgrade_core::engine::EvaluationEngine;
use thinkgrade_core::model::EvaluationRequest;
use thinkgrade_gateway::config::load_config_from;
use thinkgrade_providers::create_provider;

pub async fn execute(exercise: &str, answer: &str, config_path: Option<PathBuf>) -> Result<()> {
    let request = EvaluationRequest::new(exercise, answer);
    request.validate().map_err(anyhow::Error::msg)?;

    let config = load_config_from(config_path.as_deref())?;
    let provider = create_provider(&config.llm.provider)?;
    let engine = EvaluationEngine::new(provider, config.llm.engine_config());

    eprintln!(
        "Evaluating {exercise} with {}/{}...",
        engine.provider_name(),
        engine.config().model
    );
    let feedback = engine
        .evaluate(&request)
        .await
        .context("evaluation failed")?;

    println!("{}", serde_json::to_string_pretty(&feedback)?);
    eprintln!("Score {}/5 ({})", feedback.score, feedback.label());
    Ok(())
}
