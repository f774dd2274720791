//! Learner-session commands: `draft`, `submit`, `revise`, `select`.
//!
//! Each invocation loads the session from the state file, applies one
//! transition and exits; the file is updated by the session itself.

use std::path::Path;

use anyhow::{Context, Result};

use thinkgrade_core::error::SessionError;
use thinkgrade_core::model::Feedback;
use thinkgrade_core::session::Session;
use thinkgrade_core::store::FileStore;

use crate::client::GatewayClient;

pub fn open(state: &Path) -> Result<Session<FileStore>> {
    Session::load(FileStore::new(state))
        .with_context(|| format!("failed to load session from {}", state.display()))
}

pub fn draft(state: &Path, exercise: &str, text: &str) -> Result<()> {
    let mut session = open(state)?;
    session.update_content(exercise, text)?;
    println!(
        "Saved draft for {exercise} ({} characters)",
        text.trim().chars().count()
    );
    Ok(())
}

pub async fn submit(state: &Path, exercise: &str, gateway: &str, origin: &str) -> Result<()> {
    let mut session = open(state)?;
    let client = GatewayClient::new(gateway, origin)?;

    eprintln!("Submitting {exercise} to {gateway}...");
    match session.submit(exercise, &client).await {
        Ok(feedback) => {
            print_feedback(&feedback);
            if session.can_revise(exercise) {
                println!("\nRevise with: thinkgrade revise --exercise {exercise}");
            }
            Ok(())
        }
        Err(SessionError::Evaluation(message)) => {
            // The draft is editable again and nothing was scored.
            anyhow::bail!("evaluation failed: {message}")
        }
        Err(e) => Err(e.into()),
    }
}

pub fn revise(state: &Path, exercise: &str) -> Result<()> {
    let mut session = open(state)?;
    session.revise(exercise)?;
    println!("{exercise} is editable again; previous feedback kept until the next score.");
    Ok(())
}

pub fn select(state: &Path, index: usize) -> Result<()> {
    let mut session = open(state)?;
    session.select_exercise(index)?;

    if let Some(exercise) = session.state().current_exercise() {
        println!("Current exercise: {} ({})", exercise.title, exercise.id);
        println!("\n{}\n\n{}", exercise.scenario, exercise.question);
    }
    Ok(())
}

fn print_feedback(feedback: &Feedback) {
    println!("Score: {}/5 ({})", feedback.score, feedback.label());

    let sections = [
        ("Strengths", &feedback.strengths),
        ("Improvements", &feedback.improvements),
        ("Suggestions", &feedback.suggestions),
    ];
    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!("\n{heading}:");
        for (i, item) in items.iter().enumerate() {
            println!("  {}. {item}", i + 1);
        }
    }
}
