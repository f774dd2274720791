//! The `thinkgrade progress` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::session::open;

pub fn execute(state: &Path) -> Result<()> {
    let session = open(state)?;
    let app = session.state();

    let mut table = Table::new();
    table.set_header(vec!["", "Exercise", "Phase", "Score", "Attempts", "Assessment"]);

    for (index, exercise) in app.exercises.iter().enumerate() {
        let marker = if index == app.current_exercise_index { ">" } else { "" };
        let Some(answer) = app.answers.get(&exercise.id) else {
            continue;
        };
        let score = answer
            .score
            .map(|s| format!("{s}/5"))
            .unwrap_or_else(|| "-".to_string());
        let assessment = answer
            .feedback
            .as_ref()
            .map(|f| f.label().to_string())
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(marker),
            Cell::new(format!("{} ({})", exercise.title, exercise.id)),
            Cell::new(answer.phase),
            Cell::new(score),
            Cell::new(answer.attempts),
            Cell::new(assessment),
        ]);
    }

    println!("{table}");

    let progress = session.progress();
    println!(
        "\nCompleted {}/{} | Total score {}/{} | {}",
        progress.completed,
        progress.total,
        progress.total_score,
        progress.max_score,
        progress.band()
    );
    Ok(())
}
