//! The `thinkgrade exercises` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use thinkgrade_core::catalog::{exercises, rubric_for};

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Id", "Title", "Framework"]);

    for (index, exercise) in exercises().iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&exercise.id),
            Cell::new(&exercise.title),
            Cell::new(rubric_for(&exercise.id).framework),
        ]);
    }

    println!("{table}");
    Ok(())
}
