//! The `thinkgrade prompt` command.

use anyhow::Result;

use thinkgrade_core::prompt::build_evaluation_prompt;

pub fn execute(exercise: &str, answer: &str) -> Result<()> {
    println!("{}", build_evaluation_prompt(exercise, answer));
    Ok(())
}
