//! The `thinkgrade init` command.

use std::path::Path;

use anyhow::{Context, Result};

use thinkgrade_gateway::config::{CONFIG_FILE_NAME, STARTER_CONFIG};

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
        return Ok(());
    }

    std::fs::write(CONFIG_FILE_NAME, STARTER_CONFIG)
        .with_context(|| format!("failed to write {CONFIG_FILE_NAME}"))?;
    println!("Created {CONFIG_FILE_NAME}");

    println!("\nNext steps:");
    println!("  1. Set allowed_origin and export ANTHROPIC_API_KEY");
    println!("  2. Run: thinkgrade serve");
    println!("  3. Practice: thinkgrade draft --exercise problem-1 --text \"...\"");
    println!("             thinkgrade submit --exercise problem-1");

    Ok(())
}
