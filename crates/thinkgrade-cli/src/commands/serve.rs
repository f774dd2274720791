//! The `thinkgrade serve` command.

use std::path::PathBuf;

use anyhow::Result;

use thinkgrade_gateway::config::load_config_from;

pub async fn execute(config_path: Option<PathBuf>, listen: Option<String>) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(listen) = listen {
        config.listen = listen;
    }
    tracing::debug!(?config, "starting gateway");
    thinkgrade_gateway::serve(config).await
}
