//! HTTP server command.

use std::sync::Arc;
use storybooker::{AppState, JobRegistry, Services, StorybookerConfig, serve};
use tracing::info;

/// Serve the job API until interrupted.
pub async fn run_server(config: &StorybookerConfig, addr: Option<String>) -> anyhow::Result<()> {
    let services = Services::from_config(config, |key| std::env::var(key).ok())?;
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    info!(
        addr = %addr,
        characters = %config.paths.characters_dir.display(),
        output = %config.paths.output_dir.display(),
        "Starting server"
    );

    let state = AppState::new(JobRegistry::new(Arc::new(services)));
    tokio::select! {
        result = serve(&addr, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}
