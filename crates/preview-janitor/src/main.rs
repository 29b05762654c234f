//! Preview janitor service binary.
//!
//! Runs the webhook receiver and the scheduled sweep.

use tracing::info;
use tracing_subscriber::EnvFilter;

use preview_janitor::{JanitorConfig, JanitorService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("preview_janitor=info".parse()?),
        )
        .init();

    info!("preview janitor starting");

    let config = JanitorConfig::load()?;

    info!(
        listen_addr = %config.server.listen_addr,
        repository = %config.github.repository,
        name_prefix = %config.provider.name_prefix,
        sweep_interval_secs = config.sweep.interval_secs,
        "configuration loaded"
    );

    let service = JanitorService::new(config);
    service.run().await?;

    Ok(())
}
