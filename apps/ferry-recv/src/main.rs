//! ferry receiver entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ferry receiver");

    let path = config::config_path(std::env::args());
    let config = config::Config::load(&path)?.to_receiver_config()?;
    tracing::info!(
        bind = %config.bind_addr,
        sampling_rate = config.sampling_rate.probability(),
        max_requests = config.admission.max_requests(),
        window_secs = config.admission.window().as_secs(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("receiver shut down cleanly");
    Ok(())
}
