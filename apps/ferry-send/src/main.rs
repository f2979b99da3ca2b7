//! ferry sender entry point.

mod config;

use ferry_sender::{FileStatus, TransferOutcome, send_files, source_files};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = config::config_path(std::env::args());
    let config = config::Config::load(&path)?;
    let addr = config.receiver_addr()?;
    let options = config.sender_options()?;
    tracing::info!(%addr, source = %config.source_dir.display(), "starting ferry sender");

    let rt = tokio::runtime::Runtime::new()?;
    let reports = rt.block_on(async {
        let files = source_files(&config.source_dir).await?;
        anyhow::Ok(send_files(addr, files, &options).await)
    })?;

    for report in &reports {
        match &report.status {
            FileStatus::Sent(TransferOutcome::Verified { checksum }) => {
                println!("{}: verified ({checksum:08x})", report.path.display());
            }
            FileStatus::Sent(TransferOutcome::Mismatch { local, remote }) => {
                println!(
                    "{}: CHECKSUM MISMATCH (local {local:08x}, remote {remote:016x})",
                    report.path.display()
                );
            }
            FileStatus::Skipped { reason } => {
                println!("{}: skipped ({reason})", report.path.display());
            }
        }
    }
    Ok(())
}
