//! Runs the receiver until Ctrl-C.

use std::sync::Arc;

use ferry_receiver::{ReceiverConfig, ReceiverServer, TracingSink};

/// Serves until shutdown is requested, then drains in-flight sessions.
pub async fn run(config: ReceiverConfig) -> anyhow::Result<()> {
    let server = ReceiverServer::new(config, Arc::new(TracingSink));
    let listener = server.listen().await?;

    let server_run = Arc::clone(&server);
    let mut serve = tokio::spawn(async move { server_run.serve(listener).await });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutdown requested");
            server.shutdown();
            serve.await??;
        }
        result = &mut serve => {
            result??;
        }
    }

    let metrics = server.admission().metrics();
    tracing::info!(
        admitted = metrics.admitted,
        rejected = metrics.rejected,
        "admission totals"
    );
    Ok(())
}
