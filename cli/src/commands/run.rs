use anyhow::{Context as AnyhowContext, Result};
use rzmq_mock::{session, SessionConfig, ShutdownCoordinator, ZmqTransport};
use std::time::Duration;

const TERM_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one mock session until it stops on its own or is interrupted.
///
/// The interrupt handler only requests a release; this function returns once
/// the session loop has acknowledged it by closing its socket.
pub async fn serve(config: SessionConfig) -> Result<()> {
  let transport = ZmqTransport::new().context("Failed to create ZeroMQ context")?;
  let shutdown = ShutdownCoordinator::new();

  let interrupt = shutdown.clone();
  ctrlc::set_handler(move || {
    tracing::warn!("Caught signal, going down");
    interrupt.request();
  })
  .context("Failed to install interrupt handler")?;

  let endpoint = config.endpoint.clone();
  let role = config.role;
  let handle = session::start(&transport, config, shutdown.clone())
    .await
    .with_context(|| format!("Failed to start {} session on {}", role, endpoint))?;

  shutdown.released().await;
  let (role, endpoint) = (handle.role(), handle.endpoint().to_string());
  let report = handle.join().await;
  tracing::info!(role = %role, endpoint = %endpoint, processed = report.processed, cause = ?report.cause, "Mock session finished");

  match tokio::time::timeout(TERM_TIMEOUT, transport.term()).await {
    Ok(Ok(())) => {}
    Ok(Err(e)) => tracing::warn!(error = %e, "Error terminating ZeroMQ context"),
    Err(_) => tracing::warn!("Timed out terminating ZeroMQ context"),
  }
  Ok(())
}
