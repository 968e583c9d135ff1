// src/session/request.rs

use crate::config::SessionConfig;
use crate::error::MockError;
use crate::runtime::{ReleaseGuard, ShutdownCoordinator};
use crate::session::policy::ExchangePolicy;
use crate::session::{release, LoopReport, StopCause};
use crate::transport::{MessageSocket, Transport};

use tokio::task::JoinHandle;

/// Client-role loop: send, optional delay, receive, count.
///
/// REQ sockets alternate strictly, so there is no readiness stage. The
/// shutdown signal is checked before every send; the receive itself is not
/// interrupted, which means a peer that never answers holds the release back.
pub(crate) struct RequestLoop<S: MessageSocket> {
  config: SessionConfig,
  socket: S,
  shutdown: ShutdownCoordinator,
  policy: ExchangePolicy,
}

/// Connects and spawns the loop.
pub(crate) async fn start<T: Transport>(
  transport: &T,
  config: SessionConfig,
  shutdown: ShutdownCoordinator,
) -> Result<JoinHandle<LoopReport>, MockError> {
  let socket = transport.connect(&config.endpoint).await?;
  let request_loop = RequestLoop::new(config, socket, shutdown);
  Ok(tokio::spawn(request_loop.run()))
}

impl<S: MessageSocket + 'static> RequestLoop<S> {
  pub fn new(config: SessionConfig, socket: S, shutdown: ShutdownCoordinator) -> Self {
    let policy = ExchangePolicy::new(&config);
    Self {
      config,
      socket,
      shutdown,
      policy,
    }
  }

  pub async fn run(mut self) -> LoopReport {
    let mut guard = ReleaseGuard::new(self.shutdown.clone(), self.config.role, &self.config.endpoint);
    tracing::debug!(endpoint = %self.config.endpoint, "REQ loop running");

    let cause = self.exchange().await;
    let report = LoopReport {
      processed: self.policy.processed(),
      send_failures: 0,
      cause,
    };

    release::<S>(&self.shutdown, None, self.socket, &self.config.endpoint).await;
    guard.waive();
    tracing::info!(processed = report.processed, cause = ?report.cause, "REQ loop stopped");
    report
  }

  async fn exchange(&mut self) -> StopCause {
    loop {
      if self.shutdown.is_requested() {
        return StopCause::ShutdownRequested;
      }

      if let Err(e) = self.socket.send(self.config.payload.clone()).await {
        tracing::error!(endpoint = %self.config.endpoint, error = %e, "Send failed, shutting down");
        self.shutdown.request();
        return StopCause::SendFailed;
      }
      if self.config.verbose {
        tracing::info!(request = %String::from_utf8_lossy(&self.config.payload), "> request");
      }

      if !self.policy.pause(&self.shutdown).await {
        return StopCause::ShutdownRequested;
      }

      match self.socket.recv().await {
        Ok(reply) => {
          if self.config.verbose {
            tracing::info!(reply = %String::from_utf8_lossy(&reply), "< reply");
          }
        }
        Err(e) => {
          tracing::error!(endpoint = %self.config.endpoint, error = %e, "Receive failed, shutting down");
          self.shutdown.request();
          return StopCause::ReceiveFailed;
        }
      }

      if self.policy.record() {
        tracing::info!(processed = self.policy.processed(), "Request limit reached");
        self.shutdown.request();
        return StopCause::LimitReached;
      }
    }
  }
}
