// src/session/reply.rs

use crate::config::SessionConfig;
use crate::error::MockError;
use crate::runtime::{ReleaseGuard, ShutdownCoordinator};
use crate::session::policy::ExchangePolicy;
use crate::session::{release, LoopReport, StopCause};
use crate::transport::{MessageSocket, ReadinessPoller, Transport};

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// A built reply waiting for its delay to elapse.
#[derive(Debug)]
struct PendingReply {
  payload: Bytes,
  due: Instant,
}

/// Server-role loop.
///
/// Three stages, each holding at most one item: a received request, a built
/// reply waiting out the delay, and the send itself. Readiness is re-armed as
/// soon as the received slot is empty, so a request that arrives while a
/// reply is still delayed is picked up without waiting for the send.
pub(crate) struct ReplyLoop<S: MessageSocket> {
  config: SessionConfig,
  socket: S,
  poller: S::Poller,
  shutdown: ShutdownCoordinator,
  policy: ExchangePolicy,
  received: Option<Bytes>,
  pending: Option<PendingReply>,
  send_failures: u64,
}

/// Binds, registers readiness and spawns the loop.
pub(crate) async fn start<T: Transport>(
  transport: &T,
  config: SessionConfig,
  shutdown: ShutdownCoordinator,
) -> Result<JoinHandle<LoopReport>, MockError> {
  let mut socket = transport.bind(&config.endpoint).await?;
  let poller = match socket.register_poller() {
    Ok(poller) => poller,
    Err(e) => {
      if let Err(close_err) = socket.close().await {
        tracing::warn!(endpoint = %config.endpoint, error = %close_err, "Error closing socket after failed setup");
      }
      return Err(e);
    }
  };

  let reply_loop = ReplyLoop::new(config, socket, poller, shutdown);
  Ok(tokio::spawn(reply_loop.run()))
}

impl<S: MessageSocket + 'static> ReplyLoop<S> {
  pub fn new(config: SessionConfig, socket: S, poller: S::Poller, shutdown: ShutdownCoordinator) -> Self {
    let policy = ExchangePolicy::new(&config);
    Self {
      config,
      socket,
      poller,
      shutdown,
      policy,
      received: None,
      pending: None,
      send_failures: 0,
    }
  }

  pub async fn run(mut self) -> LoopReport {
    let mut guard = ReleaseGuard::new(self.shutdown.clone(), self.config.role, &self.config.endpoint);
    tracing::debug!(endpoint = %self.config.endpoint, "REP loop running");

    let cause = self.serve().await;
    if self.pending.is_some() || self.received.is_some() {
      tracing::debug!(endpoint = %self.config.endpoint, cause = ?cause, "Dropping unanswered request");
    }
    let report = LoopReport {
      processed: self.policy.processed(),
      send_failures: self.send_failures,
      cause,
    };

    release(&self.shutdown, Some(self.poller), self.socket, &self.config.endpoint).await;
    guard.waive();
    tracing::info!(processed = report.processed, cause = ?report.cause, "REP loop stopped");
    report
  }

  async fn serve(&mut self) -> StopCause {
    loop {
      // Once a release is requested nothing new is read, but a request that
      // is already off the wire is still answered, without waiting out the
      // delay.
      let stopping = self.shutdown.is_requested();
      if stopping && self.received.is_none() && self.pending.is_none() {
        return StopCause::ShutdownRequested;
      }
      self.build_reply();

      let due = self
        .pending
        .as_ref()
        .map(|reply| if stopping { Instant::now() } else { reply.due });
      let reply_due = sleep_until(due.unwrap_or_else(Instant::now));

      tokio::select! {
        biased;

        _ = self.shutdown.requested(), if !stopping => {}

        _ = reply_due, if due.is_some() => {
          if let Some(cause) = self.send_reply().await {
            return cause;
          }
        }

        polled = self.poller.poll(&mut self.socket), if !stopping && self.received.is_none() => {
          if let Some(cause) = self.receive(polled).await {
            return cause;
          }
        }
      }
    }
  }

  /// Readiness fired: take the request off the socket.
  async fn receive(&mut self, polled: Result<(), MockError>) -> Option<StopCause> {
    let received = match polled {
      Ok(()) => self.socket.recv().await,
      Err(e) => Err(e),
    };
    match received {
      Ok(request) => {
        self.received = Some(request);
        None
      }
      Err(e) => {
        tracing::error!(endpoint = %self.config.endpoint, error = %e, "Receive failed, shutting down");
        self.shutdown.request();
        Some(StopCause::ReceiveFailed)
      }
    }
  }

  /// Moves the received request into the reply slot once that slot is free.
  fn build_reply(&mut self) {
    if self.pending.is_some() {
      return;
    }
    let Some(request) = self.received.take() else {
      return;
    };
    if self.config.verbose {
      tracing::info!(request = %String::from_utf8_lossy(&request), "< request");
    }
    // The reply never depends on the request.
    self.pending = Some(PendingReply {
      payload: self.config.payload.clone(),
      due: self.policy.due_from(Instant::now()),
    });
  }

  async fn send_reply(&mut self) -> Option<StopCause> {
    let reply = self.pending.take()?;
    match self.socket.send(reply.payload).await {
      Ok(()) => {
        if self.config.verbose {
          tracing::info!(reply = %String::from_utf8_lossy(&self.config.payload), "> reply");
        }
        if self.policy.record() {
          tracing::info!(processed = self.policy.processed(), "Reply limit reached");
          self.shutdown.request();
          return Some(StopCause::LimitReached);
        }
      }
      Err(e) => {
        // One lost reply does not stop the server.
        self.send_failures += 1;
        tracing::warn!(endpoint = %self.config.endpoint, error = %e, "Failed to send reply");
      }
    }
    None
  }
}
