// src/runtime/shutdown.rs

use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle of a session's resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
  Running,
  /// Someone asked for the socket to be released; the loop has not finished yet.
  ReleaseRequested,
  /// The loop closed its poller and socket.
  Released,
}

/// Shared shutdown signal with an acknowledgement step.
///
/// Any clone may request a release. Only the loop owning the socket moves the
/// phase to `Released`, after it has closed everything it owns. Waiters block
/// on [`ShutdownCoordinator::released`] instead of touching resources
/// themselves.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
  phase: Arc<watch::Sender<ShutdownPhase>>,
}

impl ShutdownCoordinator {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(ShutdownPhase::Running);
    Self { phase: Arc::new(tx) }
  }

  pub fn phase(&self) -> ShutdownPhase {
    *self.phase.borrow()
  }

  /// Requests a release. Returns `true` only for the call that moved the
  /// phase out of `Running`; later calls are no-ops.
  ///
  /// Synchronous so it can be called from a signal handler thread.
  pub fn request(&self) -> bool {
    let initiated = self.phase.send_if_modified(|phase| {
      if *phase == ShutdownPhase::Running {
        *phase = ShutdownPhase::ReleaseRequested;
        true
      } else {
        false
      }
    });
    if initiated {
      tracing::debug!("Shutdown requested");
    }
    initiated
  }

  /// Non-blocking check used at loop iteration boundaries.
  pub fn is_requested(&self) -> bool {
    self.phase() != ShutdownPhase::Running
  }

  pub fn is_released(&self) -> bool {
    self.phase() == ShutdownPhase::Released
  }

  /// Resolves once a release has been requested (or already happened).
  pub async fn requested(&self) {
    self.wait_for(|phase| phase != ShutdownPhase::Running).await
  }

  /// Resolves once the owning loop has released its resources.
  pub async fn released(&self) {
    self.wait_for(|phase| phase == ShutdownPhase::Released).await
  }

  /// Requests a release and waits for the acknowledgement.
  pub async fn shutdown(&self) {
    self.request();
    self.released().await
  }

  /// Marks the release as complete. Returns `false` if it already was.
  ///
  /// Reserved for the loop's release sequence; a request is implied, so the
  /// phase never skips `ReleaseRequested`.
  pub(crate) fn mark_released(&self) -> bool {
    self.request();
    let marked = self.phase.send_if_modified(|phase| {
      if *phase == ShutdownPhase::ReleaseRequested {
        *phase = ShutdownPhase::Released;
        true
      } else {
        false
      }
    });
    if marked {
      tracing::debug!("Resources released");
    }
    marked
  }

  async fn wait_for(&self, done: impl Fn(ShutdownPhase) -> bool) {
    let mut rx = self.phase.subscribe();
    // The sender lives as long as `self`, so the channel cannot close here.
    let _ = rx.wait_for(|phase| done(*phase)).await;
  }
}

impl Default for ShutdownCoordinator {
  fn default() -> Self {
    Self::new()
  }
}
