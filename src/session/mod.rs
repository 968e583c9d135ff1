// src/session/mod.rs

//! Session startup and the two role loops.

mod policy;
mod reply;
mod request;

use crate::config::{Role, SessionConfig};
use crate::error::MockError;
use crate::runtime::ShutdownCoordinator;
use crate::transport::{MessageSocket, ReadinessPoller, Transport};

use tokio::task::JoinHandle;

/// Why a loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
  /// The configured message limit was reached.
  LimitReached,
  /// A release was requested from outside the loop.
  ShutdownRequested,
  ReceiveFailed,
  /// Only fatal in the REQ role.
  SendFailed,
  /// The loop task panicked or was aborted.
  Aborted,
}

/// Summary returned by a finished loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopReport {
  /// Completed exchanges (replies sent or replies received).
  pub processed: u64,
  /// REP sends that failed and were skipped.
  pub send_failures: u64,
  pub cause: StopCause,
}

/// Handle to a running session loop.
#[derive(Debug)]
pub struct SessionHandle {
  role: Role,
  endpoint: String,
  shutdown: ShutdownCoordinator,
  task: JoinHandle<LoopReport>,
}

impl SessionHandle {
  pub fn role(&self) -> Role {
    self.role
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub fn is_finished(&self) -> bool {
    self.task.is_finished()
  }

  /// Requests a release and waits until the loop has closed its resources.
  pub async fn shutdown(self) -> LoopReport {
    self.shutdown.request();
    self.join().await
  }

  /// Waits for the loop to stop on its own (limit reached, fatal error, or a
  /// release requested elsewhere).
  pub async fn join(self) -> LoopReport {
    match self.task.await {
      Ok(report) => report,
      Err(e) => {
        tracing::error!(role = %self.role, endpoint = %self.endpoint, error = %e, "Session task failed");
        LoopReport {
          processed: 0,
          send_failures: 0,
          cause: StopCause::Aborted,
        }
      }
    }
  }
}

/// Validates `config`, sets up the socket for its role and spawns the loop.
///
/// Setup failures are returned here and no task is spawned. The caller keeps
/// a clone of `shutdown` to request a release or wait for one.
pub async fn start<T: Transport>(
  transport: &T,
  config: SessionConfig,
  shutdown: ShutdownCoordinator,
) -> Result<SessionHandle, MockError> {
  config.validate()?;
  let role = config.role;
  let endpoint = config.endpoint.clone();

  let task = match role {
    Role::Rep => reply::start(transport, config, shutdown.clone()).await?,
    Role::Req => request::start(transport, config, shutdown.clone()).await?,
  };
  tracing::info!(role = %role, endpoint = %endpoint, "Mock session started");

  Ok(SessionHandle {
    role,
    endpoint,
    shutdown,
    task,
  })
}

/// Closes the poller, then the socket, then publishes `Released`.
///
/// Ownership of both resources is taken, so each is closed exactly once.
pub(crate) async fn release<S: MessageSocket>(
  shutdown: &ShutdownCoordinator,
  poller: Option<S::Poller>,
  mut socket: S,
  endpoint: &str,
) {
  shutdown.request();
  if let Some(mut poller) = poller {
    if let Err(e) = poller.close().await {
      tracing::warn!(endpoint = %endpoint, error = %e, "Error closing poller");
    }
  }
  if let Err(e) = socket.close().await {
    tracing::warn!(endpoint = %endpoint, error = %e, "Error closing socket");
  }
  shutdown.mark_released();
  tracing::info!(endpoint = %endpoint, "Socket released");
}
