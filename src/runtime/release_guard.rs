// src/runtime/release_guard.rs

use crate::config::Role;
use crate::runtime::ShutdownCoordinator;

/// Lives inside a loop task and makes sure `Released` is eventually published.
///
/// A loop that ends normally runs its release sequence and then calls
/// [`ReleaseGuard::waive`]. If the task is aborted or panics instead, the
/// guard publishes `Released` on drop so the process-level waiter is not left
/// blocked forever. The socket itself is dropped by the unwinding task.
pub(crate) struct ReleaseGuard {
  shutdown: ShutdownCoordinator,
  role: Role,
  endpoint: String,
  stopped_normally: bool,
}

impl ReleaseGuard {
  pub fn new(shutdown: ShutdownCoordinator, role: Role, endpoint: &str) -> Self {
    Self {
      shutdown,
      role,
      endpoint: endpoint.to_string(),
      stopped_normally: false,
    }
  }

  pub fn waive(&mut self) {
    self.stopped_normally = true;
  }
}

impl Drop for ReleaseGuard {
  fn drop(&mut self) {
    if self.stopped_normally {
      return;
    }
    tracing::error!(
      role = %self.role,
      endpoint = %self.endpoint,
      "Session loop stopped abnormally (cancelled or panicked), forcing release"
    );
    self.shutdown.mark_released();
  }
}
