// src/session/policy.rs

use crate::config::SessionConfig;
use crate::runtime::ShutdownCoordinator;

use std::time::Duration;
use tokio::time::Instant;

/// Count and delay rules shared by both loops.
#[derive(Debug, Clone)]
pub(crate) struct ExchangePolicy {
  delay: Duration,
  max_messages: u64,
  processed: u64,
}

impl ExchangePolicy {
  pub fn new(config: &SessionConfig) -> Self {
    Self {
      delay: config.delay,
      max_messages: config.max_messages,
      processed: 0,
    }
  }

  pub fn processed(&self) -> u64 {
    self.processed
  }

  /// Counts one completed exchange. Returns `true` when a positive limit has
  /// just been reached.
  pub fn record(&mut self) -> bool {
    self.processed += 1;
    self.max_messages > 0 && self.processed >= self.max_messages
  }

  /// When a reply built at `built_at` may go out.
  pub fn due_from(&self, built_at: Instant) -> Instant {
    built_at + self.delay
  }

  /// Sleeps for the configured delay unless a shutdown request arrives first.
  /// Returns `false` if the pause was cut short.
  pub async fn pause(&self, shutdown: &ShutdownCoordinator) -> bool {
    if self.delay.is_zero() {
      return true;
    }
    tokio::select! {
      biased;
      _ = shutdown.requested() => false,
      _ = tokio::time::sleep(self.delay) => true,
    }
  }
}
