// src/error.rs

use rzmq::ZmqError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum MockError {
  // --- Configuration Errors ---
  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),
  #[error("Invalid endpoint format: {0}")]
  InvalidEndpoint(String),

  // --- Setup Errors ---
  #[error("Failed to bind {endpoint}: {source}")]
  Bind {
    endpoint: String,
    #[source]
    source: Box<MockError>,
  },
  #[error("Failed to connect to {endpoint}: {source}")]
  Connect {
    endpoint: String,
    #[source]
    source: Box<MockError>,
  },
  #[error("Failed to register readiness poller: {0}")]
  PollerRegistration(String),

  // --- Runtime Errors ---
  #[error("Operation on closed {0}")]
  Closed(&'static str), // Socket or poller used after release
  #[error("Operation is invalid for the current socket state: {0}")]
  InvalidState(&'static str),
  #[error("Transport error: {0}")]
  Transport(String), // Failures from non-rzmq transports

  #[error("ZeroMQ error: {0}")]
  Zmq(#[from] ZmqError),
}

impl MockError {
  /// Wraps a failure raised while binding `endpoint`.
  pub fn bind_failed(endpoint: &str, source: impl Into<MockError>) -> Self {
    MockError::Bind {
      endpoint: endpoint.to_string(),
      source: Box::new(source.into()),
    }
  }

  /// Wraps a failure raised while connecting to `endpoint`.
  pub fn connect_failed(endpoint: &str, source: impl Into<MockError>) -> Self {
    MockError::Connect {
      endpoint: endpoint.to_string(),
      source: Box::new(source.into()),
    }
  }

  /// True for errors that abort session start before any loop runs.
  pub fn is_setup(&self) -> bool {
    matches!(
      self,
      MockError::InvalidConfig(_)
        | MockError::InvalidEndpoint(_)
        | MockError::Bind { .. }
        | MockError::Connect { .. }
        | MockError::PollerRegistration(_)
    )
  }
}
