// src/config.rs

use crate::error::MockError;
use crate::transport::endpoint::parse_endpoint;

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which side of the request/reply exchange this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
  /// Binds and answers every request with the fixed payload.
  #[default]
  Rep,
  /// Connects and repeatedly sends the fixed payload, awaiting each reply.
  Req,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Rep => "REP",
      Role::Req => "REQ",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = MockError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "REP" => Ok(Role::Rep),
      "REQ" => Ok(Role::Req),
      other => Err(MockError::InvalidConfig(format!(
        "unsupported socket type '{}' (only REP and REQ are supported)",
        other
      ))),
    }
  }
}

/// Immutable parameters of one mock session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
  pub endpoint: String,
  pub role: Role,
  /// Sent verbatim as every reply (REP) or every request (REQ).
  pub payload: Bytes,
  pub verbose: bool,
  pub delay: Duration,
  /// Number of exchanges before the session stops itself. 0 = unlimited.
  pub max_messages: u64,
}

impl SessionConfig {
  pub fn new(endpoint: impl Into<String>, role: Role, payload: impl Into<Bytes>) -> Self {
    Self {
      endpoint: endpoint.into(),
      role,
      payload: payload.into(),
      verbose: false,
      delay: Duration::ZERO,
      max_messages: 0,
    }
  }

  pub fn with_verbose(mut self, verbose: bool) -> Self {
    self.verbose = verbose;
    self
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  /// Delay given in signed milliseconds; negative values mean no delay.
  pub fn with_delay_millis(self, millis: i64) -> Self {
    self.with_delay(Duration::from_millis(millis.max(0) as u64))
  }

  pub fn with_max_messages(mut self, max_messages: u64) -> Self {
    self.max_messages = max_messages;
    self
  }

  /// Signed message limit; negative values are clamped to 0 (unlimited).
  pub fn with_max_messages_clamped(self, max_messages: i64) -> Self {
    self.with_max_messages(max_messages.max(0) as u64)
  }

  /// Checks everything that can be checked before a socket is touched.
  pub fn validate(&self) -> Result<(), MockError> {
    if self.endpoint.is_empty() {
      return Err(MockError::InvalidConfig("you must specify a socket".into()));
    }
    if self.payload.is_empty() {
      return Err(MockError::InvalidConfig("you must specify reply text".into()));
    }
    parse_endpoint(&self.endpoint)?;
    Ok(())
  }

  /// True once `processed` exchanges satisfy a positive limit.
  pub fn limit_reached(&self, processed: u64) -> bool {
    self.max_messages > 0 && processed >= self.max_messages
  }
}
