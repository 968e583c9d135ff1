use clap::{ArgAction, Parser, ValueEnum};
use rzmq_mock::{Role, SessionConfig};
use std::ffi::OsString;

#[derive(Parser, Debug)]
#[clap(
  name = "rzmq-mock",
  version,
  about = "Mock ZeroMQ endpoint that answers requests (REP) or makes repeated requests (REQ) with static data"
)]
pub struct Cli {
  /// The mock server socket: ipc:///tmp/foo.sock, tcp://1.2.3.4:9999, etc
  #[clap(long)]
  pub socket: String,

  /// The type of socket
  #[clap(long = "type", value_enum, ignore_case = true, default_value_t = SocketKind::Rep)]
  pub socket_type: SocketKind,

  /// The text to return whenever any request is made (REP) or to send as the request (REQ)
  #[clap(long, visible_alias = "response")]
  pub reply: String,

  /// Log all input (REP) or output (REQ)
  #[clap(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true", default_value_t = false)]
  pub verbose: bool,

  /// The number of milliseconds to sleep between messages
  #[clap(long, allow_negative_numbers = true, default_value_t = 0)]
  pub delay: i64,

  /// The number of replies or requests to send (0 = unlimited)
  #[clap(short = 'n', long = "n", allow_negative_numbers = true, default_value_t = 0)]
  pub count: i64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketKind {
  #[value(name = "REP")]
  Rep,
  #[value(name = "REQ")]
  Req,
}

impl From<SocketKind> for Role {
  fn from(kind: SocketKind) -> Self {
    match kind {
      SocketKind::Rep => Role::Rep,
      SocketKind::Req => Role::Req,
    }
  }
}

impl Cli {
  /// Builds the session configuration; negative delay and count are clamped to 0.
  pub fn session_config(&self) -> SessionConfig {
    SessionConfig::new(self.socket.clone(), self.socket_type.into(), self.reply.clone())
      .with_verbose(self.verbose)
      .with_delay_millis(self.delay)
      .with_max_messages_clamped(self.count)
  }
}

/// Rewrites Go-style single-dash long flags (`-socket`, `-n=3`) to the
/// `--long` form clap expects. Negative numbers and single-letter short
/// flags are left alone, and nothing after a bare `--` is touched.
pub fn normalize_go_flags<I, T>(args: I) -> Vec<OsString>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString>,
{
  let mut normalized = Vec::new();
  let mut passthrough = false;
  for (i, arg) in args.into_iter().map(Into::into).enumerate() {
    if i == 0 || passthrough {
      normalized.push(arg);
      continue;
    }
    let Some(text) = arg.to_str() else {
      normalized.push(arg);
      continue;
    };
    if text == "--" {
      passthrough = true;
      normalized.push(arg);
      continue;
    }
    let mut chars = text.chars();
    let is_go_long = chars.next() == Some('-')
      && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
      && chars.next().is_some();
    if is_go_long {
      normalized.push(OsString::from(format!("-{}", text)));
    } else {
      normalized.push(arg);
    }
  }
  normalized
}
