// src/transport/mod.rs

//! The socket contract the session loops are written against.
//!
//! A session never talks to a messaging library directly. It obtains a
//! [`MessageSocket`] from a [`Transport`], moves it into its task and is from
//! then on the only code touching it. [`zmq::ZmqTransport`] is the production
//! implementation on top of `rzmq`.

pub mod endpoint;
pub mod zmq;

pub use endpoint::{parse_endpoint, Endpoint};
pub use zmq::{ZmqPoller, ZmqSocket, ZmqTransport};

use crate::error::MockError;
use async_trait::async_trait;
use bytes::Bytes;

/// Creates sockets for one side of a request/reply exchange.
#[async_trait]
pub trait Transport: Send + Sync {
  type Socket: MessageSocket + 'static;

  /// Creates a reply-role socket bound to `endpoint`.
  async fn bind(&self, endpoint: &str) -> Result<Self::Socket, MockError>;

  /// Creates a request-role socket connected to `endpoint`.
  async fn connect(&self, endpoint: &str) -> Result<Self::Socket, MockError>;
}

/// A bound or connected endpoint carrying opaque single-part payloads.
///
/// Implementations are not required to be safe for concurrent use; the
/// `&mut self` receivers make the single-owner rule a compile-time one.
#[async_trait]
pub trait MessageSocket: Send + Sized {
  type Poller: ReadinessPoller<Self> + 'static;

  async fn send(&mut self, payload: Bytes) -> Result<(), MockError>;

  async fn recv(&mut self) -> Result<Bytes, MockError>;

  /// Releases the socket. Called at most once per instance.
  async fn close(&mut self) -> Result<(), MockError>;

  /// Registers interest in inbound readiness.
  fn register_poller(&mut self) -> Result<Self::Poller, MockError>;
}

/// One-shot readiness notification for a [`MessageSocket`].
#[async_trait]
pub trait ReadinessPoller<S: Send>: Send {
  /// Resolves once `socket.recv()` can complete without waiting.
  ///
  /// Each call arms exactly one notification. Dropping the returned future
  /// disarms it.
  async fn poll(&mut self, socket: &mut S) -> Result<(), MockError>;

  /// Releases the poller. Called at most once per instance, before the
  /// socket it watches is closed.
  async fn close(&mut self) -> Result<(), MockError>;
}
