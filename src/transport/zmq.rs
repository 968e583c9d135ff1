// src/transport/zmq.rs

use crate::config::Role;
use crate::error::MockError;
use crate::transport::{MessageSocket, ReadinessPoller, Transport};

use async_trait::async_trait;
use bytes::Bytes;
use rzmq::{Context, Msg, Socket, SocketType};

/// [`Transport`] backed by an `rzmq` context.
#[derive(Clone)]
pub struct ZmqTransport {
  context: Context,
}

impl ZmqTransport {
  pub fn new() -> Result<Self, MockError> {
    Ok(Self::with_context(Context::new()?))
  }

  /// Shares an existing context, e.g. so `inproc://` peers can reach each other.
  pub fn with_context(context: Context) -> Self {
    Self { context }
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Terminates the underlying context. Only call once every socket created
  /// from this transport has been closed.
  pub async fn term(&self) -> Result<(), MockError> {
    self.context.clone().term().await?;
    Ok(())
  }
}

#[async_trait]
impl Transport for ZmqTransport {
  type Socket = ZmqSocket;

  async fn bind(&self, endpoint: &str) -> Result<ZmqSocket, MockError> {
    let socket = self
      .context
      .socket(SocketType::Rep)
      .map_err(|e| MockError::bind_failed(endpoint, e))?;
    if let Err(e) = socket.bind(endpoint).await {
      let _ = socket.close().await;
      return Err(MockError::bind_failed(endpoint, e));
    }
    tracing::debug!(endpoint = %endpoint, "REP socket bound");
    Ok(ZmqSocket::new(socket, Role::Rep))
  }

  async fn connect(&self, endpoint: &str) -> Result<ZmqSocket, MockError> {
    let socket = self
      .context
      .socket(SocketType::Req)
      .map_err(|e| MockError::connect_failed(endpoint, e))?;
    if let Err(e) = socket.connect(endpoint).await {
      let _ = socket.close().await;
      return Err(MockError::connect_failed(endpoint, e));
    }
    tracing::debug!(endpoint = %endpoint, "REQ socket connected");
    Ok(ZmqSocket::new(socket, Role::Req))
  }
}

/// An `rzmq` socket plus the one-message staging slot readiness is built on.
///
/// `rzmq` has no poll primitive; its `recv()` completes exactly when a message
/// is available. Readiness is therefore reported by receiving into `staged`,
/// and a later `recv()` hands the staged payload out without waiting.
pub struct ZmqSocket {
  socket: Socket,
  role: Role,
  staged: Option<Bytes>,
  // REP only: a request has been taken off the wire and not yet answered.
  reply_owed: bool,
  poller_registered: bool,
  closed: bool,
}

impl ZmqSocket {
  fn new(socket: Socket, role: Role) -> Self {
    Self {
      socket,
      role,
      staged: None,
      reply_owed: false,
      poller_registered: false,
      closed: false,
    }
  }

  /// Waits until a message sits in the staging slot.
  ///
  /// A REP socket that still owes a reply never becomes readable, the same
  /// way libzmq withholds POLLIN from it.
  async fn stage_inbound(&mut self) -> Result<(), MockError> {
    if self.closed {
      return Err(MockError::Closed("socket"));
    }
    if self.staged.is_some() {
      return Ok(());
    }
    if self.role == Role::Rep && self.reply_owed {
      futures::future::pending::<()>().await;
    }

    // The whole logical message is read in one call; REP and REQ sockets
    // refuse a second recv() before the next send(). Only the first frame is
    // kept.
    let frames = self.socket.recv_multipart().await?;
    let payload = frames
      .first()
      .and_then(|frame| frame.data())
      .map(Bytes::copy_from_slice)
      .unwrap_or_default();
    if frames.len() > 1 {
      tracing::trace!(frames = frames.len(), "Discarding trailing message frames");
    }

    if self.role == Role::Rep {
      self.reply_owed = true;
    }
    self.staged = Some(payload);
    Ok(())
  }
}

#[async_trait]
impl MessageSocket for ZmqSocket {
  type Poller = ZmqPoller;

  async fn send(&mut self, payload: Bytes) -> Result<(), MockError> {
    if self.closed {
      return Err(MockError::Closed("socket"));
    }
    // Whatever the outcome, the owed reply is spent; a failed reply must not
    // wedge readiness for the next request.
    self.reply_owed = false;
    self.socket.send(Msg::from_vec(payload.to_vec())).await?;
    Ok(())
  }

  async fn recv(&mut self) -> Result<Bytes, MockError> {
    self.stage_inbound().await?;
    self.staged.take().ok_or(MockError::InvalidState("no staged message after readiness"))
  }

  async fn close(&mut self) -> Result<(), MockError> {
    if self.closed {
      return Err(MockError::Closed("socket"));
    }
    self.closed = true;
    self.staged = None;
    self.socket.close().await?;
    Ok(())
  }

  fn register_poller(&mut self) -> Result<ZmqPoller, MockError> {
    if self.closed {
      return Err(MockError::PollerRegistration("socket is closed".into()));
    }
    if self.poller_registered {
      return Err(MockError::PollerRegistration("socket already has a poller".into()));
    }
    self.poller_registered = true;
    Ok(ZmqPoller { closed: false })
  }
}

/// Readiness poller for a [`ZmqSocket`].
#[derive(Debug)]
pub struct ZmqPoller {
  closed: bool,
}

#[async_trait]
impl ReadinessPoller<ZmqSocket> for ZmqPoller {
  async fn poll(&mut self, socket: &mut ZmqSocket) -> Result<(), MockError> {
    if self.closed {
      return Err(MockError::Closed("poller"));
    }
    socket.stage_inbound().await
  }

  async fn close(&mut self) -> Result<(), MockError> {
    if self.closed {
      return Err(MockError::Closed("poller"));
    }
    self.closed = true;
    Ok(())
  }
}
