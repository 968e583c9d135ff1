// tests/common.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use bytes::Bytes;
use rzmq_mock::{MessageSocket, MockError, ReadinessPoller, Transport};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::net::TcpListener;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tokio::time::timeout;

static TRACING_INIT: Once = Once::new();

pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "rzmq_mock=debug,info";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_test_writer()
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

/// A free loopback TCP endpoint for tests that need real sockets.
pub fn free_tcp_endpoint() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port");
  let port = listener.local_addr().expect("No local addr").port();
  format!("tcp://127.0.0.1:{}", port)
}

/// Something the in-memory socket did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
  Received(Bytes),
  Sent(Bytes),
  PollerClosed,
  SocketClosed,
}

#[derive(Debug, Default)]
pub struct WireLog {
  events: Mutex<Vec<WireEvent>>,
}

impl WireLog {
  fn push(&self, event: WireEvent) {
    self.events.lock().unwrap().push(event);
  }

  pub fn events(&self) -> Vec<WireEvent> {
    self.events.lock().unwrap().clone()
  }

  pub fn count(&self, event: &WireEvent) -> usize {
    self.events.lock().unwrap().iter().filter(|e| *e == event).count()
  }

  pub fn sent(&self) -> Vec<Bytes> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        WireEvent::Sent(b) => Some(b),
        _ => None,
      })
      .collect()
  }
}

/// Failure injection for [`MemoryTransport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
  pub fail_bind: bool,
  pub fail_connect: bool,
  pub fail_poller: bool,
  /// Number of initial sends that fail.
  pub fail_sends: usize,
}

/// Transport whose single socket is wired to a [`Peer`] held by the test.
pub struct MemoryTransport {
  wire: Mutex<Option<(async_channel::Receiver<Bytes>, async_channel::Sender<Bytes>)>>,
  faults: Faults,
  pub log: Arc<WireLog>,
}

/// The test's end of the wire.
pub struct Peer {
  to_mock: async_channel::Sender<Bytes>,
  from_mock: async_channel::Receiver<Bytes>,
}

impl MemoryTransport {
  pub fn pair() -> (Self, Peer) {
    Self::with_faults(Faults::default())
  }

  pub fn with_faults(faults: Faults) -> (Self, Peer) {
    let (to_mock, mock_inbox) = async_channel::unbounded();
    let (mock_outbox, from_mock) = async_channel::unbounded();
    let transport = Self {
      wire: Mutex::new(Some((mock_inbox, mock_outbox))),
      faults,
      log: Arc::new(WireLog::default()),
    };
    (transport, Peer { to_mock, from_mock })
  }

  fn take_socket(&self) -> Result<MemorySocket, MockError> {
    let (inbox, outbox) = self
      .wire
      .lock()
      .unwrap()
      .take()
      .ok_or_else(|| MockError::Transport("wire already in use".into()))?;
    Ok(MemorySocket {
      inbox,
      outbox,
      staged: None,
      fail_sends: self.faults.fail_sends,
      fail_poller: self.faults.fail_poller,
      log: self.log.clone(),
    })
  }
}

#[async_trait]
impl Transport for MemoryTransport {
  type Socket = MemorySocket;

  async fn bind(&self, endpoint: &str) -> Result<MemorySocket, MockError> {
    if self.faults.fail_bind {
      return Err(MockError::bind_failed(endpoint, MockError::Transport("address in use".into())));
    }
    self.take_socket()
  }

  async fn connect(&self, endpoint: &str) -> Result<MemorySocket, MockError> {
    if self.faults.fail_connect {
      return Err(MockError::connect_failed(endpoint, MockError::Transport("refused".into())));
    }
    self.take_socket()
  }
}

pub struct MemorySocket {
  inbox: async_channel::Receiver<Bytes>,
  outbox: async_channel::Sender<Bytes>,
  staged: Option<Bytes>,
  fail_sends: usize,
  fail_poller: bool,
  log: Arc<WireLog>,
}

#[async_trait]
impl MessageSocket for MemorySocket {
  type Poller = MemoryPoller;

  async fn send(&mut self, payload: Bytes) -> Result<(), MockError> {
    if self.fail_sends > 0 {
      self.fail_sends -= 1;
      return Err(MockError::Transport("injected send failure".into()));
    }
    self
      .outbox
      .send(payload.clone())
      .await
      .map_err(|_| MockError::Transport("peer gone".into()))?;
    self.log.push(WireEvent::Sent(payload));
    Ok(())
  }

  async fn recv(&mut self) -> Result<Bytes, MockError> {
    let payload = match self.staged.take() {
      Some(payload) => payload,
      None => self
        .inbox
        .recv()
        .await
        .map_err(|_| MockError::Transport("peer gone".into()))?,
    };
    self.log.push(WireEvent::Received(payload.clone()));
    Ok(payload)
  }

  async fn close(&mut self) -> Result<(), MockError> {
    self.inbox.close();
    self.outbox.close();
    self.log.push(WireEvent::SocketClosed);
    Ok(())
  }

  fn register_poller(&mut self) -> Result<MemoryPoller, MockError> {
    if self.fail_poller {
      return Err(MockError::PollerRegistration("injected failure".into()));
    }
    Ok(MemoryPoller { log: self.log.clone() })
  }
}

pub struct MemoryPoller {
  log: Arc<WireLog>,
}

#[async_trait]
impl ReadinessPoller<MemorySocket> for MemoryPoller {
  async fn poll(&mut self, socket: &mut MemorySocket) -> Result<(), MockError> {
    if socket.staged.is_none() {
      let payload = socket
        .inbox
        .recv()
        .await
        .map_err(|_| MockError::Transport("peer gone".into()))?;
      socket.staged = Some(payload);
    }
    Ok(())
  }

  async fn close(&mut self) -> Result<(), MockError> {
    self.log.push(WireEvent::PollerClosed);
    Ok(())
  }
}

impl Peer {
  /// Puts a message on the wire towards the mock. Fails once the mock has
  /// released its socket.
  pub async fn send(&self, payload: &'static [u8]) -> Result<(), MockError> {
    self
      .to_mock
      .send(Bytes::from_static(payload))
      .await
      .map_err(|_| MockError::Closed("wire"))
  }

  pub async fn recv_timeout(&self, duration: Duration) -> Result<Bytes, MockError> {
    match timeout(duration, self.from_mock.recv()).await {
      Ok(Ok(payload)) => Ok(payload),
      Ok(Err(_)) => Err(MockError::Closed("wire")),
      Err(_) => Err(MockError::Transport("timed out".into())),
    }
  }

  /// Drops the peer's ends so the mock sees its wire go away.
  pub fn disconnect(self) {
    self.to_mock.close();
    self.from_mock.close();
  }
}
