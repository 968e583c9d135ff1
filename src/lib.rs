// src/lib.rs

//! rzmq_mock - A mock ZeroMQ REP/REQ endpoint built on rzmq.
//!
//! A session either answers every request with a fixed payload (REP) or
//! keeps sending a fixed request and waiting for the reply (REQ). It is meant
//! for exercising real peers in tests and load probes.
//!
//! ```ignore
//! use rzmq_mock::{session, Role, SessionConfig, ShutdownCoordinator, ZmqTransport};
//!
//! let transport = ZmqTransport::new()?;
//! let shutdown = ShutdownCoordinator::new();
//! let config = SessionConfig::new("tcp://127.0.0.1:5555", Role::Rep, "pong").with_max_messages(10);
//! let handle = session::start(&transport, config, shutdown.clone()).await?;
//! shutdown.released().await;
//! let report = handle.join().await;
//! ```

/// Session parameters and role selection.
pub mod config;
/// Defines the error type used throughout the crate.
pub mod error;
/// Shutdown coordination shared by the loops and their owners.
pub mod runtime;
/// Session startup plus the REP and REQ loops.
pub mod session;
/// The socket contract and its rzmq implementation.
pub mod transport;

pub use config::{Role, SessionConfig};
pub use error::MockError;
pub use runtime::{ShutdownCoordinator, ShutdownPhase};
pub use session::{LoopReport, SessionHandle, StopCause};
pub use transport::{MessageSocket, ReadinessPoller, Transport, ZmqTransport};

