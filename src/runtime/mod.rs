// src/runtime/mod.rs

//! Lifecycle primitives shared by the session loops.

pub(crate) mod release_guard;
pub mod shutdown;

pub(crate) use release_guard::ReleaseGuard;
pub use shutdown::{ShutdownCoordinator, ShutdownPhase};
