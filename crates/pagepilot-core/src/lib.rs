//! Pagepilot Core - Browser Bridge
//!
//! This crate holds the state shared by every transport:
//! - Connection: one live duplex channel to a browser page
//! - Registry: which connections are reachable and which session ids point at them
//! - Correlator: request/response semantics with deadlines over the event channel
//! - Wire: the JSON frames exchanged with the page
//! - Shutdown: signal handling for the long-running tasks

#![forbid(unsafe_code)]

pub mod connection;
pub mod correlator;
pub mod error;
pub mod registry;
pub mod shutdown;
pub mod wire;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use connection::{Connection, Namespace, DEFAULT_MAX_INFLIGHT};
pub use correlator::RequestCorrelator;
pub use error::{Error, Result};
pub use registry::{ConnectionInfo, SessionRegistry, SessionStatus, DEFAULT_EVICTION_INTERVAL_SECS};
pub use wire::{BridgeFrame, Command, CommandReply, ElementKind, RemoteError};
