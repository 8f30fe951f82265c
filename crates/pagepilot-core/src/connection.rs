//! Live browser connections
//!
//! A [`Connection`] wraps the outbound half of one persistent browser channel.
//! The socket task owns the inbound half; everything else reaches the browser
//! through this handle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::wire::BridgeFrame;

/// Default number of commands allowed in flight on one connection
pub const DEFAULT_MAX_INFLIGHT: usize = 32;

/// Which browser channel endpoint a connection arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Namespace {
    /// `/ws`: selectable only after an explicit `register` frame
    #[serde(rename = "/")]
    Default,
    /// `/ws/tools`: selectable as soon as it connects
    #[serde(rename = "/tools")]
    Tools,
}

impl Namespace {
    /// Namespace path as reported by the operational endpoints
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "/",
            Self::Tools => "/tools",
        }
    }

    /// Whether connections on this namespace register on connect
    #[must_use]
    pub fn auto_registers(&self) -> bool {
        matches!(self, Self::Tools)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open duplex channel to a browser.
pub struct Connection {
    id: Uuid,
    namespace: Namespace,
    tx: mpsc::UnboundedSender<String>,
    alive: AtomicBool,
    created_at: DateTime<Utc>,
    /// Registration sequence number, 0 until registered
    seq: AtomicU64,
    closed: CancellationToken,
    inflight: Arc<Semaphore>,
    max_inflight: usize,
}

impl Connection {
    /// Create a connection with a fresh id.
    #[must_use]
    pub fn new(
        namespace: Namespace,
        tx: mpsc::UnboundedSender<String>,
        max_inflight: usize,
    ) -> Arc<Self> {
        Self::with_id(Uuid::new_v4(), namespace, tx, max_inflight)
    }

    /// Create a connection with a transport-assigned id.
    #[must_use]
    pub fn with_id(
        id: Uuid,
        namespace: Namespace,
        tx: mpsc::UnboundedSender<String>,
        max_inflight: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            namespace,
            tx,
            alive: AtomicBool::new(true),
            created_at: Utc::now(),
            seq: AtomicU64::new(0),
            closed: CancellationToken::new(),
            inflight: Arc::new(Semaphore::new(max_inflight.max(1))),
            max_inflight: max_inflight.max(1),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Registration sequence number (higher is more recent)
    pub fn seq(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    pub(crate) fn set_seq(&self, seq: u64) {
        self.seq.store(seq, Ordering::Release);
    }

    /// Live means: not marked dead and the socket task still drains the channel.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.tx.is_closed() && !self.closed.is_cancelled()
    }

    /// Mark the connection dead. Idempotent; wakes every command waiting on it.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
        self.closed.cancel();
    }

    /// Resolves once the connection has been marked dead.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }

    pub(crate) fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Commands currently holding an in-flight permit
    pub fn inflight(&self) -> usize {
        self.max_inflight
            .saturating_sub(self.inflight.available_permits())
    }

    pub(crate) async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        self.inflight
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::ConnectionClosed(self.id))
    }

    /// Queue a raw text frame for the socket task.
    pub fn send_text(&self, text: String) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(Error::ConnectionClosed(self.id));
        }
        self.tx.send(text).map_err(|_| Error::ConnectionClosed(self.id))
    }

    /// Serialize and queue a frame.
    pub fn send_frame(&self, frame: &BridgeFrame) -> Result<()> {
        self.send_text(frame.to_text()?)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("alive", &self.is_alive())
            .field("seq", &self.seq())
            .finish()
    }
}
