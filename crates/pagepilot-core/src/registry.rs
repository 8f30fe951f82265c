//! Session Registry
//!
//! Tracks which browser connections are reachable and which caller-visible
//! session ids point at them. One lock owns both tables, so stale eviction and
//! best-connection selection never interleave.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::connection::{Connection, Namespace};
use crate::error::{Error, Result};

/// Default interval of the background eviction sweep
pub const DEFAULT_EVICTION_INTERVAL_SECS: u64 = 30;

#[derive(Default)]
struct Tables {
    connections: HashMap<Uuid, Arc<Connection>>,
    sessions: HashMap<String, Uuid>,
    next_seq: u64,
}

impl Tables {
    fn evict_stale(&mut self) -> Vec<Uuid> {
        let stale: Vec<Uuid> = self
            .connections
            .iter()
            .filter(|(_, conn)| !conn.is_alive())
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(conn) = self.connections.remove(id) {
                conn.mark_dead();
            }
        }
        let connections = &self.connections;
        self.sessions.retain(|_, id| connections.contains_key(id));
        stale
    }

    fn best(&self) -> Option<Arc<Connection>> {
        self.connections
            .values()
            .filter(|conn| conn.is_alive())
            .max_by_key(|conn| conn.seq())
            .cloned()
    }

    fn sessions_for(&self, conn_id: Uuid) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, id)| **id == conn_id)
            .map(|(session, _)| session.clone())
            .collect();
        ids.sort();
        ids
    }
}

/// Point-in-time view of one registered connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub connection_id: Uuid,
    pub namespace: Namespace,
    pub alive: bool,
    pub sequence: u64,
    pub session_ids: Vec<String>,
    pub connected_at: DateTime<Utc>,
}

/// Status of one session id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<Uuid>,
}

/// Registry of live browser connections and their session bindings.
#[derive(Default)]
pub struct SessionRegistry {
    tables: Mutex<Tables>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live connection and optionally bind a session id to it.
    ///
    /// Registering an already known connection bumps its recency. A session id
    /// already bound elsewhere is moved to this connection. Returns the new
    /// registration sequence number.
    pub async fn register(&self, conn: Arc<Connection>, session_id: Option<String>) -> u64 {
        let mut tables = self.tables.lock().await;
        tables.next_seq += 1;
        let seq = tables.next_seq;
        conn.set_seq(seq);

        let conn_id = conn.id();
        tables.connections.insert(conn_id, conn);
        if let Some(session_id) = session_id {
            if let Some(previous) = tables.sessions.insert(session_id.clone(), conn_id) {
                if previous != conn_id {
                    debug!(session_id = %session_id, from = %previous, to = %conn_id, "Session rebound");
                }
            }
            info!(conn_id = %conn_id, session_id = %session_id, seq, "Browser registered");
        } else {
            info!(conn_id = %conn_id, seq, "Browser registered");
        }
        seq
    }

    /// Bind a session id to an already registered connection.
    pub async fn bind_session(&self, conn_id: Uuid, session_id: impl Into<String>) -> Result<()> {
        let session_id = session_id.into();
        let mut tables = self.tables.lock().await;
        match tables.connections.get(&conn_id) {
            Some(conn) if conn.is_alive() => {
                tables.sessions.insert(session_id.clone(), conn_id);
                debug!(conn_id = %conn_id, session_id = %session_id, "Session bound");
                Ok(())
            }
            _ => Err(Error::ConnectionClosed(conn_id)),
        }
    }

    /// Resolve a target connection.
    ///
    /// With an id, only the connection bound to that session (or carrying that
    /// raw connection id) is returned, and only while it is live. Without an id
    /// the most recently registered live connection is picked.
    pub async fn resolve(&self, session_id: Option<&str>) -> Result<Arc<Connection>> {
        let Some(session_id) = session_id else {
            return self.pick_best().await;
        };

        let tables = self.tables.lock().await;
        let bound = tables
            .sessions
            .get(session_id)
            .copied()
            .or_else(|| Uuid::parse_str(session_id).ok())
            .and_then(|id| tables.connections.get(&id))
            .filter(|conn| conn.is_alive());

        bound
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Evict stale entries, then return the most recently registered live connection.
    pub async fn pick_best(&self) -> Result<Arc<Connection>> {
        let mut tables = self.tables.lock().await;
        let evicted = tables.evict_stale();
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "Evicted stale connections before pick");
        }
        tables.best().ok_or(Error::NoClients)
    }

    /// Remove every dead connection and every binding pointing at one.
    pub async fn evict_stale(&self) -> usize {
        let evicted = self.tables.lock().await.evict_stale();
        for id in &evicted {
            info!(conn_id = %id, "Evicted stale connection");
        }
        evicted.len()
    }

    /// Remove a connection on disconnect. Idempotent.
    pub async fn remove(&self, conn_id: Uuid) -> Option<Arc<Connection>> {
        let mut tables = self.tables.lock().await;
        let removed = tables.connections.remove(&conn_id);
        tables.sessions.retain(|_, id| *id != conn_id);
        drop(tables);

        if let Some(conn) = &removed {
            conn.mark_dead();
            info!(conn_id = %conn_id, "Browser unregistered");
        }
        removed
    }

    /// Snapshot of every registered connection, most recent first.
    pub async fn snapshot(&self) -> Vec<ConnectionInfo> {
        let tables = self.tables.lock().await;
        let mut infos: Vec<ConnectionInfo> = tables
            .connections
            .values()
            .map(|conn| ConnectionInfo {
                connection_id: conn.id(),
                namespace: conn.namespace(),
                alive: conn.is_alive(),
                sequence: conn.seq(),
                session_ids: tables.sessions_for(conn.id()),
                connected_at: conn.created_at(),
            })
            .collect();
        infos.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        infos
    }

    /// Whether a session id currently reaches a live connection.
    pub async fn session_status(&self, session_id: &str) -> SessionStatus {
        let connection_id = self.resolve(Some(session_id)).await.ok().map(|c| c.id());
        SessionStatus {
            session_id: session_id.to_string(),
            connected: connection_id.is_some(),
            connection_id,
        }
    }

    /// Ids of live connections, most recent first
    pub async fn live_ids(&self) -> Vec<Uuid> {
        self.snapshot()
            .await
            .into_iter()
            .filter(|info| info.alive)
            .map(|info| info.connection_id)
            .collect()
    }

    /// Number of registered connections, stale ones included until evicted
    pub async fn len(&self) -> usize {
        self.tables.lock().await.connections.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Spawn the periodic eviction sweep. Stops when `cancel` fires.
    pub fn spawn_eviction(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.evict_stale().await;
                        if evicted > 0 {
                            debug!(evicted, "Eviction sweep");
                        }
                    }
                }
            }
            debug!("Eviction task stopped");
        })
    }
}
