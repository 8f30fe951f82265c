//! Request Correlator
//!
//! Turns the event-based browser channel into request/response calls. Each
//! command gets a fresh `req-<uuid>` correlation id and a pending entry; the
//! socket task hands every reply frame to [`RequestCorrelator::resolve`].
//!
//! Whoever removes a pending entry owns its outcome: the reply path, the
//! deadline path and the connection-closed path all race on the same removal,
//! so every request ends exactly once.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::wire::{Command, CommandReply, RemoteError};

type ReplySender = oneshot::Sender<std::result::Result<Value, RemoteError>>;

struct PendingRequest {
    conn_id: Uuid,
    method: &'static str,
    tx: ReplySender,
    closed: CancellationToken,
    sent_at: Instant,
}

/// Removes the pending entry if the caller stops waiting.
struct PendingGuard<'a> {
    pending: &'a DashMap<String, PendingRequest>,
    id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.id);
    }
}

/// Correlates outbound commands with inbound reply frames.
#[derive(Default)]
pub struct RequestCorrelator {
    pending: DashMap<String, PendingRequest>,
    dropped_replies: AtomicU64,
}

impl RequestCorrelator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a command to a connection and wait for its reply.
    ///
    /// Waiting for an in-flight permit counts against `timeout`. The outcome is
    /// exactly one of: the decoded reply, [`Error::Remote`], [`Error::Timeout`]
    /// or [`Error::ConnectionClosed`].
    pub async fn send(
        &self,
        conn: &Arc<Connection>,
        command: &Command,
        timeout: Duration,
    ) -> Result<CommandReply> {
        let started = Instant::now();
        let deadline = started + timeout;
        let conn_id = conn.id();
        let method = command.method();
        let timed_out = || Error::Timeout {
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        let _permit = tokio::select! {
            permit = conn.acquire_permit() => permit?,
            _ = tokio::time::sleep_until(deadline) => {
                warn!(conn_id = %conn_id, method, "Timed out waiting for an in-flight slot");
                return Err(timed_out());
            }
            _ = conn.closed() => return Err(Error::ConnectionClosed(conn_id)),
        };

        let id = format!("req-{}", Uuid::new_v4());
        let text = command.to_frame(id.clone())?.to_text()?;

        let (tx, mut rx) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingRequest {
                conn_id,
                method,
                tx,
                closed: conn.closed_token(),
                sent_at: started,
            },
        );
        let _guard = PendingGuard {
            pending: &self.pending,
            id: &id,
        };

        conn.send_text(text)?;
        debug!(request_id = %id, conn_id = %conn_id, method, "Command sent");

        let outcome = tokio::select! {
            reply = &mut rx => reply,
            _ = tokio::time::sleep_until(deadline) => {
                if self.pending.remove(&id).is_some() {
                    let err = timed_out();
                    warn!(request_id = %id, conn_id = %conn_id, method, error = %err, "Command timed out");
                    return Err(err);
                }
                // the reply path already claimed the entry
                rx.await
            }
            _ = conn.closed() => {
                if self.pending.remove(&id).is_some() {
                    warn!(request_id = %id, conn_id = %conn_id, method, "Connection closed mid-flight");
                    return Err(Error::ConnectionClosed(conn_id));
                }
                rx.await
            }
        };

        match outcome {
            Ok(Ok(value)) => command.decode_reply(value),
            Ok(Err(remote)) => Err(Error::Remote(remote.to_string())),
            Err(_) => Err(Error::ConnectionClosed(conn_id)),
        }
    }

    /// Hand a reply frame received on `conn_id` to its waiting command.
    ///
    /// Replies with an unknown or already settled id, or arriving on a
    /// connection other than the one the command went out on, are dropped and
    /// counted. Returns whether the reply was delivered.
    pub fn resolve(
        &self,
        conn_id: Uuid,
        id: &str,
        result: Option<Value>,
        error: Option<RemoteError>,
    ) -> bool {
        let claimed = self.pending.remove_if(id, |_, pending| {
            pending.conn_id == conn_id && !pending.closed.is_cancelled()
        });

        let Some((_, pending)) = claimed else {
            self.dropped_replies.fetch_add(1, Ordering::Relaxed);
            debug!(request_id = %id, conn_id = %conn_id, "Dropped reply with no matching pending request");
            return false;
        };

        debug!(
            request_id = %id,
            conn_id = %conn_id,
            method = pending.method,
            elapsed_ms = u64::try_from(pending.sent_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Reply received"
        );

        let outcome = match error {
            Some(err) => Err(err),
            None => Ok(result.unwrap_or(Value::Null)),
        };
        if pending.tx.send(outcome).is_err() {
            debug!(request_id = %id, "Caller stopped waiting before the reply arrived");
        }
        true
    }

    /// Replies discarded because nothing was waiting for them
    pub fn dropped_replies(&self) -> u64 {
        self.dropped_replies.load(Ordering::Relaxed)
    }

    /// Commands currently awaiting a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Namespace, DEFAULT_MAX_INFLIGHT};
    use crate::wire::{BridgeFrame, ClickElementParams, PageInfo};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn conn() -> (Arc<Connection>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(Namespace::Tools, tx, DEFAULT_MAX_INFLIGHT), rx)
    }

    fn click(name: &str) -> Command {
        Command::ClickElement(ClickElementParams {
            element_name: name.to_string(),
        })
    }

    async fn next_command_id(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        let text = rx.recv().await.unwrap();
        match BridgeFrame::from_text(&text).unwrap() {
            BridgeFrame::Command { id, .. } => id,
            other => panic!("expected command frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reply_resolves_request() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let task = {
            let correlator = correlator.clone();
            let c = c.clone();
            tokio::spawn(async move {
                correlator
                    .send(&c, &Command::GetCurrentPage, Duration::from_secs(5))
                    .await
            })
        };

        let id = next_command_id(&mut rx).await;
        assert!(id.starts_with("req-"));
        assert!(correlator.resolve(
            c.id(),
            &id,
            Some(json!({"title": "Home", "url": "http://localhost:3000/", "path": "/"})),
            None
        ));

        let reply = task.await.unwrap().unwrap();
        assert_eq!(
            reply,
            CommandReply::Page(PageInfo {
                title: "Home".to_string(),
                url: "http://localhost:3000/".to_string(),
                path: "/".to_string(),
                timestamp: None,
            })
        );
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(correlator.dropped_replies(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_passes_through() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let task = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move { correlator.send(&c, &click("ghost"), Duration::from_secs(10)).await })
        };

        let id = next_command_id(&mut rx).await;
        correlator.resolve(c.id(), &id, None, Some(RemoteError::new("Element not found: ghost")));

        match task.await.unwrap() {
            Err(Error::Remote(message)) => assert_eq!(message, "Element not found: ghost"),
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_timeout_then_late_reply_is_dropped() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let task = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move {
                correlator
                    .send(&c, &click("submit-btn"), Duration::from_millis(10_000))
                    .await
            })
        };

        let id = next_command_id(&mut rx).await;
        match task.await.unwrap() {
            Err(Error::Timeout { elapsed_ms }) => assert!(elapsed_ms >= 10_000),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(correlator.pending_count(), 0);

        let delivered = correlator.resolve(
            c.id(),
            &id,
            Some(json!({"success": true, "elementName": "submit-btn", "message": "late"})),
            None,
        );
        assert!(!delivered);
        assert_eq!(correlator.dropped_replies(), 1);
    }

    #[tokio::test]
    async fn test_reply_before_deadline_wins_once() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let task = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move { correlator.send(&c, &click("ok"), Duration::from_secs(10)).await })
        };

        let id = next_command_id(&mut rx).await;
        let body = json!({"success": true, "elementName": "ok", "message": "Clicked"});
        assert!(correlator.resolve(c.id(), &id, Some(body.clone()), None));
        assert!(!correlator.resolve(c.id(), &id, Some(body), None));

        assert!(task.await.unwrap().is_ok());
        assert_eq!(correlator.dropped_replies(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_then_deadline_settles_once() {
        let correlator = RequestCorrelator::new();
        let (c, mut rx) = conn();

        let command = click("ok");
        let mut send = tokio_test::task::spawn(correlator.send(&c, &command, Duration::from_secs(10)));
        tokio_test::assert_pending!(send.poll());
        let id = next_command_id(&mut rx).await;

        let body = json!({"success": true, "elementName": "ok", "message": "Clicked"});
        assert!(correlator.resolve(c.id(), &id, Some(body), None));
        // The deadline passes before the caller observes the reply.
        tokio::time::advance(Duration::from_secs(11)).await;

        let reply = tokio_test::assert_ready_ok!(send.poll());
        assert!(matches!(reply, CommandReply::Click(_)));
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(correlator.dropped_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_then_close_settles_once() {
        let correlator = RequestCorrelator::new();
        let (c, mut rx) = conn();

        let command = click("ok");
        let mut send = tokio_test::task::spawn(correlator.send(&c, &command, Duration::from_secs(10)));
        tokio_test::assert_pending!(send.poll());
        let id = next_command_id(&mut rx).await;

        let body = json!({"success": true, "elementName": "ok", "message": "Clicked"});
        assert!(correlator.resolve(c.id(), &id, Some(body), None));
        c.mark_dead();
        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(tokio_test::assert_ready!(send.poll()).is_ok());
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(correlator.dropped_replies(), 0);
    }

    #[tokio::test]
    async fn test_reply_from_other_connection_is_ignored() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();
        let (other, _rx_other) = conn();

        let task = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move { correlator.send(&c, &Command::GetCurrentPage, Duration::from_secs(5)).await })
        };

        let id = next_command_id(&mut rx).await;
        let page = json!({"title": "T", "url": "u", "path": "/"});
        assert!(!correlator.resolve(other.id(), &id, Some(page.clone()), None));
        assert_eq!(correlator.pending_count(), 1);

        assert!(correlator.resolve(c.id(), &id, Some(page), None));
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_commands_never_cross_resolve() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let mut tasks = Vec::new();
        for name in ["first", "second", "third"] {
            let (correlator, c) = (correlator.clone(), c.clone());
            tasks.push(tokio::spawn(async move {
                correlator.send(&c, &click(name), Duration::from_secs(10)).await
            }));
        }

        let mut frames = Vec::new();
        for _ in 0..3 {
            let text = rx.recv().await.unwrap();
            if let BridgeFrame::Command { id, params, .. } = BridgeFrame::from_text(&text).unwrap() {
                frames.push((id, params["elementName"].as_str().unwrap().to_string()));
            }
        }
        // answer in reverse order
        for (id, name) in frames.iter().rev() {
            correlator.resolve(
                c.id(),
                id,
                Some(json!({"success": true, "elementName": name, "message": "Clicked"})),
                None,
            );
        }

        for (task, expected) in tasks.into_iter().zip(["first", "second", "third"]) {
            match task.await.unwrap().unwrap() {
                CommandReply::Click(result) => assert_eq!(result.element_name, expected),
                other => panic!("expected click reply, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_connection_closed_mid_flight() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let task = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move { correlator.send(&c, &Command::GetCurrentPage, Duration::from_secs(5)).await })
        };

        let id = next_command_id(&mut rx).await;
        c.mark_dead();

        assert!(matches!(task.await.unwrap(), Err(Error::ConnectionClosed(_))));
        assert!(!correlator.resolve(c.id(), &id, Some(json!({})), None));
        assert_eq!(correlator.dropped_replies(), 1);
    }

    #[tokio::test]
    async fn test_dropped_caller_cleans_up_pending() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (c, mut rx) = conn();

        let task = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move { correlator.send(&c, &Command::GetCurrentPage, Duration::from_secs(60)).await })
        };
        let _id = next_command_id(&mut rx).await;
        assert_eq!(correlator.pending_count(), 1);

        task.abort();
        let _ = task.await;
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_send_on_closed_connection_fails_fast() {
        let correlator = RequestCorrelator::new();
        let (c, rx) = conn();
        drop(rx);

        let result = correlator.send(&c, &Command::GetCurrentPage, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::ConnectionClosed(_))));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backpressure_wait_counts_against_deadline() {
        let correlator = Arc::new(RequestCorrelator::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let c = Connection::new(Namespace::Tools, tx, 1);

        let first = {
            let (correlator, c) = (correlator.clone(), c.clone());
            tokio::spawn(async move { correlator.send(&c, &Command::GetCurrentPage, Duration::from_secs(60)).await })
        };
        let _first_id = next_command_id(&mut rx).await;
        assert_eq!(c.inflight(), 1);

        let second = correlator
            .send(&c, &Command::GetCurrentPage, Duration::from_millis(5_000))
            .await;
        assert!(matches!(second, Err(Error::Timeout { .. })));
        // the queued command never reached the wire
        assert!(rx.try_recv().is_err());

        first.abort();
    }

    #[tokio::test]
    async fn test_send_parks_until_its_reply_arrives() {
        let correlator = RequestCorrelator::new();
        let (c, mut rx) = conn();

        let mut send = tokio_test::task::spawn(correlator.send(
            &c,
            &Command::GetCurrentPage,
            Duration::from_secs(5),
        ));
        tokio_test::assert_pending!(send.poll());

        let text = rx.try_recv().unwrap();
        let BridgeFrame::Command { id, .. } = BridgeFrame::from_text(&text).unwrap() else {
            panic!("expected command frame");
        };
        assert_eq!(correlator.pending_count(), 1);

        let page = json!({"title": "Home", "url": "http://localhost:3000/", "path": "/"});
        assert!(correlator.resolve(c.id(), &id, Some(page), None));
        assert!(send.is_woken());
        let reply = tokio_test::assert_ready_ok!(send.poll());
        assert!(matches!(reply, CommandReply::Page(_)));
    }
}
