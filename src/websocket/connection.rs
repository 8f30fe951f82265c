use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pagepilot_core::{BridgeFrame, Connection, Namespace};

use crate::server::AppState;

/// Drive one browser socket until it closes, goes silent or the server stops.
pub async fn handle_browser(socket: WebSocket, namespace: Namespace, state: AppState) {
    let (tx, mut outbound) = mpsc::unbounded_channel::<String>();
    let conn = Connection::new(namespace, tx, state.channel.max_inflight);
    let conn_id = conn.id();
    info!(conn_id = %conn_id, namespace = %namespace, "Browser connected");

    if namespace.auto_registers() {
        state.registry.register(conn.clone(), None).await;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut ping_interval = tokio::time::interval(state.channel.ping_interval);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ping_interval.tick().await;

    let mut last_recv = tokio::time::Instant::now();
    let heartbeat_timeout = state.channel.heartbeat_timeout;

    loop {
        tokio::select! {
            // Page message
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_recv = tokio::time::Instant::now();
                        if let Some(frame) = handle_frame(&text, &conn, &state).await {
                            match frame.to_text() {
                                Ok(json) => {
                                    if ws_tx.send(Message::Text(json)).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!(conn_id = %conn_id, error = %e, "Failed to encode frame"),
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_recv = tokio::time::Instant::now();
                        let _ = ws_tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_recv = tokio::time::Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "Browser WS error");
                        break;
                    }
                    _ => {}
                }
            }
            // Commands queued by the correlator
            queued = outbound.recv() => {
                let Some(json) = queued else { break };
                if ws_tx.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            // Heartbeat (WS protocol level)
            _ = ping_interval.tick() => {
                if last_recv.elapsed() > heartbeat_timeout {
                    info!(conn_id = %conn_id, "Heartbeat timeout, closing");
                    break;
                }
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            _ = conn.closed() => {
                debug!(conn_id = %conn_id, "Connection marked dead");
                break;
            }
            _ = state.shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    conn.mark_dead();
    state.registry.remove(conn_id).await;
    info!(conn_id = %conn_id, namespace = %namespace, "Browser disconnected");
}

/// Handle one inbound text frame; returns the frame to answer with, if any.
pub(crate) async fn handle_frame(
    text: &str,
    conn: &Arc<Connection>,
    state: &AppState,
) -> Option<BridgeFrame> {
    let conn_id = conn.id();
    let frame = match BridgeFrame::from_text(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(conn_id = %conn_id, error = %e, "Ignoring malformed frame");
            return None;
        }
    };

    match frame {
        BridgeFrame::Reply { id, result, error } => {
            if !state.correlator.resolve(conn_id, &id, result, error) {
                debug!(conn_id = %conn_id, request_id = %id, "Late or unknown reply");
            }
            None
        }
        BridgeFrame::Register { session_id, client } => {
            if let Some(client) = &client {
                debug!(
                    conn_id = %conn_id,
                    client = %client.name,
                    user_agent = client.user_agent.as_deref().unwrap_or("-"),
                    "Register frame"
                );
            }
            match (&session_id, conn.namespace().auto_registers()) {
                // Already selectable: only the binding is new.
                (Some(sid), true) => {
                    if let Err(e) = state.registry.bind_session(conn_id, sid.clone()).await {
                        warn!(conn_id = %conn_id, session_id = %sid, error = %e, "Session bind failed");
                        return None;
                    }
                }
                _ => {
                    state
                        .registry
                        .register(conn.clone(), session_id.clone())
                        .await;
                }
            }
            Some(BridgeFrame::Registered {
                connection_id: conn_id,
                session_id,
            })
        }
        BridgeFrame::Ping => Some(BridgeFrame::Pong),
        BridgeFrame::Pong => None,
        other => {
            debug!(conn_id = %conn_id, frame = ?other, "Ignoring unexpected frame");
            None
        }
    }
}
