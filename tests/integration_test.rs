//! Integration tests for pagepilot
//!
//! These tests drive the bridge the way the transports do:
//! - pagepilot-core: registry selection and reply correlation
//! - pagepilot-tools: tool dispatch and failure mapping
//! - pagepilot-mcp: JSON-RPC envelopes around it all

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use pagepilot_core::testing::{demo_page, FakeBrowser, FakeReply};
use pagepilot_core::{
    BridgeFrame, Connection, Error, Namespace, RequestCorrelator, SessionRegistry,
    DEFAULT_MAX_INFLIGHT,
};
use pagepilot_mcp::McpServer;
use pagepilot_tools::{Dispatcher, TimeoutBudgets};

fn bridge() -> (Arc<SessionRegistry>, Arc<RequestCorrelator>, McpServer) {
    let registry = Arc::new(SessionRegistry::new());
    let correlator = Arc::new(RequestCorrelator::new());
    let dispatcher = Dispatcher::new(registry.clone(), correlator.clone(), TimeoutBudgets::default());
    (registry, correlator, McpServer::new(Arc::new(dispatcher)))
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> (bool, Value) {
    let request = json!({
        "jsonrpc": "2.0", "id": 1, "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let response = server.handle_value(request).await.expect("tools/call answers");
    let response = serde_json::to_value(response).unwrap();
    let result = &response["result"];
    let text = result["content"][0]["text"].as_str().unwrap();
    (
        result["isError"].as_bool().unwrap(),
        serde_json::from_str(text).unwrap(),
    )
}

/// A browser that tags every page with its own name.
fn named_browser(correlator: Arc<RequestCorrelator>, name: &'static str) -> FakeBrowser {
    FakeBrowser::spawn(correlator, move |method, params| match method {
        "getCurrentPage" => FakeReply::Result(json!({
            "title": name, "url": format!("http://localhost:3000/{}", name), "path": format!("/{}", name)
        })),
        _ => demo_page(method, params),
    })
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_most_recent_browser_wins_then_falls_back() {
    let (registry, correlator, server) = bridge();
    let a = named_browser(correlator.clone(), "a");
    let b = named_browser(correlator.clone(), "b");
    registry.register(a.connection(), None).await;
    registry.register(b.connection(), None).await;

    let (is_error, page) = call_tool(&server, "getCurrentPage", json!({})).await;
    assert!(!is_error);
    assert_eq!(page["title"], "b");
    assert!(a.commands().is_empty());

    b.disconnect();
    registry.remove(b.connection().id()).await;
    let (_, page) = call_tool(&server, "getCurrentPage", json!({})).await;
    assert_eq!(page["title"], "a");

    a.disconnect();
    let (is_error, body) = call_tool(&server, "getCurrentPage", json!({})).await;
    assert!(is_error);
    assert_eq!(body["kind"], "no_client_connected");
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_session_id_targets_its_own_page() {
    let (registry, correlator, server) = bridge();
    let a = named_browser(correlator.clone(), "a");
    let b = named_browser(correlator.clone(), "b");
    registry.register(a.connection(), Some("tab-a".to_string())).await;
    registry.register(b.connection(), None).await;

    let (_, page) = call_tool(&server, "getCurrentPage", json!({"sessionId": "tab-a"})).await;
    assert_eq!(page["title"], "a");

    let raw_id = b.connection().id().to_string();
    let (_, page) = call_tool(&server, "getCurrentPage", json!({"session_id": raw_id})).await;
    assert_eq!(page["title"], "b");

    let (is_error, body) = call_tool(&server, "getCurrentPage", json!({"sessionId": "tab-zz"})).await;
    assert!(is_error);
    assert_eq!(body["sessionId"], "tab-zz");
    assert!(b.commands().len() == 1);
}

#[tokio::test]
async fn test_pick_best_tracks_liveness_over_random_churn() {
    let registry = SessionRegistry::new();
    let mut receivers = Vec::new();
    let conns: Vec<Arc<Connection>> = (0..4)
        .map(|_| {
            let (tx, rx) = mpsc::unbounded_channel();
            receivers.push(rx);
            Connection::new(Namespace::Tools, tx, DEFAULT_MAX_INFLIGHT)
        })
        .collect();

    // id -> registration sequence, for registered connections
    let mut model: HashMap<uuid::Uuid, u64> = HashMap::new();
    let mut dead = vec![false; conns.len()];
    let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;

    for _ in 0..200 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let idx = (seed % conns.len() as u64) as usize;
        let conn = &conns[idx];

        match (seed >> 8) % 3 {
            0 if !dead[idx] => {
                let seq = registry.register(conn.clone(), None).await;
                model.insert(conn.id(), seq);
            }
            1 => {
                registry.remove(conn.id()).await;
                model.remove(&conn.id());
                dead[idx] = true;
            }
            _ => {
                conn.mark_dead();
                dead[idx] = true;
            }
        }

        let expected = conns
            .iter()
            .enumerate()
            .filter(|(i, c)| !dead[*i] && model.contains_key(&c.id()))
            .max_by_key(|(_, c)| model[&c.id()])
            .map(|(_, c)| c.id());

        match registry.pick_best().await {
            Ok(picked) => {
                assert!(picked.is_alive());
                assert_eq!(Some(picked.id()), expected);
            }
            Err(Error::NoClients) => assert_eq!(expected, None),
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
}

// ============================================================================
// Correlation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_click_times_out_and_late_reply_is_dropped() {
    let (registry, correlator, server) = bridge();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = Connection::new(Namespace::Tools, tx, DEFAULT_MAX_INFLIGHT);
    registry.register(conn.clone(), None).await;

    let (is_error, body) = call_tool(&server, "clickElement", json!({"elementName": "submit-btn"})).await;
    assert!(is_error);
    assert_eq!(body["kind"], "timeout");
    assert_eq!(body["elapsedMs"], 10_000);
    assert_eq!(body["tool"], "clickElement");

    let sent = rx.recv().await.unwrap();
    let BridgeFrame::Command { id, method, params } = BridgeFrame::from_text(&sent).unwrap() else {
        panic!("expected a command frame");
    };
    assert_eq!(method, "clickElement");
    assert_eq!(params["elementName"], "submit-btn");

    let delivered = correlator.resolve(conn.id(), &id, Some(json!({"success": true})), None);
    assert!(!delivered);
    assert_eq!(correlator.dropped_replies(), 1);
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_concurrent_calls_never_cross_resolve() {
    let (registry, correlator, server) = bridge();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = Connection::new(Namespace::Tools, tx, DEFAULT_MAX_INFLIGHT);
    registry.register(conn.clone(), None).await;

    let server = Arc::new(server);
    let calls: Vec<_> = ["/first", "/second", "/third"]
        .into_iter()
        .map(|page| {
            let server = server.clone();
            tokio::spawn(async move { call_tool(&server, "navigatePage", json!({"page": page})).await })
        })
        .collect();

    let mut commands = Vec::new();
    for _ in 0..3 {
        let text = rx.recv().await.unwrap();
        let BridgeFrame::Command { id, params, .. } = BridgeFrame::from_text(&text).unwrap() else {
            panic!("expected a command frame");
        };
        commands.push((id, params["page"].as_str().unwrap().to_string()));
    }

    // Answer in reverse order
    for (id, page) in commands.iter().rev() {
        let result = json!({
            "success": true, "targetPage": page,
            "currentUrl": format!("http://localhost:3000{}", page),
            "message": format!("Navigated to {}", page)
        });
        assert!(correlator.resolve(conn.id(), id, Some(result), None));
    }

    for (call, expected) in calls.into_iter().zip(["/first", "/second", "/third"]) {
        let (is_error, body) = call.await.unwrap();
        assert!(!is_error);
        assert_eq!(body["targetPage"], expected);
    }
    assert_eq!(correlator.dropped_replies(), 0);
}

#[tokio::test]
async fn test_every_page_tool_fails_fast_without_browser() {
    let (_, correlator, server) = bridge();
    for (tool, args) in [
        ("getCurrentPage", json!({})),
        ("getElements", json!({"elementType": "input"})),
        ("clickElement", json!({"elementName": "submit-btn"})),
        ("fillInput", json!({"elementName": "user-email", "data": "a@b.c"})),
        ("navigatePage", json!({"page": "/home"})),
    ] {
        let (is_error, body) = call_tool(&server, tool, args).await;
        assert!(is_error, "{} should fail", tool);
        assert_eq!(body["kind"], "no_client_connected");
        assert_eq!(body["tool"], tool);
    }
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_fill_input_legacy_arguments_reach_the_page() {
    let (registry, correlator, server) = bridge();
    let browser = FakeBrowser::demo(correlator);
    registry.register(browser.connection(), None).await;

    let (is_error, body) = call_tool(
        &server,
        "fillInput",
        json!({"inputName": "user-email", "inputType": "email", "value": "a@b.c"}),
    )
    .await;
    assert!(!is_error);
    assert_eq!(body["inputName"], "user-email");

    let commands = browser.commands();
    assert_eq!(commands[0].0, "fillInput");
    assert_eq!(
        commands[0].1,
        json!({"elementName": "user-email", "elementType": "email", "data": "a@b.c"})
    );
}
