//! Scripted fake browser for tests.
//!
//! A [`FakeBrowser`] owns a real [`Connection`] and a task that plays the page
//! side of the wire protocol: it reads every command frame, asks a responder
//! closure what to answer, and feeds the reply back through the correlator
//! exactly like the socket task does.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connection::{Connection, Namespace, DEFAULT_MAX_INFLIGHT};
use crate::correlator::RequestCorrelator;
use crate::wire::{BridgeFrame, RemoteError};

/// What the fake page answers to one command.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Reply frame with a result
    Result(Value),
    /// Reply frame with an error
    Error(String),
    /// Never answer
    Silent,
}

/// Scripted browser endpoint.
pub struct FakeBrowser {
    connection: Arc<Connection>,
    received: Arc<Mutex<Vec<(String, Value)>>>,
    task: JoinHandle<()>,
}

impl FakeBrowser {
    /// Spawn a fake browser answering through `responder`.
    pub fn spawn<F>(correlator: Arc<RequestCorrelator>, responder: F) -> Self
    where
        F: Fn(&str, &Value) -> FakeReply + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let connection = Connection::new(Namespace::Tools, tx, DEFAULT_MAX_INFLIGHT);
        let received = Arc::new(Mutex::new(Vec::new()));

        let conn_id = connection.id();
        let log = Arc::clone(&received);
        let task = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                let Ok(BridgeFrame::Command { id, method, params }) = BridgeFrame::from_text(&text)
                else {
                    continue;
                };
                if let Ok(mut log) = log.lock() {
                    log.push((method.clone(), params.clone()));
                }
                match responder(&method, &params) {
                    FakeReply::Result(value) => {
                        correlator.resolve(conn_id, &id, Some(value), None);
                    }
                    FakeReply::Error(message) => {
                        correlator.resolve(conn_id, &id, None, Some(RemoteError::new(message)));
                    }
                    FakeReply::Silent => {}
                }
            }
        });

        Self {
            connection,
            received,
            task,
        }
    }

    /// Fake browser serving [`demo_page`].
    pub fn demo(correlator: Arc<RequestCorrelator>) -> Self {
        Self::spawn(correlator, demo_page)
    }

    /// Fake browser that never answers.
    pub fn silent(correlator: Arc<RequestCorrelator>) -> Self {
        Self::spawn(correlator, |_, _| FakeReply::Silent)
    }

    pub fn connection(&self) -> Arc<Connection> {
        Arc::clone(&self.connection)
    }

    /// Every command received so far as `(method, params)`
    pub fn commands(&self) -> Vec<(String, Value)> {
        self.received
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Simulate the page going away.
    pub fn disconnect(&self) {
        self.task.abort();
        self.connection.mark_dead();
    }
}

impl Drop for FakeBrowser {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Canned answers of a small login page.
pub fn demo_page(method: &str, params: &Value) -> FakeReply {
    let page = json!({"title": "Login", "url": "http://localhost:3000/login", "path": "/login"});
    match method {
        "getCurrentPage" => FakeReply::Result(page),
        "getElements" => {
            let clickable = json!({
                "name": "submit-btn", "selector": "[data-mcp-name=\"submit-btn\"]",
                "text": "Sign in", "type": "button", "visible": true, "elementType": "clickable"
            });
            let input = json!({
                "name": "user-email", "selector": "[data-mcp-name=\"user-email\"]",
                "type": "email", "visible": true, "elementType": "input"
            });
            let kind = params["elementType"].as_str().unwrap_or("clickable");
            let elements = match kind {
                "input" => vec![input],
                "all" => vec![clickable, input],
                _ => vec![clickable],
            };
            FakeReply::Result(json!({"elements": elements, "elementType": kind}))
        }
        "clickElement" => {
            let name = params["elementName"].as_str().unwrap_or_default();
            if name == "submit-btn" {
                FakeReply::Result(json!({
                    "success": true, "elementName": name,
                    "message": "Clicked submit-btn", "currentPage": page
                }))
            } else {
                FakeReply::Error(format!("Element not found: {}", name))
            }
        }
        "fillInput" => FakeReply::Result(json!({
            "success": true,
            "inputName": params["elementName"],
            "message": format!("Filled {}", params["elementName"].as_str().unwrap_or_default())
        })),
        "navigatePage" => {
            let target = params["page"].as_str().unwrap_or("/");
            FakeReply::Result(json!({
                "success": true, "targetPage": target,
                "currentUrl": format!("http://localhost:3000{}", target),
                "message": format!("Navigated to {}", target)
            }))
        }
        _ => FakeReply::Error(format!("Unknown command: {}", method)),
    }
}
