//! Shared bridge state handed to every HTTP and WebSocket handler.

use pagepilot_core::{RequestCorrelator, SessionRegistry};
use pagepilot_mcp::McpServer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::config::{AppConfig, BridgeConfig};

/// Browser channel tuning
#[derive(Debug, Clone, Copy)]
pub struct ChannelSettings {
    pub ping_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub max_inflight: usize,
}

impl From<&BridgeConfig> for ChannelSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            heartbeat_timeout: config.heartbeat_timeout(),
            max_inflight: config.max_inflight_per_connection,
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::from(&BridgeConfig::default())
    }
}

/// Everything the transports share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub correlator: Arc<RequestCorrelator>,
    pub mcp: Arc<McpServer>,
    pub channel: ChannelSettings,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the state graph from configuration
    pub fn from_config(config: &AppConfig, shutdown: CancellationToken) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let correlator = Arc::new(RequestCorrelator::new());
        let dispatcher = pagepilot_tools::Dispatcher::new(
            registry.clone(),
            correlator.clone(),
            config.bridge.timeouts.budgets(),
        );
        let mcp = McpServer::new(Arc::new(dispatcher))
            .with_internal_error_detail(config.is_development());

        Self {
            registry,
            correlator,
            mcp: Arc::new(mcp),
            channel: ChannelSettings::from(&config.bridge),
            shutdown,
        }
    }

    /// Tool dispatcher behind every transport
    pub fn dispatcher(&self) -> &pagepilot_tools::Dispatcher {
        self.mcp.dispatcher()
    }
}
