//! Server configuration types
//!
//! Contains all configuration structures for the pagepilot server.

use anyhow::{bail, Result};
use pagepilot_tools::TimeoutBudgets;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl AppConfig {
    /// Reject settings the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        let bridge = &self.bridge;
        let timeouts = &bridge.timeouts;
        for (name, value) in [
            ("bridge.eviction_interval_secs", bridge.eviction_interval_secs),
            ("bridge.heartbeat_timeout_secs", bridge.heartbeat_timeout_secs),
            ("bridge.ping_interval_secs", bridge.ping_interval_secs),
            ("bridge.timeouts.read_ms", timeouts.read_ms),
            ("bridge.timeouts.action_ms", timeouts.action_ms),
            ("bridge.timeouts.navigate_ms", timeouts.navigate_ms),
        ] {
            if value == 0 {
                bail!("{} must be greater than zero", name);
            }
        }
        if bridge.max_inflight_per_connection == 0 {
            bail!("bridge.max_inflight_per_connection must be greater than zero");
        }
        if bridge.ping_interval_secs >= bridge.heartbeat_timeout_secs {
            bail!("bridge.ping_interval_secs must be shorter than bridge.heartbeat_timeout_secs");
        }
        Ok(())
    }

    /// Whether internal error detail may be sent to callers
    pub fn is_development(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("development")
    }
}

/// Which transports the process runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// JSON-RPC over stdin/stdout only
    Stdio,
    /// HTTP endpoints and browser channel only
    Http,
    /// Both
    #[default]
    Both,
}

impl ServeMode {
    pub fn runs_http(&self) -> bool {
        matches!(self, Self::Http | Self::Both)
    }

    pub fn runs_stdio(&self) -> bool {
        matches!(self, Self::Stdio | Self::Both)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS (the hosting web application)
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    #[serde(default)]
    pub mode: ServeMode,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
            mode: ServeMode::default(),
            environment: default_environment(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

/// Browser bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
    /// A connection silent for longer than this is marked dead
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_secs: u64,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_max_inflight")]
    pub max_inflight_per_connection: usize,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            eviction_interval_secs: default_eviction_interval(),
            heartbeat_timeout_secs: default_heartbeat_timeout(),
            ping_interval_secs: default_ping_interval(),
            max_inflight_per_connection: default_max_inflight(),
            timeouts: TimeoutsConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

fn default_eviction_interval() -> u64 {
    pagepilot_core::DEFAULT_EVICTION_INTERVAL_SECS
}

fn default_heartbeat_timeout() -> u64 {
    60
}

fn default_ping_interval() -> u64 {
    30
}

fn default_max_inflight() -> usize {
    pagepilot_core::DEFAULT_MAX_INFLIGHT
}

/// Reply budgets in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_read_ms")]
    pub read_ms: u64,
    #[serde(default = "default_action_ms")]
    pub action_ms: u64,
    #[serde(default = "default_navigate_ms")]
    pub navigate_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            read_ms: default_read_ms(),
            action_ms: default_action_ms(),
            navigate_ms: default_navigate_ms(),
        }
    }
}

impl TimeoutsConfig {
    pub fn budgets(&self) -> TimeoutBudgets {
        TimeoutBudgets {
            read: Duration::from_millis(self.read_ms),
            action: Duration::from_millis(self.action_ms),
            navigate: Duration::from_millis(self.navigate_ms),
        }
    }
}

fn default_read_ms() -> u64 {
    5_000
}

fn default_action_ms() -> u64 {
    10_000
}

fn default_navigate_ms() -> u64 {
    15_000
}
