//! # Application configuration DTO
//!
//! Pure data: each section maps one-to-one onto a TOML table and every field
//! has a default, so a partial file (or no file at all) is valid. Merging
//! with CLI flags happens in the binary's bootstrap layer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest interval or timeout a node accepts (one day).
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Most heartbeats a peer may miss before it is declared lost.
pub const MAX_LIVENESS_MULTIPLIER: u32 = 100;

const MAX_INTERVAL_MS: u64 = MAX_INTERVAL_SECS * 1_000;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub network: NetworkConfig,
    pub clipboard: ClipboardConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Empty means "derive from host name".
    pub id: String,
}

/// Whether this node accepts connections or dials one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    Listen { port: u16 },
    Connect { address: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: Option<NetworkMode>,
    /// Interface the listener binds to.
    pub bind: String,
    pub heartbeat_interval_secs: u64,
    /// Silence tolerated before a peer is declared lost, in heartbeats.
    pub liveness_multiplier: u32,
    pub max_frame_bytes: usize,
    pub connect_timeout_ms: u64,
    pub handshake_timeout_ms: u64,
    pub send_timeout_ms: u64,
    pub reconnect_interval_secs: u64,
    /// Outbound messages buffered per session before it counts as stalled.
    pub session_queue_capacity: usize,
    pub engine_queue_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: None,
            bind: "0.0.0.0".to_string(),
            heartbeat_interval_secs: 10,
            liveness_multiplier: 3,
            max_frame_bytes: 8 * 1024 * 1024,
            connect_timeout_ms: 5_000,
            handshake_timeout_ms: 5_000,
            send_timeout_ms: 5_000,
            reconnect_interval_secs: 5,
            session_queue_capacity: 64,
            engine_queue_capacity: 256,
        }
    }
}

// Duration helpers clamp to MAX_INTERVAL_SECS so timer arithmetic cannot overflow.
impl NetworkConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.min(MAX_INTERVAL_SECS))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.min(MAX_INTERVAL_MS))
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms.min(MAX_INTERVAL_MS))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms.min(MAX_INTERVAL_MS))
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs.min(MAX_INTERVAL_SECS))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardBackend {
    /// The desktop clipboard.
    #[default]
    System,
    /// Process-local value, for headless nodes.
    Memory,
    /// Lines on stdin are local changes; remote values go to stdout.
    Stdio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    pub backend: ClipboardBackend,
    pub poll_interval_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            backend: ClipboardBackend::System,
            poll_interval_ms: 500,
        }
    }
}

impl ClipboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log the segmented tokens of every applied remote entry.
    pub segment_text: bool,
    /// Period of the status summary log line. Zero disables it.
    pub status_interval_secs: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            segment_text: true,
            status_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for `tcpclipboard.log`. Stdout only when unset.
    pub file_dir: Option<PathBuf>,
}
