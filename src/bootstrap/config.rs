//! Configuration loading and merging.
//!
//! The file supplies defaults, command line flags override them, and the
//! result is checked once before anything starts.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tc_core::config::{AppConfig, NetworkMode, MAX_INTERVAL_SECS, MAX_LIVENESS_MULTIPLIER};
use tc_core::NodeId;
use tracing::debug;

use super::cli::Cli;

/// Configuration after merging and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub node_id: NodeId,
    pub mode: NetworkMode,
    pub config: AppConfig,
}

impl Settings {
    pub fn log_dir(&self) -> Option<&Path> {
        self.config.logging.file_dir.as_deref()
    }
}

/// Load configuration from a TOML file.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

/// `<config dir>/tcpclipboard/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tcpclipboard").join("config.toml"))
}

pub fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => match default_config_path().filter(|path| path.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "using default config file");
                load_config(&path)?
            }
            None => AppConfig::default(),
        },
    };

    apply_overrides(&mut config, cli);
    settings_from_config(config)
}

/// Copy every flag that was given over the matching file value.
pub fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(port) = cli.listen {
        config.network.mode = Some(NetworkMode::Listen { port });
    }
    if let Some(address) = &cli.connect {
        config.network.mode = Some(NetworkMode::Connect {
            address: address.clone(),
        });
    }
    if let Some(node_id) = &cli.node_id {
        config.node.id = node_id.clone();
    }
    if let Some(bind) = &cli.bind {
        config.network.bind = bind.clone();
    }
    if let Some(backend) = cli.clipboard {
        config.clipboard.backend = backend.into();
    }
    if let Some(secs) = cli.heartbeat_secs {
        config.network.heartbeat_interval_secs = secs;
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.file_dir = Some(dir.clone());
    }
    if cli.no_segment {
        config.diagnostics.segment_text = false;
    }
}

pub fn settings_from_config(config: AppConfig) -> anyhow::Result<Settings> {
    let Some(mode) = config.network.mode.clone() else {
        bail!("either --listen <port> or --connect <host:port> is required");
    };
    if let NetworkMode::Connect { address } = &mode {
        if address.trim().is_empty() {
            bail!("connect address is empty");
        }
    }
    let network = &config.network;
    if network.heartbeat_interval_secs == 0 {
        bail!("heartbeat interval must be at least one second");
    }
    if network.heartbeat_interval_secs > MAX_INTERVAL_SECS
        || network.reconnect_interval_secs > MAX_INTERVAL_SECS
    {
        bail!("heartbeat and reconnect intervals must not exceed {MAX_INTERVAL_SECS} seconds");
    }
    if !(1..=MAX_LIVENESS_MULTIPLIER).contains(&network.liveness_multiplier) {
        bail!("liveness multiplier must be between 1 and {MAX_LIVENESS_MULTIPLIER}");
    }
    let max_timeout_ms = MAX_INTERVAL_SECS * 1_000;
    if [
        network.connect_timeout_ms,
        network.handshake_timeout_ms,
        network.send_timeout_ms,
    ]
    .iter()
    .any(|ms| *ms > max_timeout_ms)
    {
        bail!("network timeouts must not exceed {MAX_INTERVAL_SECS} seconds");
    }
    if config.network.max_frame_bytes == 0 {
        bail!("max frame size must be positive");
    }
    if config.clipboard.poll_interval_ms == 0 {
        bail!("clipboard poll interval must be positive");
    }

    Ok(Settings {
        node_id: resolve_node_id(&config.node.id),
        mode,
        config,
    })
}

/// Configured id, else the host name, else a random id.
pub fn resolve_node_id(configured: &str) -> NodeId {
    let configured = configured.trim();
    if !configured.is_empty() {
        return NodeId::from(configured);
    }

    let hostname = gethostname::gethostname();
    match hostname.to_str().map(str::trim) {
        Some(name) if !name.is_empty() => NodeId::from(name),
        _ => NodeId::random(),
    }
}
