use std::time::Duration;

use tc_core::config::{NetworkConfig, MAX_INTERVAL_SECS, MAX_LIVENESS_MULTIPLIER};
use tc_core::{NodeId, PROTOCOL_VERSION};

/// Parameters shared by every session of a node.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub node_id: NodeId,
    pub protocol_version: u32,
    pub heartbeat_interval: Duration,
    pub liveness_multiplier: u32,
    pub max_frame_bytes: usize,
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    pub send_timeout: Duration,
    pub reconnect_interval: Duration,
    pub outbound_capacity: usize,
}

impl SessionConfig {
    pub fn new(node_id: NodeId) -> Self {
        Self::from_network_config(node_id, &NetworkConfig::default())
    }

    pub fn from_network_config(node_id: NodeId, network: &NetworkConfig) -> Self {
        Self {
            node_id,
            protocol_version: PROTOCOL_VERSION,
            heartbeat_interval: network.heartbeat_interval(),
            liveness_multiplier: network
                .liveness_multiplier
                .clamp(1, MAX_LIVENESS_MULTIPLIER),
            max_frame_bytes: network.max_frame_bytes,
            connect_timeout: network.connect_timeout(),
            handshake_timeout: network.handshake_timeout(),
            send_timeout: network.send_timeout(),
            reconnect_interval: network.reconnect_interval(),
            outbound_capacity: network.session_queue_capacity.max(1),
        }
    }

    /// Heartbeat period as used by the session timers.
    pub fn heartbeat_period(&self) -> Duration {
        self.heartbeat_interval
            .clamp(Duration::from_millis(1), Duration::from_secs(MAX_INTERVAL_SECS))
    }

    /// Silence after which a peer is declared lost.
    pub fn liveness_timeout(&self) -> Duration {
        self.heartbeat_interval
            .saturating_mul(self.liveness_multiplier)
            .max(Duration::from_millis(1))
    }
}
