use tether_core::IceServerConfig;
use tether_core::utils::DEFAULT_CHANNEL_LABEL;

/// Baseline configuration for a new engine connection.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub channel_label: String,
}

impl TransportConfig {
    /// No path-discovery helpers: host candidates only. Enough on one machine.
    pub fn local() -> Self {
        Self {
            ice_servers: vec![],
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::default()],
            channel_label: DEFAULT_CHANNEL_LABEL.to_owned(),
        }
    }
}
