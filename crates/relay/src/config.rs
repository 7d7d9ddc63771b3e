//! Relay configuration.

/// Relay configuration.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Whether captured entries are encoded for transport.
    pub encode_for_transport: bool,
    /// Depth and breadth bound applied to each encoded argument.
    pub limit: usize,
    /// Whether the wire JSON of each captured entry is echoed.
    pub echo_wire: bool,
}

impl RelayConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-process capture with no serialization boundary.
    pub fn in_process() -> Self {
        Self {
            encode_for_transport: false,
            echo_wire: false,
            ..Self::default()
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            encode_for_transport: true,
            limit: 100,
            echo_wire: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let config = RelayConfig::new();
        assert!(config.encode_for_transport);
        assert_eq!(config.limit, 100);

        let local = RelayConfig::in_process();
        assert!(!local.encode_for_transport);
        assert!(!local.echo_wire);
    }
}
