//! BLE adapter configuration.

use serde::Deserialize;

/// Configuration for the `btleplug` adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// Which host adapter to use when several are present.
    pub adapter_index: usize,
    /// Capacity of the adapter → session event channel.
    pub event_buffer: usize,
    /// Ask the peripheral to acknowledge every write.
    pub write_with_response: bool,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            event_buffer: 64,
            write_with_response: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_first_adapter() {
        let config = BleConfig::default();
        assert_eq!(config.adapter_index, 0);
        assert_eq!(config.event_buffer, 64);
        assert!(config.write_with_response);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: BleConfig = toml::from_str("adapter_index = 1").unwrap();
        assert_eq!(config.adapter_index, 1);
        assert_eq!(config.event_buffer, 64);
        assert!(config.write_with_response);
    }
}
