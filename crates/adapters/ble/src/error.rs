//! BLE adapter error types.

/// Errors raised while bringing up the `btleplug` adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found on the host.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// The configured adapter index does not exist.
    #[error("BLE adapter {index} not found ({available} available)")]
    AdapterIndex {
        /// Requested index.
        index: usize,
        /// Number of adapters present.
        available: usize,
    },

    /// A `btleplug` operation failed.
    #[error("BLE stack error")]
    Btleplug(#[from] btleplug::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_available_error() {
        let err = BleError::NotAvailable;
        assert_eq!(err.to_string(), "no BLE adapter available");
    }

    #[test]
    fn should_display_adapter_index_error() {
        let err = BleError::AdapterIndex {
            index: 2,
            available: 1,
        };
        assert_eq!(err.to_string(), "BLE adapter 2 not found (1 available)");
    }

    #[test]
    fn should_keep_btleplug_error_as_source() {
        let err = BleError::from(btleplug::Error::DeviceNotFound);
        assert_eq!(err.to_string(), "BLE stack error");
        assert!(std::error::Error::source(&err).is_some());
    }
}
