//! Device scanner: picks the first advertiser whose name matches a prefix.

use spherolink_domain::device::{Device, PeerId};

use crate::error::AdapterError;
use crate::ports::GattAdapter;

/// Filters advertisements by name prefix and selects the first match.
///
/// There is no scan timeout: a target that never advertises keeps the
/// scanner waiting until the caller gives up.
#[derive(Debug, Default)]
pub struct DeviceScanner {
    target_prefix: String,
    selected: Option<Device>,
}

impl DeviceScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an advertised name passes the prefix filter.
    ///
    /// Unnamed advertisements never match.
    #[must_use]
    pub fn matches(prefix: &str, name: Option<&str>) -> bool {
        name.is_some_and(|name| name.starts_with(prefix))
    }

    /// Cancel any in-flight scan, forget the previous selection and scan again.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the adapter refuses to start the scan.
    pub fn start_scan<A: GattAdapter>(
        &mut self,
        adapter: &mut A,
        target_prefix: &str,
    ) -> Result<(), AdapterError> {
        if let Err(err) = adapter.stop_scan() {
            tracing::debug!(%err, "failed to stop previous scan");
        }
        self.target_prefix = target_prefix.to_owned();
        self.selected = None;

        tracing::info!(prefix = target_prefix, "starting new scan");
        adapter.start_scan()
    }

    /// Handle one advertisement.
    ///
    /// Returns the selected [`Device`] when the name matches; the scan is
    /// stopped in that case. Later advertisements are ignored until the next
    /// [`start_scan`](Self::start_scan).
    pub fn on_advertisement<A: GattAdapter>(
        &mut self,
        adapter: &mut A,
        peer: PeerId,
        name: Option<String>,
        rssi: Option<i16>,
    ) -> Option<Device> {
        if self.selected.is_some() {
            return None;
        }

        let name = name?;
        tracing::debug!(%peer, %name, ?rssi, "device found");
        if !Self::matches(&self.target_prefix, Some(&name)) {
            return None;
        }

        tracing::info!(%peer, %name, "device matched target, stopping scan");
        if let Err(err) = adapter.stop_scan() {
            tracing::warn!(%err, "failed to stop scan after match");
        }

        let device = Device { peer, name, rssi };
        self.selected = Some(device.clone());
        Some(device)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Device> {
        self.selected.as_ref()
    }

    /// Drop the selected device.
    pub fn reset(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::gatt::testing::{RecordingAdapter, Request};

    #[test]
    fn should_match_name_with_prefix() {
        assert!(DeviceScanner::matches("BB", Some("BB-1A2B")));
        assert!(!DeviceScanner::matches("BB", Some("SK-1A2B")));
        assert!(!DeviceScanner::matches("BB", None));
    }

    #[test]
    fn should_stop_previous_scan_before_starting() {
        let mut adapter = RecordingAdapter::default();
        let mut scanner = DeviceScanner::new();
        scanner.start_scan(&mut adapter, "BB").unwrap();
        assert_eq!(adapter.requests, vec![Request::StopScan, Request::StartScan]);
    }

    #[test]
    fn should_select_matching_device_and_stop_scan() {
        let mut adapter = RecordingAdapter::default();
        let mut scanner = DeviceScanner::new();
        scanner.start_scan(&mut adapter, "BB").unwrap();

        let device = scanner
            .on_advertisement(
                &mut adapter,
                PeerId::new("peer-1"),
                Some("BB-1A2B".to_owned()),
                Some(-55),
            )
            .unwrap();

        assert_eq!(device.name, "BB-1A2B");
        assert_eq!(device.rssi, Some(-55));
        assert_eq!(scanner.selected(), Some(&device));
        assert_eq!(adapter.requests.last(), Some(&Request::StopScan));
    }

    #[test]
    fn should_ignore_unnamed_and_non_matching_advertisements() {
        let mut adapter = RecordingAdapter::default();
        let mut scanner = DeviceScanner::new();
        scanner.start_scan(&mut adapter, "BB").unwrap();

        let unnamed = scanner.on_advertisement(&mut adapter, PeerId::new("a"), None, None);
        let other = scanner.on_advertisement(
            &mut adapter,
            PeerId::new("b"),
            Some("Flower care".to_owned()),
            Some(-70),
        );

        assert!(unnamed.is_none());
        assert!(other.is_none());
        assert!(scanner.selected().is_none());
        assert_eq!(adapter.count(&Request::StopScan), 1);
    }

    #[test]
    fn should_ignore_advertisements_after_selection() {
        let mut adapter = RecordingAdapter::default();
        let mut scanner = DeviceScanner::new();
        scanner.start_scan(&mut adapter, "BB").unwrap();
        scanner.on_advertisement(&mut adapter, PeerId::new("a"), Some("BB-1".to_owned()), None);

        let second =
            scanner.on_advertisement(&mut adapter, PeerId::new("b"), Some("BB-2".to_owned()), None);

        assert!(second.is_none());
        assert_eq!(scanner.selected().map(|d| d.name.as_str()), Some("BB-1"));
    }
}
