//! Device stats: the externally observable telemetry of the robot.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::packet::{PowerReport, Telemetry, VersionReport};

/// Battery/charger state reported by the power-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    #[default]
    Unknown,
    Charging,
    Ok,
    Low,
    Critical,
}

impl TryFrom<u8> for PowerState {
    type Error = DecodeError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Charging),
            2 => Ok(Self::Ok),
            3 => Ok(Self::Low),
            4 => Ok(Self::Critical),
            other => Err(DecodeError::PowerStateOutOfRange(other)),
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("-"),
            Self::Charging => f.write_str("charging"),
            Self::Ok => f.write_str("OK"),
            Self::Low => f.write_str("low"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// Placeholder shown until a version response has been decoded.
pub const UNKNOWN_VERSION: &str = "-";

/// Telemetry fields published to observers.
///
/// All fields go back to their defaults on disconnect and on session
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    /// Main application version as `"major.minor"`.
    pub sphero_app_version: String,
    pub power_state: PowerState,
    pub num_recharges: u16,
    pub secs_since_recharge: u16,
    /// Battery voltage in volts.
    pub battery_voltage: f64,
    /// Last known signal strength in dBm.
    pub rssi: i16,
}

impl Default for DeviceStats {
    fn default() -> Self {
        Self {
            sphero_app_version: UNKNOWN_VERSION.to_owned(),
            power_state: PowerState::Unknown,
            num_recharges: 0,
            secs_since_recharge: 0,
            battery_voltage: 0.0,
            rssi: 0,
        }
    }
}

impl DeviceStats {
    /// Overwrite the fields covered by a decoded packet.
    ///
    /// Every field belonging to one report is written in the same call.
    pub fn apply(&mut self, telemetry: &Telemetry) {
        match telemetry {
            Telemetry::Version(report) => self.apply_version(report),
            Telemetry::PowerState(report) => self.apply_power(report),
        }
    }

    fn apply_version(&mut self, report: &VersionReport) {
        self.sphero_app_version = report.main_app_version();
    }

    fn apply_power(&mut self, report: &PowerReport) {
        self.power_state = report.power_state;
        self.battery_voltage = report.battery_voltage;
        self.num_recharges = report.num_recharges;
        self.secs_since_recharge = report.secs_since_recharge;
    }

    /// One-line human readable summary.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "app {} | battery {} ({}V) | recharges {} (last {}s ago) | rssi {} dBm",
            self.sphero_app_version,
            self.power_state,
            self.battery_voltage,
            self.num_recharges,
            self.secs_since_recharge,
            self.rssi
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_power_state_bytes_in_order() {
        let expected = [
            PowerState::Unknown,
            PowerState::Charging,
            PowerState::Ok,
            PowerState::Low,
            PowerState::Critical,
        ];
        for (raw, state) in (0u8..).zip(expected) {
            assert_eq!(PowerState::try_from(raw), Ok(state));
        }
    }

    #[test]
    fn should_reject_power_state_byte_above_four() {
        for raw in [5u8, 6, 0x7F, 0xFF] {
            assert_eq!(
                PowerState::try_from(raw),
                Err(DecodeError::PowerStateOutOfRange(raw))
            );
        }
    }

    #[test]
    fn should_display_power_state_labels() {
        assert_eq!(PowerState::Unknown.to_string(), "-");
        assert_eq!(PowerState::Ok.to_string(), "OK");
        assert_eq!(PowerState::Critical.to_string(), "critical");
    }

    #[test]
    fn should_default_stats_to_placeholders() {
        let stats = DeviceStats::default();
        assert_eq!(stats.sphero_app_version, "-");
        assert_eq!(stats.power_state, PowerState::Unknown);
        assert_eq!(stats.num_recharges, 0);
        assert_eq!(stats.secs_since_recharge, 0);
        assert!(stats.battery_voltage.abs() < f64::EPSILON);
        assert_eq!(stats.rssi, 0);
    }

    #[test]
    fn should_apply_power_report_without_touching_version() {
        let mut stats = DeviceStats {
            sphero_app_version: "3.2".to_owned(),
            ..DeviceStats::default()
        };
        stats.apply(&Telemetry::PowerState(PowerReport {
            power_state: PowerState::Low,
            battery_voltage: 7.1,
            num_recharges: 12,
            secs_since_recharge: 300,
        }));
        assert_eq!(stats.sphero_app_version, "3.2");
        assert_eq!(stats.power_state, PowerState::Low);
        assert!((stats.battery_voltage - 7.1).abs() < 1e-9);
        assert_eq!(stats.num_recharges, 12);
        assert_eq!(stats.secs_since_recharge, 300);
    }

    #[test]
    fn should_render_status_line() {
        let stats = DeviceStats {
            sphero_app_version: "3.2".to_owned(),
            power_state: PowerState::Ok,
            num_recharges: 5,
            secs_since_recharge: 10,
            battery_voltage: 9.83,
            rssi: -61,
        };
        assert_eq!(
            stats.status_line(),
            "app 3.2 | battery OK (9.83V) | recharges 5 (last 10s ago) | rssi -61 dBm"
        );
    }
}
