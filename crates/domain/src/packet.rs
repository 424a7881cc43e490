//! Response packet decoder for the `notify` characteristic.
//!
//! Pure functions operating on raw `&[u8]` slices, no BLE dependency needed.
//! Only packets starting with `FF FF 00` (SOP1, SOP2, MRSP ok) are
//! interpreted. The body layout depends on which query the packet answers,
//! which the caller knows from the pending [`ResponseTag`].
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0 | SOP1 (`0xFF`) |
//! | 1 | SOP2 (`0xFF`) |
//! | 2 | MRSP (`0x00` = ok) |
//! | 3 | SEQ |
//! | 4 | DLEN |
//! | 5.. | body, see [`decode`] |

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::response::ResponseTag;
use crate::stats::PowerState;

/// SOP1, SOP2 and a successful MRSP.
pub const HEADER: [u8; 3] = [0xFF, 0xFF, 0x00];

const VERSION_LEN: usize = 13;
const POWER_STATE_LEN: usize = 13;

/// A byte carrying two 4-bit revision digits, shown as `"hi.lo"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NibblePair(pub u8);

impl NibblePair {
    #[must_use]
    pub fn high(self) -> u8 {
        self.0 >> 4
    }

    #[must_use]
    pub fn low(self) -> u8 {
        self.0 & 0x0F
    }
}

impl std::fmt::Display for NibblePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.high(), self.low())
    }
}

/// Body of a get-versioning answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReport {
    /// Record version (RECV).
    pub record_version: u8,
    /// Model number (MDL).
    pub model: NibblePair,
    /// Hardware revision (HW).
    pub hardware_revision: u8,
    /// Main application major version (MSA).
    pub app_major: u8,
    /// Main application minor version (MSA).
    pub app_minor: u8,
    /// Bootloader (BL).
    pub bootloader: NibblePair,
    /// orbBasic interpreter (BAS).
    pub basic: NibblePair,
    /// Overlay manager.
    pub overlay_manager: NibblePair,
}

impl VersionReport {
    /// Main application version as `"major.minor"`.
    #[must_use]
    pub fn main_app_version(&self) -> String {
        format!("{}.{}", self.app_major, self.app_minor)
    }
}

/// Body of a get-power-state answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerReport {
    pub power_state: PowerState,
    /// Battery voltage in volts.
    pub battery_voltage: f64,
    pub num_recharges: u16,
    pub secs_since_recharge: u16,
}

/// Decoded body, one variant per [`ResponseTag`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Telemetry {
    Version(VersionReport),
    PowerState(PowerReport),
}

/// A fully decoded response packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Echoed sequence number (SEQ).
    pub sequence: u8,
    /// Declared data length (DLEN).
    pub data_len: u8,
    pub telemetry: Telemetry,
}

/// Check the three-byte response header.
///
/// # Errors
///
/// Returns [`DecodeError::HeaderMismatch`] unless `data` starts with `FF FF 00`.
pub fn check_header(data: &[u8]) -> Result<(), DecodeError> {
    if data.starts_with(&HEADER) {
        Ok(())
    } else {
        Err(DecodeError::HeaderMismatch)
    }
}

/// Decode a response packet against the tag of the query it answers.
///
/// Version body (13 bytes minimum):
///
/// | Offset | Field | Type |
/// |--------|-------|------|
/// | 5 | RECV | u8 |
/// | 6 | MDL | nibble pair |
/// | 7 | HW | u8 |
/// | 8–9 | MSA | major, minor |
/// | 10 | BL | nibble pair |
/// | 11 | BAS | nibble pair |
/// | 12 | overlay manager | nibble pair |
///
/// Power-state body (13 bytes minimum):
///
/// | Offset | Field | Type |
/// |--------|-------|------|
/// | 6 | power state | u8, `0..=4` |
/// | 7–8 | battery voltage | u16 BE, ×0.01 V |
/// | 9–10 | recharge count | u16 BE |
/// | 11–12 | seconds since recharge | u16 BE |
///
/// # Errors
///
/// Returns [`DecodeError::HeaderMismatch`] for foreign packets,
/// [`DecodeError::Truncated`] when the payload is too short for `tag`, and
/// [`DecodeError::PowerStateOutOfRange`] for an unknown power-state byte.
pub fn decode(data: &[u8], tag: ResponseTag) -> Result<ResponseFrame, DecodeError> {
    check_header(data)?;

    let telemetry = match tag {
        ResponseTag::Version => Telemetry::Version(decode_version(data)?),
        ResponseTag::PowerState => Telemetry::PowerState(decode_power_state(data)?),
    };

    Ok(ResponseFrame {
        sequence: data[3],
        data_len: data[4],
        telemetry,
    })
}

fn require_len(data: &[u8], tag: ResponseTag, expected: usize) -> Result<(), DecodeError> {
    if data.len() < expected {
        return Err(DecodeError::Truncated {
            tag,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn decode_version(data: &[u8]) -> Result<VersionReport, DecodeError> {
    require_len(data, ResponseTag::Version, VERSION_LEN)?;

    Ok(VersionReport {
        record_version: data[5],
        model: NibblePair(data[6]),
        hardware_revision: data[7],
        app_major: data[8],
        app_minor: data[9],
        bootloader: NibblePair(data[10]),
        basic: NibblePair(data[11]),
        overlay_manager: NibblePair(data[12]),
    })
}

fn decode_power_state(data: &[u8]) -> Result<PowerReport, DecodeError> {
    require_len(data, ResponseTag::PowerState, POWER_STATE_LEN)?;

    let power_state = PowerState::try_from(data[6])?;
    let voltage_raw = u16::from_be_bytes([data[7], data[8]]);

    Ok(PowerReport {
        power_state,
        battery_voltage: f64::from(voltage_raw) / 100.0,
        num_recharges: u16::from_be_bytes([data[9], data[10]]),
        secs_since_recharge: u16::from_be_bytes([data[11], data[12]]),
    })
}

/// Lowercase hex dump used in trace logs (e.g. `"ffff0001"`).
#[must_use]
pub fn hex(data: &[u8]) -> String {
    use std::fmt::Write as _;

    data.iter().fold(String::with_capacity(data.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION_PAYLOAD: [u8; 13] = [
        0xFF, 0xFF, 0x00, // header
        0x01, // seq
        0x0D, // dlen
        0x00, // recv
        0x02, // mdl
        0x01, // hw
        0x03, 0x02, // msa 3.2
        0x0A, // bl
        0x05, // bas
        0x03, // overlay manager
    ];

    const POWER_PAYLOAD: [u8; 13] = [
        0xFF, 0xFF, 0x00, // header
        0x01, // seq
        0x0D, // dlen
        0x00, // recv
        0x02, // power state: OK
        0x03, 0xD7, // 983 → 9.83 V
        0x00, 0x05, // recharges
        0x00, 0x0A, // secs since recharge
    ];

    // ── Header ──────────────────────────────────────────────────────────

    #[test]
    fn should_accept_valid_header() {
        assert!(check_header(&[0xFF, 0xFF, 0x00, 0x42]).is_ok());
    }

    #[test]
    fn should_reject_async_packet_header() {
        // SOP2 0xFE marks an async message, not a response
        let data = [0xFF, 0xFE, 0x00, 0x01, 0x0D];
        assert_eq!(check_header(&data), Err(DecodeError::HeaderMismatch));
    }

    #[test]
    fn should_reject_error_response_code() {
        let mut data = VERSION_PAYLOAD;
        data[2] = 0x01;
        assert_eq!(
            decode(&data, ResponseTag::Version),
            Err(DecodeError::HeaderMismatch)
        );
    }

    #[test]
    fn should_reject_payload_shorter_than_header() {
        assert_eq!(check_header(&[0xFF, 0xFF]), Err(DecodeError::HeaderMismatch));
        assert_eq!(check_header(&[]), Err(DecodeError::HeaderMismatch));
    }

    // ── Version ─────────────────────────────────────────────────────────

    #[test]
    fn should_decode_version_response() {
        let frame = decode(&VERSION_PAYLOAD, ResponseTag::Version).unwrap();
        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.data_len, 13);
        let Telemetry::Version(report) = frame.telemetry else {
            panic!("expected version telemetry");
        };
        assert_eq!(report.main_app_version(), "3.2");
        assert_eq!(report.hardware_revision, 1);
        assert_eq!(report.model.to_string(), "0.2");
        assert_eq!(report.bootloader.to_string(), "0.10");
        assert_eq!(report.basic.to_string(), "0.5");
        assert_eq!(report.overlay_manager.to_string(), "0.3");
    }

    #[test]
    fn should_split_nibbles() {
        let pair = NibblePair(0x4B);
        assert_eq!(pair.high(), 4);
        assert_eq!(pair.low(), 11);
        assert_eq!(pair.to_string(), "4.11");
    }

    #[test]
    fn should_reject_truncated_version_response() {
        let err = decode(&VERSION_PAYLOAD[..12], ResponseTag::Version).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                tag: ResponseTag::Version,
                expected: 13,
                actual: 12,
            }
        );
    }

    #[test]
    fn should_ignore_trailing_bytes() {
        let mut data = VERSION_PAYLOAD.to_vec();
        data.push(0xAA);
        let frame = decode(&data, ResponseTag::Version).unwrap();
        assert!(matches!(frame.telemetry, Telemetry::Version(_)));
    }

    // ── Power state ─────────────────────────────────────────────────────

    #[test]
    fn should_decode_power_state_response() {
        let frame = decode(&POWER_PAYLOAD, ResponseTag::PowerState).unwrap();
        let Telemetry::PowerState(report) = frame.telemetry else {
            panic!("expected power telemetry");
        };
        assert_eq!(report.power_state, PowerState::Ok);
        assert!((report.battery_voltage - 9.83).abs() < 1e-9);
        assert_eq!(report.num_recharges, 5);
        assert_eq!(report.secs_since_recharge, 10);
    }

    #[test]
    fn should_reject_power_state_truncated_to_nine_bytes() {
        let err = decode(&POWER_PAYLOAD[..9], ResponseTag::PowerState).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                expected: 13,
                actual: 9,
                ..
            }
        ));
    }

    #[test]
    fn should_reject_out_of_range_power_state() {
        let mut data = POWER_PAYLOAD;
        data[6] = 5;
        assert_eq!(
            decode(&data, ResponseTag::PowerState),
            Err(DecodeError::PowerStateOutOfRange(5))
        );
    }

    #[test]
    fn should_check_header_before_length() {
        let data = [0x00, 0x01, 0x02];
        assert_eq!(
            decode(&data, ResponseTag::PowerState),
            Err(DecodeError::HeaderMismatch)
        );
    }

    #[test]
    fn should_hex_dump_lowercase() {
        assert_eq!(hex(&[0xFF, 0x0A, 0x00]), "ff0a00");
        assert_eq!(hex(&[]), "");
    }
}
