//! Codec errors for response and command packets.
//!
//! Each failure mode is a distinct variant so callers can tell a foreign
//! packet apart from a truncated one or from an out-of-range enum byte.

use serde::{Deserialize, Serialize};

use crate::response::ResponseTag;

/// Why a notification payload could not be turned into telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum DecodeError {
    /// The first three bytes are not `FF FF 00`.
    #[error("packet header mismatch")]
    HeaderMismatch,

    /// The payload is shorter than the active tag requires.
    #[error("{tag} response must be at least {expected} bytes, got {actual}")]
    Truncated {
        /// Tag the payload was decoded against.
        tag: ResponseTag,
        /// Minimum byte count for that tag.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// The power-state byte is outside `0..=4`.
    #[error("power state byte {0} out of range")]
    PowerStateOutOfRange(u8),
}

/// Why a command packet could not be framed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// DLEN counts the data plus the checksum and must fit in one byte.
    #[error("command data of {0} bytes does not fit the length byte")]
    DataTooLong(usize),
}
