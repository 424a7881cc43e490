//! Query command encoding for the telemetry the session decodes.
//!
//! Only the two queries whose answers are understood by
//! [`packet::decode`](crate::packet::decode) are modelled here.
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0 | SOP1 (`0xFF`) |
//! | 1 | SOP2 (`0xFF` = answer requested, reset inactivity timeout) |
//! | 2 | DID |
//! | 3 | CID |
//! | 4 | SEQ |
//! | 5 | DLEN (data bytes + checksum) |
//! | 6.. | data |
//! | last | CHK, one's complement of the byte sum from DID onward |

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::response::ResponseTag;

const SOP1: u8 = 0xFF;
const SOP2_ANSWER: u8 = 0xFF;
const DID_CORE: u8 = 0x00;
const CID_GET_VERSION: u8 = 0x02;
const CID_GET_POWER_STATE: u8 = 0x20;

/// A query whose answer arrives on the `notify` characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Version,
    PowerState,
}

impl Query {
    /// Tag the answer must be decoded with.
    #[must_use]
    pub fn response_tag(self) -> ResponseTag {
        match self {
            Self::Version => ResponseTag::Version,
            Self::PowerState => ResponseTag::PowerState,
        }
    }

    fn ids(self) -> (u8, u8) {
        match self {
            Self::Version => (DID_CORE, CID_GET_VERSION),
            Self::PowerState => (DID_CORE, CID_GET_POWER_STATE),
        }
    }

    /// Encode the query with the given sequence number.
    #[must_use]
    pub fn encode(self, seq: u8) -> Vec<u8> {
        let (did, cid) = self.ids();
        frame(did, cid, seq, &[], 1)
    }
}

/// Frame a command packet with header, length and checksum.
///
/// # Errors
///
/// Returns [`EncodeError::DataTooLong`] when `data` is 255 bytes or more.
pub fn encode_packet(did: u8, cid: u8, seq: u8, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let dlen = u8::try_from(data.len() + 1).map_err(|_| EncodeError::DataTooLong(data.len()))?;
    Ok(frame(did, cid, seq, data, dlen))
}

fn frame(did: u8, cid: u8, seq: u8, data: &[u8], dlen: u8) -> Vec<u8> {
    let mut packet = Vec::with_capacity(data.len() + 7);
    packet.extend_from_slice(&[SOP1, SOP2_ANSWER, did, cid, seq, dlen]);
    packet.extend_from_slice(data);
    packet.push(checksum(&packet[2..]));
    packet
}

fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Wrapping sequence counter for outgoing commands.
#[derive(Debug, Default)]
pub struct Sequence(u8);

impl Sequence {
    /// Return the current value and advance.
    pub fn next_seq(&mut self) -> u8 {
        let seq = self.0;
        self.0 = self.0.wrapping_add(1);
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_get_version() {
        assert_eq!(
            Query::Version.encode(0),
            vec![0xFF, 0xFF, 0x00, 0x02, 0x00, 0x01, 0xFC]
        );
    }

    #[test]
    fn should_encode_get_power_state() {
        // 0x00 + 0x20 + 0x07 + 0x01 = 0x28 → !0x28 = 0xD7
        assert_eq!(
            Query::PowerState.encode(7),
            vec![0xFF, 0xFF, 0x00, 0x20, 0x07, 0x01, 0xD7]
        );
    }

    #[test]
    fn should_include_data_in_length_and_checksum() {
        let packet = encode_packet(0x02, 0x21, 0x01, &[0xFF]).unwrap();
        // 0x02 + 0x21 + 0x01 + 0x02 + 0xFF = 0x125 → 0x25 → !0x25 = 0xDA
        assert_eq!(packet, vec![0xFF, 0xFF, 0x02, 0x21, 0x01, 0x02, 0xFF, 0xDA]);
    }

    #[test]
    fn should_accept_longest_data_that_fits_length_byte() {
        let packet = encode_packet(0x02, 0x21, 0x01, &[0u8; 254]).unwrap();
        assert_eq!(packet[5], 0xFF);
        assert_eq!(packet.len(), 254 + 7);
    }

    #[test]
    fn should_reject_data_overflowing_length_byte() {
        assert_eq!(
            encode_packet(0x02, 0x21, 0x01, &[0u8; 255]),
            Err(EncodeError::DataTooLong(255))
        );
    }

    #[test]
    fn should_pair_query_with_response_tag() {
        assert_eq!(Query::Version.response_tag(), ResponseTag::Version);
        assert_eq!(Query::PowerState.response_tag(), ResponseTag::PowerState);
    }

    #[test]
    fn should_wrap_sequence_counter() {
        let mut seq = Sequence(0xFF);
        assert_eq!(seq.next_seq(), 0xFF);
        assert_eq!(seq.next_seq(), 0x00);
        assert_eq!(seq.next_seq(), 0x01);
    }
}
