//! Session events: immutable records of observable changes.
//!
//! The session emits one event per state transition, per stats update and
//! per dropped notification. Observers subscribe to them instead of polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::characteristic::CharacteristicName;
use crate::error::DecodeError;
use crate::response::ResponseTag;
use crate::session::SessionState;
use crate::stats::DeviceStats;

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    StatsUpdated {
        stats: DeviceStats,
    },
    /// A tagged notification could not be decoded; stats are unchanged.
    DecodeFailed {
        tag: ResponseTag,
        error: DecodeError,
    },
    /// The adapter reported a failed characteristic write.
    WriteFailed {
        characteristic: Option<CharacteristicName>,
    },
}

/// A timestamped [`SessionEventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    /// Stamp `kind` with the current UTC time.
    #[must_use]
    pub fn new(kind: SessionEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn state_changed(from: SessionState, to: SessionState) -> Self {
        Self::new(SessionEventKind::StateChanged { from, to })
    }

    #[must_use]
    pub fn stats_updated(stats: DeviceStats) -> Self {
        Self::new(SessionEventKind::StatsUpdated { stats })
    }

    #[must_use]
    pub fn decode_failed(tag: ResponseTag, error: DecodeError) -> Self {
        Self::new(SessionEventKind::DecodeFailed { tag, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stamp_event_with_current_time() {
        let before = Utc::now();
        let event = SessionEvent::state_changed(SessionState::Idle, SessionState::Scanning);
        assert!(event.timestamp >= before);
        assert!(event.timestamp <= Utc::now());
    }

    #[test]
    fn should_serialize_state_change_with_type_tag() {
        let event = SessionEvent::state_changed(SessionState::Connecting, SessionState::Error);
        let json = serde_json::to_value(&event.kind).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["from"], "connecting");
        assert_eq!(json["to"], "error");
    }
}
