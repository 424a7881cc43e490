//! Session lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the single GATT session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Scanning,
    Connecting,
    DiscoveringServices,
    Initializing,
    Ready,
    Disconnected,
    Error,
}

impl SessionState {
    /// Whether the session accepts commands.
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether a link attempt is underway (between device selection and ready).
    #[must_use]
    pub fn is_linking(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::DiscoveringServices | Self::Initializing
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Scanning => f.write_str("scanning"),
            Self::Connecting => f.write_str("connecting"),
            Self::DiscoveringServices => f.write_str("discovering_services"),
            Self::Initializing => f.write_str("initializing"),
            Self::Ready => f.write_str("ready"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn should_only_be_ready_in_ready_state() {
        assert!(SessionState::Ready.is_ready());
        assert!(!SessionState::Initializing.is_ready());
        assert!(!SessionState::Disconnected.is_ready());
    }

    #[test]
    fn should_display_snake_case() {
        assert_eq!(
            SessionState::DiscoveringServices.to_string(),
            "discovering_services"
        );
    }
}
