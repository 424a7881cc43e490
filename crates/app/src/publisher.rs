//! State publisher backed by tokio `watch` and `broadcast` channels.
//!
//! Observers on other tasks read the latest [`SessionSnapshot`] through a
//! `watch` receiver and follow individual [`SessionEvent`]s through a
//! `broadcast` receiver. Publishing succeeds even when nobody listens.

use serde::Serialize;
use tokio::sync::{broadcast, watch};

use spherolink_domain::event::SessionEvent;
use spherolink_domain::session::SessionState;
use spherolink_domain::stats::DeviceStats;

/// Everything an observer can see at one instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// `true` iff `state` is [`SessionState::Ready`].
    pub ready: bool,
    pub stats: DeviceStats,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(state: SessionState, stats: DeviceStats) -> Self {
        Self {
            state,
            ready: state.is_ready(),
            stats,
        }
    }
}

pub struct StatePublisher {
    snapshot: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl StatePublisher {
    /// Create a publisher whose event channel buffers `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        let (events, _) = broadcast::channel(capacity);
        Self { snapshot, events }
    }

    /// Receiver that always holds the latest snapshot.
    #[must_use]
    pub fn subscribe_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Receiver for events published *after* this call.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Swap in a new snapshot.
    pub fn publish_snapshot(&self, snapshot: SessionSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    pub fn publish_event(&self, event: SessionEvent) {
        // Fails only when there are no receivers.
        let _ = self.events.send(event);
    }
}
