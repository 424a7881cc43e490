//! Session and adapter error types.

use spherolink_domain::characteristic::CharacteristicName;

/// The adapter could not accept a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The adapter worker is gone; nothing can be enqueued any more.
    #[error("adapter request channel closed")]
    Closed,
}

/// Errors surfaced by [`GattSession`](crate::GattSession) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a ready session.
    #[error("session is not ready")]
    NotReady,

    /// No handle was resolved for the characteristic during discovery.
    #[error("characteristic {0} is not resolved")]
    UnresolvedCharacteristic(CharacteristicName),

    /// The adapter refused the request.
    #[error("adapter error")]
    Adapter(#[from] AdapterError),

    /// The driver task has stopped.
    #[error("session driver stopped")]
    Stopped,
}
