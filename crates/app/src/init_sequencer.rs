//! Init sequencer: the fixed startup handshake.
//!
//! Three writes are issued back to back without waiting for
//! acknowledgements:
//!
//! 1. anti-interference token to `antidos`
//! 2. transmit power level to `txpower`
//! 3. wake-up byte to `wakecpu`
//!
//! The session is marked ready right after issuing them, so a ready session
//! may still have handshake writes in flight.

use spherolink_domain::characteristic::CharacteristicName;

use crate::error::SessionError;
use crate::ports::GattAdapter;
use crate::registry::CharacteristicRegistry;

/// Anti-interference token written to `antidos`.
pub const ANTIDOS_TOKEN: &[u8] = b"011i3";
/// Transmit power level written to `txpower`.
pub const TX_POWER_LEVEL: &[u8] = &[0x07];
/// Wake-up byte written to `wakecpu`.
pub const WAKE_CPU: &[u8] = &[0x01];

/// Handshake writes in issue order.
pub const STEPS: [(CharacteristicName, &[u8]); 3] = [
    (CharacteristicName::Antidos, ANTIDOS_TOKEN),
    (CharacteristicName::Txpower, TX_POWER_LEVEL),
    (CharacteristicName::Wakecpu, WAKE_CPU),
];

/// Result of issuing the handshake.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InitOutcome {
    /// Writes handed to the adapter.
    pub issued: usize,
    /// Writes that could not be issued, with the reason.
    pub failures: Vec<(CharacteristicName, SessionError)>,
}

/// Issues the handshake and enables notifications.
pub struct InitSequencer;

impl InitSequencer {
    /// Issue every handshake write. A failed step does not stop the others.
    pub fn run<A: GattAdapter>(adapter: &mut A, registry: &CharacteristicRegistry) -> InitOutcome {
        tracing::info!("initiating startup sequence");

        let mut outcome = InitOutcome::default();
        for (name, value) in STEPS {
            let result = registry.require(name).and_then(|handle| {
                adapter
                    .write_characteristic(handle, value)
                    .map_err(SessionError::from)
            });
            match result {
                Ok(()) => outcome.issued += 1,
                Err(err) => {
                    tracing::error!(%err, characteristic = %name, "startup write failed");
                    outcome.failures.push((name, err));
                }
            }
        }
        outcome
    }

    /// Turn on notifications for the `notify` characteristic.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnresolvedCharacteristic`] if `notify` has no
    /// handle, or [`SessionError::Adapter`] if the request cannot be enqueued.
    pub fn enable_notifications<A: GattAdapter>(
        adapter: &mut A,
        registry: &CharacteristicRegistry,
    ) -> Result<(), SessionError> {
        let handle = registry.require(CharacteristicName::Notify)?;
        adapter.enable_notifications(handle, true)?;
        Ok(())
    }
}
