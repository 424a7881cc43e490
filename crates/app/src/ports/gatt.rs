//! GATT adapter port: the radio capability the session drives.
//!
//! Every request method only **enqueues** work and returns immediately.
//! Results come back later as [`AdapterEvent`]s, delivered to
//! [`GattSession::handle_event`](crate::GattSession::handle_event) on the
//! single event-handling context.

use spherolink_domain::characteristic::CharacteristicHandle;
use spherolink_domain::device::PeerId;

use crate::error::AdapterError;

/// Downward interface implemented by a BLE stack binding.
pub trait GattAdapter {
    /// Begin delivering [`AdapterEvent::AdvertisementSeen`] events.
    fn start_scan(&mut self) -> Result<(), AdapterError>;

    /// Stop advertisement delivery. Stopping an idle scan is not an error.
    fn stop_scan(&mut self) -> Result<(), AdapterError>;

    /// Open a link; answered by [`AdapterEvent::ConnectionStateChanged`].
    fn connect_to(&mut self, peer: &PeerId) -> Result<(), AdapterError>;

    /// Close the current link, if any.
    fn close_link(&mut self) -> Result<(), AdapterError>;

    /// Enumerate services; answered by [`AdapterEvent::ServicesDiscovered`].
    fn discover_services(&mut self) -> Result<(), AdapterError>;

    /// Write a value; answered by [`AdapterEvent::CharacteristicWritten`].
    fn write_characteristic(
        &mut self,
        handle: CharacteristicHandle,
        value: &[u8],
    ) -> Result<(), AdapterError>;

    /// Toggle value-change notifications for a characteristic.
    fn enable_notifications(
        &mut self,
        handle: CharacteristicHandle,
        enabled: bool,
    ) -> Result<(), AdapterError>;

    /// Read the link RSSI; answered by [`AdapterEvent::RssiRead`].
    fn read_rssi(&mut self) -> Result<(), AdapterError>;
}

/// A characteristic found during service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCharacteristic {
    pub uuid: uuid::Uuid,
    pub handle: CharacteristicHandle,
}

/// Callback events delivered by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    AdvertisementSeen {
        peer: PeerId,
        name: Option<String>,
        rssi: Option<i16>,
    },
    ConnectionStateChanged {
        success: bool,
        connected: bool,
    },
    ServicesDiscovered {
        success: bool,
        characteristics: Vec<DiscoveredCharacteristic>,
    },
    CharacteristicWritten {
        handle: CharacteristicHandle,
        success: bool,
    },
    CharacteristicChanged {
        uuid: uuid::Uuid,
        value: Vec<u8>,
    },
    RssiRead {
        rssi: i16,
        success: bool,
    },
}

impl<T: GattAdapter + ?Sized> GattAdapter for Box<T> {
    fn start_scan(&mut self) -> Result<(), AdapterError> {
        (**self).start_scan()
    }

    fn stop_scan(&mut self) -> Result<(), AdapterError> {
        (**self).stop_scan()
    }

    fn connect_to(&mut self, peer: &PeerId) -> Result<(), AdapterError> {
        (**self).connect_to(peer)
    }

    fn close_link(&mut self) -> Result<(), AdapterError> {
        (**self).close_link()
    }

    fn discover_services(&mut self) -> Result<(), AdapterError> {
        (**self).discover_services()
    }

    fn write_characteristic(
        &mut self,
        handle: CharacteristicHandle,
        value: &[u8],
    ) -> Result<(), AdapterError> {
        (**self).write_characteristic(handle, value)
    }

    fn enable_notifications(
        &mut self,
        handle: CharacteristicHandle,
        enabled: bool,
    ) -> Result<(), AdapterError> {
        (**self).enable_notifications(handle, enabled)
    }

    fn read_rssi(&mut self) -> Result<(), AdapterError> {
        (**self).read_rssi()
    }
}
