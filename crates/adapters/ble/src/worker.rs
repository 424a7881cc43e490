//! Worker task: executes queued requests against `btleplug`.
//!
//! Requests run one at a time in arrival order, so the handshake writes
//! reach the peripheral in the order the session issued them. Central
//! events and value notifications are interleaved between requests.

use std::collections::HashMap;
use std::pin::Pin;

use btleplug::api::{
    Central as _, CentralEvent, Characteristic, Peripheral as _, ScanFilter, ValueNotification,
    WriteType,
};
use btleplug::platform::{Adapter, Peripheral, PeripheralId};
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt as _};

use spherolink_app::ports::{AdapterEvent, DiscoveredCharacteristic};
use spherolink_domain::characteristic::CharacteristicHandle;
use spherolink_domain::device::PeerId;

use crate::adapter::Request;

type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// The connected peripheral and its discovered characteristics.
struct Link {
    peripheral: Peripheral,
    /// Indexed by [`CharacteristicHandle::raw`].
    characteristics: Vec<Characteristic>,
}

impl Link {
    fn characteristic(&self, handle: CharacteristicHandle) -> Option<&Characteristic> {
        self.characteristics.get(usize::from(handle.raw()))
    }
}

pub(crate) struct Worker {
    central: Adapter,
    events: mpsc::Sender<AdapterEvent>,
    write_type: WriteType,
    scanning: bool,
    /// Peripherals reported while scanning, by the id handed to the session.
    seen: HashMap<PeerId, PeripheralId>,
    link: Option<Link>,
    notifications: Option<BoxStream<ValueNotification>>,
}

impl Worker {
    pub(crate) fn new(
        central: Adapter,
        events: mpsc::Sender<AdapterEvent>,
        write_with_response: bool,
    ) -> Self {
        Self {
            central,
            events,
            write_type: if write_with_response {
                WriteType::WithResponse
            } else {
                WriteType::WithoutResponse
            },
            scanning: false,
            seen: HashMap::new(),
            link: None,
            notifications: None,
        }
    }

    /// Process requests until the adapter handle is dropped.
    pub(crate) async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut central_events: BoxStream<CentralEvent>,
    ) {
        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
                Some(event) = central_events.next() => self.handle_central_event(event).await,
                notification = next_notification(&mut self.notifications) => match notification {
                    Some(notification) => self.forward_notification(notification).await,
                    None => self.notifications = None,
                },
            }
        }

        self.close_link().await;
        tracing::debug!("BLE worker stopped");
    }

    async fn emit(&mut self, event: AdapterEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("session gone, adapter event dropped");
        }
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::StartScan => self.start_scan().await,
            Request::StopScan => self.stop_scan().await,
            Request::ConnectTo(peer) => self.connect_to(&peer).await,
            Request::CloseLink => self.close_link().await,
            Request::DiscoverServices => self.discover_services().await,
            Request::Write(handle, value) => self.write(handle, &value).await,
            Request::EnableNotifications(handle, enabled) => {
                self.enable_notifications(handle, enabled).await;
            }
            Request::ReadRssi => self.read_rssi().await,
        }
    }

    async fn start_scan(&mut self) {
        self.seen.clear();
        match self.central.start_scan(ScanFilter::default()).await {
            Ok(()) => self.scanning = true,
            Err(err) => tracing::error!(%err, "failed to start BLE scan"),
        }
    }

    async fn stop_scan(&mut self) {
        if !self.scanning {
            return;
        }
        self.scanning = false;
        if let Err(err) = self.central.stop_scan().await {
            tracing::debug!(%err, "failed to stop BLE scan cleanly");
        }
    }

    async fn handle_central_event(&mut self, event: CentralEvent) {
        match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                if self.scanning {
                    self.report_advertisement(id).await;
                }
            }
            CentralEvent::DeviceDisconnected(id) => {
                let ours = self
                    .link
                    .as_ref()
                    .is_some_and(|link| link.peripheral.id() == id);
                if ours {
                    tracing::warn!("peripheral disconnected");
                    self.link = None;
                    self.notifications = None;
                    self.emit(AdapterEvent::ConnectionStateChanged {
                        success: true,
                        connected: false,
                    })
                    .await;
                }
            }
            _ => {}
        }
    }

    async fn report_advertisement(&mut self, id: PeripheralId) {
        let Ok(peripheral) = self.central.peripheral(&id).await else {
            return;
        };
        let Ok(Some(props)) = peripheral.properties().await else {
            return;
        };

        let peer = PeerId::new(id.to_string());
        tracing::trace!(%peer, name = ?props.local_name, rssi = ?props.rssi, "advertisement");
        self.seen.insert(peer.clone(), id);
        self.emit(AdapterEvent::AdvertisementSeen {
            peer,
            name: props.local_name,
            rssi: props.rssi,
        })
        .await;
    }

    async fn connect_to(&mut self, peer: &PeerId) {
        let connected = match self.open_link(peer).await {
            Ok(peripheral) => {
                self.link = Some(Link {
                    peripheral,
                    characteristics: Vec::new(),
                });
                true
            }
            Err(err) => {
                tracing::error!(%err, %peer, "failed to connect");
                false
            }
        };
        self.emit(AdapterEvent::ConnectionStateChanged {
            success: connected,
            connected,
        })
        .await;
    }

    async fn open_link(&mut self, peer: &PeerId) -> Result<Peripheral, btleplug::Error> {
        let id = self
            .seen
            .get(peer)
            .ok_or(btleplug::Error::DeviceNotFound)?;
        let peripheral = self.central.peripheral(id).await?;
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        Ok(peripheral)
    }

    async fn close_link(&mut self) {
        self.notifications = None;
        if let Some(link) = self.link.take() {
            if let Err(err) = link.peripheral.disconnect().await {
                tracing::warn!(%err, "failed to disconnect peripheral");
            }
        }
    }

    async fn discover_services(&mut self) {
        let Some(link) = self.link.as_mut() else {
            self.emit(AdapterEvent::ServicesDiscovered {
                success: false,
                characteristics: Vec::new(),
            })
            .await;
            return;
        };

        let event = match link.peripheral.discover_services().await {
            Ok(()) => {
                link.characteristics = link.peripheral.characteristics().into_iter().collect();
                AdapterEvent::ServicesDiscovered {
                    success: true,
                    characteristics: assign_handles(&link.characteristics),
                }
            }
            Err(err) => {
                tracing::error!(%err, "service discovery failed");
                AdapterEvent::ServicesDiscovered {
                    success: false,
                    characteristics: Vec::new(),
                }
            }
        };
        self.emit(event).await;
    }

    async fn write(&mut self, handle: CharacteristicHandle, value: &[u8]) {
        let result = match self.link.as_ref() {
            Some(link) => match link.characteristic(handle) {
                Some(characteristic) => link
                    .peripheral
                    .write(characteristic, value, self.write_type)
                    .await,
                None => Err(btleplug::Error::NoSuchCharacteristic),
            },
            None => Err(btleplug::Error::NotConnected),
        };

        if let Err(err) = &result {
            tracing::debug!(%err, %handle, "write failed");
        }
        self.emit(AdapterEvent::CharacteristicWritten {
            handle,
            success: result.is_ok(),
        })
        .await;
    }

    async fn enable_notifications(&mut self, handle: CharacteristicHandle, enabled: bool) {
        let Some(link) = self.link.as_ref() else {
            tracing::warn!(%handle, "notification toggle without link");
            return;
        };
        let Some(characteristic) = link.characteristic(handle) else {
            tracing::warn!(%handle, "notification toggle on unknown handle");
            return;
        };

        let result = if enabled {
            link.peripheral.subscribe(characteristic).await
        } else {
            link.peripheral.unsubscribe(characteristic).await
        };
        if let Err(err) = result {
            tracing::error!(%err, %handle, enabled, "failed to toggle notifications");
            return;
        }

        if enabled && self.notifications.is_none() {
            match link.peripheral.notifications().await {
                Ok(stream) => self.notifications = Some(stream),
                Err(err) => tracing::error!(%err, "failed to open notification stream"),
            }
        }
    }

    async fn forward_notification(&mut self, notification: ValueNotification) {
        self.emit(AdapterEvent::CharacteristicChanged {
            uuid: notification.uuid,
            value: notification.value,
        })
        .await;
    }

    async fn read_rssi(&mut self) {
        let rssi = match self.link.as_ref() {
            Some(link) => link
                .peripheral
                .properties()
                .await
                .ok()
                .flatten()
                .and_then(|props| props.rssi),
            None => None,
        };
        self.emit(AdapterEvent::RssiRead {
            rssi: rssi.unwrap_or_default(),
            success: rssi.is_some(),
        })
        .await;
    }
}

/// Wait for the next notification, or forever when not subscribed.
async fn next_notification(
    stream: &mut Option<BoxStream<ValueNotification>>,
) -> Option<ValueNotification> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Number discovered characteristics by position.
///
/// The handle is the index into the link's characteristic list; positions
/// beyond `u16::MAX` are not addressable and are skipped.
fn assign_handles(characteristics: &[Characteristic]) -> Vec<DiscoveredCharacteristic> {
    characteristics
        .iter()
        .enumerate()
        .filter_map(|(index, characteristic)| {
            let raw = u16::try_from(index).ok()?;
            Some(DiscoveredCharacteristic {
                uuid: characteristic.uuid,
                handle: CharacteristicHandle::new(raw),
            })
        })
        .collect()
}
