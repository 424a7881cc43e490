//! [`GattAdapter`] implementation that queues requests for the worker task.

use btleplug::api::{Central as _, Manager as _};
use btleplug::platform::Manager;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use spherolink_app::ports::{AdapterEvent, GattAdapter};
use spherolink_app::AdapterError;
use spherolink_domain::characteristic::CharacteristicHandle;
use spherolink_domain::device::PeerId;

use crate::config::BleConfig;
use crate::error::BleError;
use crate::worker::Worker;

/// One queued port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
    StartScan,
    StopScan,
    ConnectTo(PeerId),
    CloseLink,
    DiscoverServices,
    Write(CharacteristicHandle, Vec<u8>),
    EnableNotifications(CharacteristicHandle, bool),
    ReadRssi,
}

/// `btleplug`-backed GATT adapter.
///
/// Cheap to move into a session; the heavy lifting happens on the worker
/// task spawned by [`start`](Self::start).
pub struct BtleplugAdapter {
    requests: mpsc::UnboundedSender<Request>,
}

impl BtleplugAdapter {
    /// Open the configured host adapter and spawn the worker task.
    ///
    /// Returns the adapter, the receiver the session driver must consume,
    /// and the worker's join handle.
    ///
    /// # Errors
    ///
    /// Returns [`BleError::NotAvailable`] when the host has no adapter,
    /// [`BleError::AdapterIndex`] when `adapter_index` is out of range, or
    /// [`BleError::Btleplug`] if the stack cannot be opened.
    pub async fn start(
        config: &BleConfig,
    ) -> Result<(Self, mpsc::Receiver<AdapterEvent>, JoinHandle<()>), BleError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        if adapters.is_empty() {
            return Err(BleError::NotAvailable);
        }
        let available = adapters.len();
        let central = adapters
            .into_iter()
            .nth(config.adapter_index)
            .ok_or(BleError::AdapterIndex {
                index: config.adapter_index,
                available,
            })?;

        let central_events = central.events().await?;
        tracing::info!(index = config.adapter_index, "BLE adapter opened");

        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer);

        let worker = Worker::new(central, events_tx, config.write_with_response);
        let handle = tokio::spawn(worker.run(requests_rx, central_events));

        Ok((
            Self {
                requests: requests_tx,
            },
            events_rx,
            handle,
        ))
    }

    fn enqueue(&self, request: Request) -> Result<(), AdapterError> {
        self.requests
            .send(request)
            .map_err(|_| AdapterError::Closed)
    }
}

impl GattAdapter for BtleplugAdapter {
    fn start_scan(&mut self) -> Result<(), AdapterError> {
        self.enqueue(Request::StartScan)
    }

    fn stop_scan(&mut self) -> Result<(), AdapterError> {
        self.enqueue(Request::StopScan)
    }

    fn connect_to(&mut self, peer: &PeerId) -> Result<(), AdapterError> {
        self.enqueue(Request::ConnectTo(peer.clone()))
    }

    fn close_link(&mut self) -> Result<(), AdapterError> {
        self.enqueue(Request::CloseLink)
    }

    fn discover_services(&mut self) -> Result<(), AdapterError> {
        self.enqueue(Request::DiscoverServices)
    }

    fn write_characteristic(
        &mut self,
        handle: CharacteristicHandle,
        value: &[u8],
    ) -> Result<(), AdapterError> {
        self.enqueue(Request::Write(handle, value.to_vec()))
    }

    fn enable_notifications(
        &mut self,
        handle: CharacteristicHandle,
        enabled: bool,
    ) -> Result<(), AdapterError> {
        self.enqueue(Request::EnableNotifications(handle, enabled))
    }

    fn read_rssi(&mut self) -> Result<(), AdapterError> {
        self.enqueue(Request::ReadRssi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> (BtleplugAdapter, mpsc::UnboundedReceiver<Request>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (BtleplugAdapter { requests: tx }, rx)
    }

    #[test]
    fn should_enqueue_requests_in_call_order() {
        let (mut adapter, mut rx) = adapter();
        let handle = CharacteristicHandle::new(3);

        adapter.stop_scan().unwrap();
        adapter.start_scan().unwrap();
        adapter.connect_to(&PeerId::new("hci0/dev_AA")).unwrap();
        adapter.write_characteristic(handle, &[0x07]).unwrap();
        adapter.enable_notifications(handle, true).unwrap();
        adapter.read_rssi().unwrap();

        let mut seen = Vec::new();
        while let Ok(request) = rx.try_recv() {
            seen.push(request);
        }
        assert_eq!(
            seen,
            vec![
                Request::StopScan,
                Request::StartScan,
                Request::ConnectTo(PeerId::new("hci0/dev_AA")),
                Request::Write(handle, vec![0x07]),
                Request::EnableNotifications(handle, true),
                Request::ReadRssi,
            ]
        );
    }

    #[test]
    fn should_report_closed_when_worker_is_gone() {
        let (mut adapter, rx) = adapter();
        drop(rx);
        assert_eq!(adapter.start_scan(), Err(AdapterError::Closed));
        assert_eq!(adapter.close_link(), Err(AdapterError::Closed));
    }
}
