//! GATT session: the connection lifecycle state machine.
//!
//! ```text
//! Idle ──connect()──▶ Scanning ──device selected──▶ Connecting
//!   Connecting ──connected──▶ DiscoveringServices ──services──▶ Initializing ──▶ Ready
//!   Connecting/DiscoveringServices/Initializing/Ready ──link failure──▶ Error ──▶ Disconnected
//!   Ready ──disconnect()──▶ Disconnected
//! ```
//!
//! All transitions happen inside [`GattSession::handle_event`] or the
//! explicit operations, on a single context. Nothing is retried: after a
//! failure the caller must invoke [`connect`](GattSession::connect) again.

use std::sync::Arc;

use spherolink_domain::characteristic::{CharacteristicHandle, CharacteristicName};
use spherolink_domain::command::Query;
use spherolink_domain::device::PeerId;
use spherolink_domain::event::{SessionEvent, SessionEventKind};
use spherolink_domain::packet::{self, ResponseFrame, Telemetry};
use spherolink_domain::response::ResponseTag;
use spherolink_domain::session::SessionState;
use spherolink_domain::stats::DeviceStats;

use crate::correlator::ResponseCorrelator;
use crate::error::SessionError;
use crate::init_sequencer::InitSequencer;
use crate::ports::{AdapterEvent, DiscoveredCharacteristic, GattAdapter};
use crate::publisher::{SessionSnapshot, StatePublisher};
use crate::registry::CharacteristicRegistry;
use crate::scanner::DeviceScanner;

pub struct GattSession<A> {
    adapter: A,
    state: SessionState,
    scanner: DeviceScanner,
    registry: CharacteristicRegistry,
    correlator: ResponseCorrelator,
    stats: DeviceStats,
    publisher: Arc<StatePublisher>,
}

impl<A: GattAdapter> GattSession<A> {
    /// Create an idle session and publish its initial snapshot.
    pub fn new(adapter: A, publisher: Arc<StatePublisher>) -> Self {
        let session = Self {
            adapter,
            state: SessionState::Idle,
            scanner: DeviceScanner::new(),
            registry: CharacteristicRegistry::new(),
            correlator: ResponseCorrelator::new(),
            stats: DeviceStats::default(),
            publisher,
        };
        session.publish_snapshot();
        session
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    #[must_use]
    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    #[must_use]
    pub fn pending_response(&self) -> Option<ResponseTag> {
        self.correlator.pending()
    }

    #[must_use]
    pub fn registry(&self) -> &CharacteristicRegistry {
        &self.registry
    }

    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    #[must_use]
    pub fn publisher(&self) -> &Arc<StatePublisher> {
        &self.publisher
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Start scanning for a device whose name starts with `target_prefix`.
    ///
    /// No-op while ready or while a link attempt is underway.
    pub fn connect(&mut self, target_prefix: &str) {
        if self.state.is_ready() {
            tracing::debug!("connect ignored, session already ready");
            return;
        }
        if self.state.is_linking() {
            tracing::debug!(state = %self.state, "connect ignored, link attempt in progress");
            return;
        }

        match self.scanner.start_scan(&mut self.adapter, target_prefix) {
            Ok(()) => self.transition(SessionState::Scanning),
            Err(err) => tracing::error!(%err, "failed to start scan"),
        }
    }

    /// Tear down a ready session. No-op in any other state.
    pub fn disconnect(&mut self) {
        if !self.state.is_ready() {
            tracing::debug!(state = %self.state, "disconnect ignored, session not ready");
            return;
        }
        tracing::info!("disconnecting");
        self.close();
    }

    /// Write a command to the `roll` characteristic.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] outside the ready state,
    /// [`SessionError::UnresolvedCharacteristic`] when `roll` was not
    /// discovered, or [`SessionError::Adapter`] if the write cannot be enqueued.
    pub fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if !self.state.is_ready() {
            return Err(SessionError::NotReady);
        }
        let handle = self.registry.require(CharacteristicName::Roll)?;
        self.adapter.write_characteristic(handle, data)?;
        Ok(())
    }

    /// Tag the next `notify` payload.
    ///
    /// Returns the tag this one displaced, if the previous answer never came.
    pub fn set_expected_response(&mut self, tag: ResponseTag) -> Option<ResponseTag> {
        let displaced = self.correlator.set_expected_response(tag);
        if let Some(previous) = displaced {
            tracing::warn!(%previous, %tag, "overwriting unanswered response tag");
        }
        displaced
    }

    /// Ask the adapter for a fresh RSSI reading.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] outside the ready state or
    /// [`SessionError::Adapter`] if the request cannot be enqueued.
    pub fn request_rssi_update(&mut self) -> Result<(), SessionError> {
        if !self.state.is_ready() {
            return Err(SessionError::NotReady);
        }
        self.adapter.read_rssi()?;
        Ok(())
    }

    /// Tag the answer to `query` and send it with sequence number `seq`.
    ///
    /// If the command cannot be sent the response slot is left as it was.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn query(&mut self, query: Query, seq: u8) -> Result<(), SessionError> {
        if !self.state.is_ready() {
            return Err(SessionError::NotReady);
        }
        let displaced = self.set_expected_response(query.response_tag());
        let result = self.send(&query.encode(seq));
        if let Err(err) = &result {
            tracing::warn!(%err, ?query, "query not sent");
            self.correlator.restore(displaced);
        }
        result
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    /// Single entry point for adapter callbacks.
    pub fn handle_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::AdvertisementSeen { peer, name, rssi } => {
                self.on_advertisement(peer, name, rssi);
            }
            AdapterEvent::ConnectionStateChanged { success, connected } => {
                self.on_connection_state_changed(success, connected);
            }
            AdapterEvent::ServicesDiscovered {
                success,
                characteristics,
            } => self.on_services_discovered(success, &characteristics),
            AdapterEvent::CharacteristicWritten { handle, success } => {
                self.on_characteristic_written(handle, success);
            }
            AdapterEvent::CharacteristicChanged { uuid, value } => {
                self.on_characteristic_changed(uuid, &value);
            }
            AdapterEvent::RssiRead { rssi, success } => self.on_rssi_read(rssi, success),
        }
    }

    fn on_advertisement(&mut self, peer: PeerId, name: Option<String>, rssi: Option<i16>) {
        if self.state != SessionState::Scanning {
            return;
        }
        let Some(device) = self
            .scanner
            .on_advertisement(&mut self.adapter, peer, name, rssi)
        else {
            return;
        };

        if let Some(rssi) = device.rssi {
            self.stats.rssi = rssi;
        }

        tracing::info!(peer = %device.peer, name = %device.name, "connecting to device");
        match self.adapter.connect_to(&device.peer) {
            Ok(()) => self.transition(SessionState::Connecting),
            Err(err) => {
                tracing::error!(%err, "failed to request connection");
                self.fail_link();
            }
        }
    }

    fn on_connection_state_changed(&mut self, success: bool, connected: bool) {
        match self.state {
            SessionState::Connecting if success && connected => {
                tracing::info!("connection established, discovering services");
                match self.adapter.discover_services() {
                    Ok(()) => self.transition(SessionState::DiscoveringServices),
                    Err(err) => {
                        tracing::error!(%err, "failed to request service discovery");
                        self.fail_link();
                    }
                }
            }
            SessionState::Connecting
            | SessionState::DiscoveringServices
            | SessionState::Initializing
            | SessionState::Ready => {
                if success && connected {
                    tracing::debug!(state = %self.state, "redundant connected event ignored");
                    return;
                }
                tracing::error!(state = %self.state, success, connected, "connection error");
                self.fail_link();
            }
            _ => {
                tracing::debug!(
                    state = %self.state,
                    success,
                    connected,
                    "connection event ignored"
                );
            }
        }
    }

    fn on_services_discovered(
        &mut self,
        success: bool,
        characteristics: &[DiscoveredCharacteristic],
    ) {
        if self.state != SessionState::DiscoveringServices {
            tracing::debug!(state = %self.state, "services event ignored");
            return;
        }
        if !success {
            tracing::error!("service discovery failed");
            self.fail_link();
            return;
        }

        let missing = self.registry.resolve(characteristics);
        for name in &missing {
            tracing::warn!(characteristic = %name, uuid = %name.uuid(), "characteristic not found");
        }
        self.transition(SessionState::Initializing);

        let outcome = InitSequencer::run(&mut self.adapter, &self.registry);
        for (characteristic, _) in outcome.failures {
            self.publisher.publish_event(SessionEvent::new(SessionEventKind::WriteFailed {
                characteristic: Some(characteristic),
            }));
        }
        self.transition(SessionState::Ready);

        if let Err(err) = InitSequencer::enable_notifications(&mut self.adapter, &self.registry) {
            tracing::error!(%err, "failed to enable notifications");
        }
    }

    fn on_characteristic_written(&mut self, handle: CharacteristicHandle, success: bool) {
        if success {
            tracing::trace!(%handle, "characteristic write succeeded");
            return;
        }
        let characteristic = self.registry.name_of(handle);
        tracing::error!(%handle, ?characteristic, "characteristic write failed");
        self.publisher
            .publish_event(SessionEvent::new(SessionEventKind::WriteFailed { characteristic }));
    }

    fn on_characteristic_changed(&mut self, uuid: uuid::Uuid, value: &[u8]) {
        if !self.state.is_ready() {
            tracing::trace!(state = %self.state, "notification without active session dropped");
            return;
        }
        if CharacteristicName::from_uuid(uuid) != Some(CharacteristicName::Notify) {
            return;
        }

        let tag = self.correlator.consume();
        tracing::trace!(payload = %packet::hex(value), ?tag, "notification received");

        if let Err(err) = packet::check_header(value) {
            tracing::debug!(%err, "notification dropped");
            return;
        }
        let Some(tag) = tag else {
            tracing::debug!("untagged response dropped");
            return;
        };

        match packet::decode(value, tag) {
            Ok(frame) => self.apply_frame(&frame),
            Err(err) => {
                tracing::warn!(%err, %tag, "failed to decode response");
                self.publisher
                    .publish_event(SessionEvent::decode_failed(tag, err));
            }
        }
    }

    fn apply_frame(&mut self, frame: &ResponseFrame) {
        match &frame.telemetry {
            Telemetry::Version(report) => tracing::info!(
                seq = frame.sequence,
                dlen = frame.data_len,
                recv = report.record_version,
                mdl = %report.model,
                hw = report.hardware_revision,
                msa = %report.main_app_version(),
                bl = %report.bootloader,
                bas = %report.basic,
                overlay_manager = %report.overlay_manager,
                "version response"
            ),
            Telemetry::PowerState(report) => tracing::info!(
                seq = frame.sequence,
                dlen = frame.data_len,
                power_state = %report.power_state,
                battery_voltage = report.battery_voltage,
                num_recharges = report.num_recharges,
                secs_since_recharge = report.secs_since_recharge,
                "power state response"
            ),
        }

        self.stats.apply(&frame.telemetry);
        self.publish_stats();
    }

    fn on_rssi_read(&mut self, rssi: i16, success: bool) {
        if !success {
            tracing::debug!("rssi read failed");
            return;
        }
        if !self.state.is_ready() {
            return;
        }
        self.stats.rssi = rssi;
        self.publish_stats();
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Abort the current link attempt: `Error`, then `Disconnected`.
    fn fail_link(&mut self) {
        self.transition(SessionState::Error);
        self.close();
    }

    /// Close the link and reset everything a disconnect discards.
    fn close(&mut self) {
        if let Err(err) = self.adapter.close_link() {
            tracing::warn!(%err, "failed to close link");
        }
        self.registry.clear();
        self.scanner.reset();
        self.stats = DeviceStats::default();
        self.transition(SessionState::Disconnected);
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(%from, %to, "session state changed");
        self.publisher
            .publish_event(SessionEvent::state_changed(from, to));
        self.publish_snapshot();
    }

    fn publish_stats(&self) {
        self.publisher
            .publish_event(SessionEvent::stats_updated(self.stats.clone()));
        self.publish_snapshot();
    }

    fn publish_snapshot(&self) {
        self.publisher
            .publish_snapshot(SessionSnapshot::new(self.state, self.stats.clone()));
    }
}
