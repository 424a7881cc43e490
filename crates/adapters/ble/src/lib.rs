//! # spherolink-adapter-ble
//!
//! `btleplug` binding for the [`GattAdapter`](spherolink_app::ports::GattAdapter) port.
//!
//! ## How it works
//!
//! [`BtleplugAdapter`] is a thin request queue: every port method pushes a
//! request onto an unbounded channel and returns immediately. A worker task
//! owns the `btleplug` central and the connected peripheral, executes the
//! requests in order and reports the outcome as
//! [`AdapterEvent`](spherolink_app::ports::AdapterEvent)s on a bounded
//! channel that feeds the session driver.
//!
//! | Request | btleplug call | Answer event |
//! |---------|---------------|--------------|
//! | start/stop scan | `Central::start_scan` / `stop_scan` | `AdvertisementSeen` per discovered/updated peripheral |
//! | connect | `Peripheral::connect` | `ConnectionStateChanged` |
//! | discover | `Peripheral::discover_services` | `ServicesDiscovered` |
//! | write | `Peripheral::write` | `CharacteristicWritten` |
//! | notifications | `Peripheral::subscribe` + `notifications` | `CharacteristicChanged` per value |
//! | read RSSI | `Peripheral::properties` | `RssiRead` |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `spherolink-app` and `spherolink-domain`.

mod adapter;
mod config;
mod error;
mod worker;

pub use adapter::BtleplugAdapter;
pub use config::BleConfig;
pub use error::BleError;
