//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the session core and the radio stack.
//! They are defined here (in `app`) so that both the state machine and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod gatt;

pub use gatt::{AdapterEvent, DiscoveredCharacteristic, GattAdapter};
