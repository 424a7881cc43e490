//! # spherolink-app
//!
//! Application layer: the GATT session state machine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **downward port** the radio stack binding must implement:
//!   - `GattAdapter`: scan, connect, discover, write, subscribe, read RSSI
//!   - `AdapterEvent`: the callback events the binding delivers back
//! - Own the **session lifecycle**: scan → connect → discover → initialize → ready
//! - Resolve characteristics, run the init handshake, correlate responses
//! - Publish **snapshots and events** to observers (watch + broadcast channels)
//! - Provide the **driver task** and a cloneable `SessionHandle` for callers
//!
//! ## Dependency rule
//! Depends on `spherolink-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod correlator;
pub mod driver;
pub mod error;
pub mod init_sequencer;
pub mod ports;
pub mod publisher;
pub mod registry;
pub mod scanner;
pub mod session;

pub use driver::{SessionHandle, spawn_session};
pub use error::{AdapterError, SessionError};
pub use session::GattSession;
