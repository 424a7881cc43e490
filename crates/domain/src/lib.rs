//! # spherolink-domain
//!
//! Pure domain model for controlling a BLE toy robot.
//!
//! ## Responsibilities
//! - Foundational types: session states, response tags, error conventions
//! - Define the **characteristic table** (five vendor UUIDs and their roles)
//! - Define **device stats** (firmware version, power state, battery, RSSI)
//! - Decode **response packets** received on the `notify` characteristic
//! - Encode the **query commands** whose answers those packets carry
//! - Define **session events** published to observers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! The radio boundary is expressed as a trait in the `app` crate (port).

pub mod error;

pub mod characteristic;
pub mod command;
pub mod device;
pub mod event;
pub mod packet;
pub mod response;
pub mod session;
pub mod stats;
