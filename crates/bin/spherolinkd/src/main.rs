//! # spherolinkd: robot telemetry daemon
//!
//! Composition root that wires the BLE adapter to the GATT session.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize structured logging
//! - Open the `btleplug` adapter and spawn the session driver
//! - Scan for the configured robot and connect
//! - Request the firmware version once ready, then poll RSSI and power state
//! - Log a status line on every stats update
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no session logic belongs here.

mod config;

use std::sync::Arc;

use spherolink_adapter_ble::BtleplugAdapter;
use spherolink_app::publisher::StatePublisher;
use spherolink_app::{GattSession, SessionHandle, spawn_session};
use spherolink_domain::command::Query;
use spherolink_domain::event::SessionEventKind;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Broadcast capacity for session events.
const EVENT_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Adapter
    let (adapter, adapter_events, worker) = BtleplugAdapter::start(&config.ble).await?;

    // Session
    let publisher = Arc::new(StatePublisher::new(EVENT_CAPACITY));
    let session = GattSession::new(adapter, publisher);
    let (handle, driver) = spawn_session(session, adapter_events);

    tracing::info!(target_prefix = %config.robot.target_prefix, "looking for robot");
    handle.connect(config.robot.target_prefix.clone()).await?;

    tokio::select! {
        () = monitor(&handle, &config) => tracing::warn!("session driver stopped"),
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupted, shutting down");
        }
    }

    if let Err(err) = handle.shutdown().await {
        tracing::debug!(%err, "session already stopped");
    }
    drop(handle);
    driver.await?;
    worker.await?;

    Ok(())
}

/// Follow the session until its driver stops.
async fn monitor(handle: &SessionHandle, config: &Config) {
    let mut snapshots = handle.subscribe_snapshot();
    let mut events = handle.subscribe_events();
    let mut poll = tokio::time::interval(config.poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ready = false;

    loop {
        tokio::select! {
            () = handle.closed() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let now_ready = snapshots.borrow_and_update().ready;
                if now_ready && !ready && config.telemetry.request_version_on_ready {
                    request(handle, Query::Version).await;
                }
                ready = now_ready;
            }
            _ = poll.tick() => {
                if ready {
                    if let Err(err) = handle.request_rssi_update().await {
                        tracing::warn!(%err, "rssi request failed");
                    }
                    request(handle, Query::PowerState).await;
                }
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event.kind),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event observer lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }
}

async fn request(handle: &SessionHandle, query: Query) {
    if let Err(err) = handle.query(query).await {
        tracing::warn!(%err, ?query, "telemetry request failed");
    }
}

fn log_event(kind: &SessionEventKind) {
    match kind {
        SessionEventKind::StateChanged { from, to } => {
            tracing::info!(%from, %to, "session state changed");
        }
        SessionEventKind::StatsUpdated { stats } => {
            tracing::info!(status = %stats.status_line(), "robot status");
        }
        SessionEventKind::DecodeFailed { tag, error } => {
            tracing::warn!(%tag, %error, "response dropped");
        }
        SessionEventKind::WriteFailed { characteristic } => {
            tracing::warn!(?characteristic, "write failed");
        }
    }
}
