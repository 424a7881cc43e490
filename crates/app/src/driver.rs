//! Session driver: the single task that owns a [`GattSession`].
//!
//! Adapter events and caller requests are funnelled into one `select!` loop,
//! so every state mutation happens on the same task. Callers talk to it
//! through a cloneable [`SessionHandle`].

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use spherolink_domain::command::{Query, Sequence};
use spherolink_domain::event::SessionEvent;
use spherolink_domain::response::ResponseTag;

use crate::error::SessionError;
use crate::ports::{AdapterEvent, GattAdapter};
use crate::publisher::{SessionSnapshot, StatePublisher};
use crate::session::GattSession;

const CONTROL_BUFFER: usize = 32;

/// Requests accepted by the driver loop.
#[derive(Debug)]
enum Control {
    Connect {
        target_prefix: String,
    },
    Disconnect,
    Send {
        data: Vec<u8>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    ExpectResponse(ResponseTag),
    Query {
        query: Query,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    RequestRssi,
    Shutdown,
}

/// Cloneable front end to a running session driver.
#[derive(Clone)]
pub struct SessionHandle {
    control: mpsc::Sender<Control>,
    publisher: Arc<StatePublisher>,
}

impl SessionHandle {
    async fn submit(&self, control: Control) -> Result<(), SessionError> {
        self.control
            .send(control)
            .await
            .map_err(|_| SessionError::Stopped)
    }

    async fn submit_with_reply(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<(), SessionError>>) -> Control,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.submit(build(reply)).await?;
        rx.await.map_err(|_| SessionError::Stopped)?
    }

    /// Start scanning for a device whose name starts with `target_prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] if the driver has exited.
    pub async fn connect(&self, target_prefix: impl Into<String>) -> Result<(), SessionError> {
        self.submit(Control::Connect {
            target_prefix: target_prefix.into(),
        })
        .await
    }

    /// Disconnect a ready session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] if the driver has exited.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        self.submit(Control::Disconnect).await
    }

    /// Write raw command bytes to the command characteristic.
    ///
    /// # Errors
    ///
    /// Propagates the result of [`GattSession::send`].
    pub async fn send(&self, data: Vec<u8>) -> Result<(), SessionError> {
        self.submit_with_reply(|reply| Control::Send { data, reply })
            .await
    }

    /// Tag the next response packet.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] if the driver has exited.
    pub async fn set_expected_response(&self, tag: ResponseTag) -> Result<(), SessionError> {
        self.submit(Control::ExpectResponse(tag)).await
    }

    /// Tag and send a telemetry query in one step.
    ///
    /// The driver assigns the sequence number.
    ///
    /// # Errors
    ///
    /// Propagates the result of [`GattSession::send`].
    pub async fn query(&self, query: Query) -> Result<(), SessionError> {
        self.submit_with_reply(|reply| Control::Query { query, reply })
            .await
    }

    /// Ask for a fresh RSSI reading.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] if the driver has exited.
    pub async fn request_rssi_update(&self) -> Result<(), SessionError> {
        self.submit(Control::RequestRssi).await
    }

    /// Disconnect if ready and stop the driver.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] if the driver has already exited.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.submit(Control::Shutdown).await
    }

    /// Resolve once the driver has stopped.
    ///
    /// Snapshot and event subscriptions stay open after that, since the
    /// publisher is shared with every handle.
    pub async fn closed(&self) {
        self.control.closed().await;
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.publisher.snapshot()
    }

    #[must_use]
    pub fn subscribe_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe_snapshot()
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.publisher.subscribe_events()
    }
}

/// Spawn the driver loop for `session`, fed by `events` from the adapter.
///
/// The loop ends on [`SessionHandle::shutdown`], when every handle is
/// dropped, or when the adapter event stream closes.
pub fn spawn_session<A>(
    session: GattSession<A>,
    events: mpsc::Receiver<AdapterEvent>,
) -> (SessionHandle, JoinHandle<()>)
where
    A: GattAdapter + Send + 'static,
{
    let (control_tx, control_rx) = mpsc::channel(CONTROL_BUFFER);
    let handle = SessionHandle {
        control: control_tx,
        publisher: Arc::clone(session.publisher()),
    };
    let task = tokio::spawn(run(session, events, control_rx));
    (handle, task)
}

async fn run<A: GattAdapter>(
    mut session: GattSession<A>,
    mut events: mpsc::Receiver<AdapterEvent>,
    mut control: mpsc::Receiver<Control>,
) {
    let mut sequence = Sequence::default();

    loop {
        tokio::select! {
            request = control.recv() => match request {
                Some(Control::Shutdown) | None => break,
                Some(request) => apply(&mut session, &mut sequence, request),
            },
            event = events.recv() => match event {
                Some(event) => session.handle_event(event),
                None => {
                    tracing::warn!("adapter event stream closed");
                    break;
                }
            },
        }
    }

    session.disconnect();
    tracing::debug!("session driver stopped");
}

fn apply<A: GattAdapter>(session: &mut GattSession<A>, sequence: &mut Sequence, request: Control) {
    match request {
        Control::Connect { target_prefix } => session.connect(&target_prefix),
        Control::Disconnect => session.disconnect(),
        Control::Send { data, reply } => {
            let _ = reply.send(session.send(&data));
        }
        Control::ExpectResponse(tag) => {
            session.set_expected_response(tag);
        }
        Control::Query { query, reply } => {
            let result = if session.is_ready() {
                session.query(query, sequence.next_seq())
            } else {
                Err(SessionError::NotReady)
            };
            let _ = reply.send(result);
        }
        Control::RequestRssi => {
            if let Err(err) = session.request_rssi_update() {
                tracing::debug!(%err, "rssi update skipped");
            }
        }
        Control::Shutdown => {}
    }
}
