//! Lifecycle of the single transport connection.
//!
//! [`ConnectionManager`] owns at most one [`TransportHandle`]. Every connect
//! bumps a generation counter and replaces the handle; events tagged with an
//! older generation are stale and ignored. Connection tasks and reconnect
//! timers never touch session state directly, they only post
//! [`SessionEvent`]s to the session's channel.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened { generation: Generation },
    Frame { generation: Generation, text: String },
    TransportError { generation: Generation, message: String },
    Closed { generation: Generation },
    ReconnectDue { generation: Generation },
}

impl SessionEvent {
    pub fn generation(&self) -> Generation {
        match self {
            SessionEvent::Opened { generation }
            | SessionEvent::Frame { generation, .. }
            | SessionEvent::TransportError { generation, .. }
            | SessionEvent::Closed { generation }
            | SessionEvent::ReconnectDue { generation } => *generation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Connecting,
    Open,
    Closed,
}

impl TransportStatus {
    pub fn label(self) -> &'static str {
        match self {
            TransportStatus::Connecting => "connecting",
            TransportStatus::Open => "connected",
            TransportStatus::Closed => "disconnected",
        }
    }
}

/// Everything a connection task needs to run one transport.
pub struct ConnectRequest {
    pub endpoint: Url,
    pub generation: Generation,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub outbound: mpsc::UnboundedReceiver<String>,
    pub cancel: CancellationToken,
}

/// Starts a transport task. Implementations must report the outcome only
/// through `request.events`: `Opened` once established, `Frame` per inbound
/// text frame, `TransportError` on failure and `Closed` when the transport
/// ends for any reason other than cancellation.
pub trait Connector: Send + Sync {
    fn spawn(&self, request: ConnectRequest);
}

struct TransportHandle {
    generation: Generation,
    status: TransportStatus,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

struct PendingReconnect {
    generation: Generation,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub enum TransportError {
    NotConnected,
    NotOpen(TransportStatus),
    Encode(serde_json::Error),
    /// The connection task has already exited.
    ChannelClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => write!(f, "no transport exists"),
            TransportError::NotOpen(status) => {
                write!(f, "transport is not open ({})", status.label())
            }
            TransportError::Encode(err) => write!(f, "failed to encode frame: {err}"),
            TransportError::ChannelClosed => write!(f, "transport task has stopped"),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TransportError::Encode(err) => Some(err),
            _ => None,
        }
    }
}

pub struct ConnectionManager {
    endpoint: Url,
    reconnect_delay: Duration,
    connector: Arc<dyn Connector>,
    events: mpsc::UnboundedSender<SessionEvent>,
    handle: Option<TransportHandle>,
    generation: Generation,
    pending_reconnect: Option<PendingReconnect>,
    shutdown: CancellationToken,
    connect_attempts: u64,
}

impl ConnectionManager {
    pub fn new(
        endpoint: Url,
        reconnect_delay: Duration,
        connector: Arc<dyn Connector>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            endpoint,
            reconnect_delay,
            connector,
            events,
            handle: None,
            generation: 0,
            pending_reconnect: None,
            shutdown: CancellationToken::new(),
            connect_attempts: 0,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn status(&self) -> Option<TransportStatus> {
        self.handle.as_ref().map(|handle| handle.status)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn reconnect_pending(&self) -> bool {
        self.pending_reconnect.is_some()
    }

    /// Replaces the transport handle with a fresh connection attempt.
    pub fn connect(&mut self) -> Generation {
        if self.shutdown.is_cancelled() {
            debug!("Connect requested after shutdown; ignoring");
            return self.generation;
        }

        self.cancel_pending_reconnect();
        if let Some(previous) = self.handle.take() {
            previous.cancel.cancel();
        }

        self.generation += 1;
        self.connect_attempts += 1;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = self.shutdown.child_token();

        info!(
            endpoint = %self.endpoint,
            generation = self.generation,
            attempt = self.connect_attempts,
            "Connecting to chat server"
        );
        self.connector.spawn(ConnectRequest {
            endpoint: self.endpoint.clone(),
            generation: self.generation,
            events: self.events.clone(),
            outbound: outbound_rx,
            cancel: cancel.clone(),
        });

        self.handle = Some(TransportHandle {
            generation: self.generation,
            status: TransportStatus::Connecting,
            outbound: outbound_tx,
            cancel,
        });
        self.generation
    }

    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        let handle = self.handle.as_ref().ok_or(TransportError::NotConnected)?;
        if handle.status != TransportStatus::Open {
            return Err(TransportError::NotOpen(handle.status));
        }
        handle
            .outbound
            .send(frame)
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn current_handle_mut(&mut self, generation: Generation) -> Option<&mut TransportHandle> {
        match self.handle.as_mut() {
            Some(handle) if handle.generation == generation => Some(handle),
            _ => {
                debug!(generation, current = self.generation, "Ignoring stale transport event");
                None
            }
        }
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.generation == generation)
    }

    /// Returns false when the event belongs to a replaced transport.
    pub fn on_opened(&mut self, generation: Generation) -> bool {
        let Some(handle) = self.current_handle_mut(generation) else {
            return false;
        };
        handle.status = TransportStatus::Open;
        info!(generation, "Connected to chat server");
        true
    }

    pub fn on_error(&mut self, generation: Generation, message: &str) -> bool {
        if self.current_handle_mut(generation).is_none() {
            return false;
        }
        warn!(generation, error = message, "Transport error");
        true
    }

    /// Marks the transport closed and schedules exactly one reconnect.
    pub fn on_closed(&mut self, generation: Generation) -> bool {
        let Some(handle) = self.current_handle_mut(generation) else {
            return false;
        };
        handle.status = TransportStatus::Closed;
        info!(generation, "Disconnected from chat server");
        self.schedule_reconnect();
        true
    }

    /// Fires the reconnect scheduled for `generation`, unless something else
    /// has connected in the meantime.
    pub fn on_reconnect_due(&mut self, generation: Generation) -> bool {
        let due = self
            .pending_reconnect
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !due || generation != self.generation {
            debug!(generation, "Reconnect timer superseded");
            return false;
        }
        self.pending_reconnect = None;
        self.connect();
        true
    }

    fn schedule_reconnect(&mut self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.cancel_pending_reconnect();

        let generation = self.generation;
        let cancel = self.shutdown.child_token();
        let timer_cancel = cancel.clone();
        let events = self.events.clone();
        let delay = self.reconnect_delay;

        debug!(generation, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = events.send(SessionEvent::ReconnectDue { generation });
                }
                _ = timer_cancel.cancelled() => {}
            }
        });

        self.pending_reconnect = Some(PendingReconnect { generation, cancel });
    }

    fn cancel_pending_reconnect(&mut self) {
        if let Some(pending) = self.pending_reconnect.take() {
            pending.cancel.cancel();
        }
    }

    /// Stops the live transport and any pending reconnect. Further connect
    /// requests are ignored.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.pending_reconnect = None;
        if let Some(handle) = self.handle.take() {
            debug!(generation = handle.generation, "Transport shut down");
        }
    }
}
