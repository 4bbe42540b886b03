//! Session state and the single dispatch step.
//!
//! [`Session`] owns every piece of mutable chat state: the connection
//! manager, the stream accumulator and the transcript. It is driven by one
//! loop that feeds it [`SessionEvent`]s in arrival order, so nothing here
//! needs a lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

use crate::core::attachments::{self, AttachOutcome, AttachmentMeta};
use crate::core::connection::{ConnectionManager, Connector, SessionEvent};
use crate::core::envelope::Envelope;
use crate::core::input::{self, SendOutcome};
use crate::core::markup::RenderPipeline;
use crate::core::message::AppMessageKind;
use crate::core::render::render_message;
use crate::core::stream::{AppendOutcome, FinishedStream, StreamAccumulator};
use crate::core::transcript::{EntryId, Transcript};

pub const CONNECTED_NOTICE: &str = "Connected to chat server";
pub const DISCONNECTED_NOTICE: &str = "Disconnected from chat server";
pub const TRANSPORT_ERROR_NOTICE: &str = "Error in WebSocket connection";

/// What a dispatched event changed, for callers that react to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    None,
    Connected,
    Disconnected,
    TransportError,
    Reconnecting,
    StreamStarted(EntryId),
    StreamAppended(AppendOutcome),
    StreamFinished(Option<FinishedStream>),
    MessageAppended(EntryId),
}

pub struct Session {
    pub connection: ConnectionManager,
    pub stream: StreamAccumulator,
    pub transcript: Transcript,
    pipeline: RenderPipeline,
}

impl Session {
    pub fn new(connection: ConnectionManager, pipeline: RenderPipeline) -> Self {
        Self {
            connection,
            stream: StreamAccumulator::new(),
            transcript: Transcript::new(),
            pipeline,
        }
    }

    /// Builds a session together with the receiving end of its event channel.
    pub fn with_connector(
        endpoint: Url,
        reconnect_delay: Duration,
        connector: Arc<dyn Connector>,
        pipeline: RenderPipeline,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ConnectionManager::new(endpoint, reconnect_delay, connector, tx);
        (Self::new(connection, pipeline), rx)
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn start(&mut self) {
        self.connection.connect();
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> SessionUpdate {
        match event {
            SessionEvent::Opened { generation } => {
                if !self.connection.on_opened(generation) {
                    return SessionUpdate::None;
                }
                self.transcript
                    .push_notice(AppMessageKind::Info, CONNECTED_NOTICE);
                SessionUpdate::Connected
            }
            SessionEvent::Frame { generation, text } => {
                if !self.connection.is_current(generation) {
                    debug!(generation, "Dropping frame from replaced transport");
                    return SessionUpdate::None;
                }
                self.handle_frame(&text)
            }
            SessionEvent::TransportError {
                generation,
                message,
            } => {
                if !self.connection.on_error(generation, &message) {
                    return SessionUpdate::None;
                }
                self.transcript
                    .push_notice(AppMessageKind::Error, TRANSPORT_ERROR_NOTICE);
                SessionUpdate::TransportError
            }
            SessionEvent::Closed { generation } => {
                if !self.connection.on_closed(generation) {
                    return SessionUpdate::None;
                }
                self.transcript
                    .push_notice(AppMessageKind::Warning, DISCONNECTED_NOTICE);
                SessionUpdate::Disconnected
            }
            SessionEvent::ReconnectDue { generation } => {
                if self.connection.on_reconnect_due(generation) {
                    SessionUpdate::Reconnecting
                } else {
                    SessionUpdate::None
                }
            }
        }
    }

    fn handle_frame(&mut self, text: &str) -> SessionUpdate {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, frame = text, "Dropping malformed frame");
                return SessionUpdate::None;
            }
        };
        self.dispatch(envelope)
    }

    pub fn dispatch(&mut self, envelope: Envelope) -> SessionUpdate {
        match envelope {
            Envelope::StreamStart => {
                let entry = match self.stream.begin(&mut self.transcript) {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "Nested stream_start; finalizing orphaned entry");
                        self.stream.end();
                        match self.stream.begin(&mut self.transcript) {
                            Ok(entry) => entry,
                            Err(err) => {
                                warn!(error = %err, "Unable to start stream");
                                return SessionUpdate::None;
                            }
                        }
                    }
                };
                SessionUpdate::StreamStarted(entry)
            }
            Envelope::StreamContent { content } => SessionUpdate::StreamAppended(
                self.stream
                    .append(&content, &mut self.transcript, &self.pipeline),
            ),
            Envelope::StreamEnd => {
                let finished = self.stream.end();
                if finished.is_none() {
                    debug!("stream_end with no active stream; ignoring");
                }
                SessionUpdate::StreamFinished(finished)
            }
            Envelope::Message { role, content } => SessionUpdate::MessageAppended(render_message(
                &mut self.transcript,
                &self.pipeline,
                role.into(),
                &content,
            )),
        }
    }

    pub fn submit_input(&mut self, text: &str) -> SendOutcome {
        input::submit(text, &mut self.connection, &mut self.transcript)
    }

    pub fn attach_files(&mut self, files: Vec<AttachmentMeta>) -> AttachOutcome {
        attachments::attach_files(&mut self.transcript, files)
    }

    /// Resolves local paths into attachments. The batch limit applies to the
    /// whole selection; a path that cannot be read only drops that file.
    pub fn attach_paths(&mut self, paths: &[PathBuf]) -> AttachOutcome {
        if paths.len() > attachments::MAX_FILES {
            return attachments::reject_batch(&mut self.transcript, paths.len());
        }

        let mut files = Vec::with_capacity(paths.len());
        let mut unreadable = 0;
        for path in paths {
            match AttachmentMeta::from_path(path) {
                Ok(meta) => files.push(meta),
                Err(err) => {
                    unreadable += 1;
                    self.transcript
                        .push_notice(AppMessageKind::Error, err.to_string());
                }
            }
        }

        let mut outcome = self.attach_files(files);
        outcome.rejected += unreadable;
        outcome
    }

    pub fn shutdown(&mut self) {
        self.connection.shutdown();
    }
}
