use tracing::{debug, warn};

use crate::core::connection::{ConnectionManager, TransportError, TransportStatus};
use crate::core::envelope::OutboundMessage;
use crate::core::message::{AppMessageKind, TranscriptRole};
use crate::core::transcript::{EntryId, Transcript};

pub const NOT_CONNECTED_NOTICE: &str = "Not connected to server";
pub const RECONNECTING_NOTICE: &str = "Connection lost. Reconnecting...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing but whitespace was typed.
    Empty,
    /// No transport has ever been created.
    NotConnected,
    /// The transport was not open; a connect was started instead.
    Reconnecting,
    /// The frame could not be handed to the transport.
    Failed,
    /// The frame was sent and echoed into the transcript. The caller should
    /// clear its input field.
    Sent(EntryId),
}

/// Sends the trimmed input as a user message, or explains locally why not.
pub fn submit(
    input: &str,
    connection: &mut ConnectionManager,
    transcript: &mut Transcript,
) -> SendOutcome {
    let message = input.trim();
    if message.is_empty() {
        debug!("Message is empty, not sending");
        return SendOutcome::Empty;
    }

    match connection.status() {
        None => {
            transcript.push_notice(AppMessageKind::Error, NOT_CONNECTED_NOTICE);
            return SendOutcome::NotConnected;
        }
        Some(TransportStatus::Open) => {}
        Some(status) => {
            debug!(status = status.label(), "Transport not open, reconnecting");
            transcript.push_notice(AppMessageKind::Warning, RECONNECTING_NOTICE);
            connection.connect();
            return SendOutcome::Reconnecting;
        }
    }

    let frame = match OutboundMessage::user(message).to_frame() {
        Ok(frame) => frame,
        Err(err) => return report_failure(transcript, TransportError::Encode(err)),
    };

    if let Err(err) = connection.send(frame) {
        return report_failure(transcript, err);
    }

    let id = transcript.push_plain(TranscriptRole::User, message);
    transcript.scroll_to_end();
    SendOutcome::Sent(id)
}

fn report_failure(transcript: &mut Transcript, err: TransportError) -> SendOutcome {
    warn!(error = %err, "Failed to send message");
    transcript.push_notice(
        AppMessageKind::Error,
        format!("Failed to send message: {err}"),
    );
    SendOutcome::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection::testing::manager_with_recorder;
    use crate::core::transcript::DisplayContent;
    use std::time::Duration;

    fn last_text(transcript: &Transcript) -> String {
        match transcript.last().and_then(|e| e.display()) {
            Some(DisplayContent::Plain(text)) => text.clone(),
            other => panic!("expected plain entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn whitespace_input_sends_nothing() {
        let (mut manager, connector, _rx) = manager_with_recorder(Duration::from_secs(1));
        let generation = manager.connect();
        manager.on_opened(generation);
        let mut transcript = Transcript::new();

        for input in ["", "   ", "\n\t "] {
            assert_eq!(
                submit(input, &mut manager, &mut transcript),
                SendOutcome::Empty
            );
        }
        assert!(transcript.is_empty());
        assert!(connector.sent_frames(generation).is_empty());
    }

    #[tokio::test]
    async fn missing_transport_reports_not_connected() {
        let (mut manager, connector, _rx) = manager_with_recorder(Duration::from_secs(1));
        let mut transcript = Transcript::new();

        assert_eq!(
            submit("hello", &mut manager, &mut transcript),
            SendOutcome::NotConnected
        );
        assert_eq!(last_text(&transcript), NOT_CONNECTED_NOTICE);
        assert_eq!(connector.count(), 0);
    }

    #[tokio::test]
    async fn closed_transport_triggers_exactly_one_connect() {
        let (mut manager, connector, _rx) = manager_with_recorder(Duration::from_secs(1));
        let generation = manager.connect();
        manager.on_opened(generation);
        manager.on_closed(generation);
        let mut transcript = Transcript::new();

        assert_eq!(
            submit("hello", &mut manager, &mut transcript),
            SendOutcome::Reconnecting
        );
        assert_eq!(connector.count(), 2);
        assert_eq!(last_text(&transcript), RECONNECTING_NOTICE);
        assert_eq!(transcript.len(), 1);
        assert!(connector.sent_frames(generation).is_empty());
        assert!(connector.sent_frames(manager.generation()).is_empty());
        assert!(!manager.reconnect_pending());
    }

    #[tokio::test]
    async fn open_transport_sends_trimmed_frame_and_echoes() {
        let (mut manager, connector, _rx) = manager_with_recorder(Duration::from_secs(1));
        let generation = manager.connect();
        manager.on_opened(generation);
        let mut transcript = Transcript::new();

        let outcome = submit("  hi *there*  \n", &mut manager, &mut transcript);
        let SendOutcome::Sent(id) = outcome else {
            panic!("expected sent, got {outcome:?}");
        };

        assert_eq!(
            connector.sent_frames(generation),
            [r#"{"content":"hi *there*","role":"user"}"#.to_string()]
        );
        let entry = transcript.get(id).unwrap();
        assert_eq!(entry.role, TranscriptRole::User);
        assert_eq!(last_text(&transcript), "hi *there*");
    }
}
