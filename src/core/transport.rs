//! WebSocket transport backed by tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::core::connection::{ConnectRequest, Connector, Generation, SessionEvent};

#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn spawn(&self, request: ConnectRequest) {
        tokio::spawn(run_connection(request));
    }
}

fn report(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) -> bool {
    events.send(event).is_ok()
}

fn report_failure(
    events: &mpsc::UnboundedSender<SessionEvent>,
    generation: Generation,
    message: String,
) {
    let _ = events.send(SessionEvent::TransportError {
        generation,
        message,
    });
    let _ = events.send(SessionEvent::Closed { generation });
}

async fn run_connection(request: ConnectRequest) {
    let ConnectRequest {
        endpoint,
        generation,
        events,
        mut outbound,
        cancel,
    } = request;

    let connected = tokio::select! {
        result = tokio_tungstenite::connect_async(endpoint.as_str()) => result,
        _ = cancel.cancelled() => return,
    };

    let socket = match connected {
        Ok((socket, _response)) => socket,
        Err(err) => {
            warn!(%endpoint, generation, error = %err, "WebSocket connect failed");
            report_failure(&events, generation, err.to_string());
            return;
        }
    };

    if !report(&events, SessionEvent::Opened { generation }) {
        return;
    }

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.close().await;
                return;
            }
            frame = outbound.recv() => {
                let Some(text) = frame else {
                    // The handle was dropped without cancelling.
                    let _ = sink.close().await;
                    return;
                };
                if let Err(err) = sink.send(Message::Text(text)).await {
                    warn!(generation, error = %err, "WebSocket send failed");
                    report_failure(&events, generation, err.to_string());
                    return;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if !report(&events, SessionEvent::Frame { generation, text }) {
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(generation, ?frame, "Server closed the WebSocket");
                    break;
                }
                Some(Ok(other)) => {
                    debug!(generation, kind = ?other, "Ignoring non-text frame");
                }
                Some(Err(err)) => {
                    warn!(generation, error = %err, "WebSocket receive failed");
                    report_failure(&events, generation, err.to_string());
                    return;
                }
                None => break,
            }
        }
    }

    let _ = events.send(SessionEvent::Closed { generation });
}
