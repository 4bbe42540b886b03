//! TUI-less "say" command
//!
//! Connects once, sends a single message and prints the first assistant
//! reply to stdout.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use crate::core::constants::RECONNECT_DELAY;
use crate::core::input::SendOutcome;
use crate::core::markup::{NoopHighlighter, RenderPipeline};
use crate::core::message::TranscriptRole;
use crate::core::session::{Session, SessionUpdate};
use crate::core::transcript::DisplayContent;
use crate::core::transport::WsConnector;
use crate::ui::chat_loop::ChatOptions;
use crate::ui::markdown::MarkdownRenderer;
use crate::ui::theme::Theme;
use tracing::{debug, info};

#[derive(Debug)]
pub enum SayError {
    EmptyPrompt,
    NotSent(SendOutcome),
    ConnectionLost,
}

impl std::fmt::Display for SayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SayError::EmptyPrompt => write!(f, "Usage: tether say <message>"),
            SayError::NotSent(outcome) => write!(f, "Message was not sent ({outcome:?})"),
            SayError::ConnectionLost => write!(f, "Connection closed before a reply arrived"),
        }
    }
}

impl Error for SayError {}

/// Tracks what has been printed of the reply so far.
#[derive(Debug)]
struct ReplyPrinter {
    markdown: bool,
    printed: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    More,
    Done,
}

impl ReplyPrinter {
    fn new(markdown: bool) -> Self {
        Self {
            markdown,
            printed: 0,
        }
    }

    /// Writes whatever `update` adds to the reply. Returns [`Step::Done`]
    /// once a full assistant reply has been written.
    fn observe<W: Write>(
        &mut self,
        session: &Session,
        update: &SessionUpdate,
        out: &mut W,
    ) -> io::Result<Step> {
        match update {
            SessionUpdate::StreamStarted(_) => {
                self.printed = 0;
                Ok(Step::More)
            }
            SessionUpdate::StreamAppended(_) if !self.markdown => {
                let raw = session.stream.raw();
                if let Some(fresh) = raw.get(self.printed..) {
                    out.write_all(fresh.as_bytes())?;
                    out.flush()?;
                }
                self.printed = raw.len();
                Ok(Step::More)
            }
            SessionUpdate::StreamFinished(Some(finished)) => {
                if self.markdown {
                    let rendered = session.pipeline().render_rich(&finished.raw);
                    writeln!(out, "{}", rendered.plain_text())?;
                } else {
                    if let Some(rest) = finished.raw.get(self.printed..) {
                        out.write_all(rest.as_bytes())?;
                    }
                    writeln!(out)?;
                }
                Ok(Step::Done)
            }
            SessionUpdate::MessageAppended(id) => {
                let Some(entry) = session.transcript.get(*id) else {
                    return Ok(Step::More);
                };
                if entry.role != TranscriptRole::Assistant {
                    debug!(role = entry.role.as_str(), "Skipping non-assistant message");
                    return Ok(Step::More);
                }
                match entry.display() {
                    Some(DisplayContent::Plain(text)) => writeln!(out, "{text}")?,
                    Some(DisplayContent::Rich(markup)) => writeln!(out, "{}", markup.plain_text())?,
                    None => return Ok(Step::More),
                }
                Ok(Step::Done)
            }
            _ => Ok(Step::More),
        }
    }
}

fn say_pipeline(markdown: bool) -> RenderPipeline {
    if markdown {
        RenderPipeline::new(
            Box::new(MarkdownRenderer::new(Theme::dark_default())),
            Box::new(NoopHighlighter),
        )
    } else {
        RenderPipeline::plain()
    }
}

pub async fn run_say(prompt: Vec<String>, options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err(SayError::EmptyPrompt.into());
    }

    let (mut session, mut events) = Session::with_connector(
        options.endpoint.clone(),
        RECONNECT_DELAY,
        Arc::new(WsConnector),
        say_pipeline(options.markdown),
    );
    let mut printer = ReplyPrinter::new(options.markdown);
    let mut stdout = io::stdout();
    let mut sent = false;

    info!(endpoint = %options.endpoint, "Sending one-shot message");
    session.start();

    let result: Result<(), Box<dyn Error>> = loop {
        let Some(event) = events.recv().await else {
            break Err(SayError::ConnectionLost.into());
        };
        let update = session.handle_event(event);
        match update {
            SessionUpdate::Connected if !sent => match session.submit_input(&prompt) {
                SendOutcome::Sent(_) => sent = true,
                outcome => break Err(SayError::NotSent(outcome).into()),
            },
            SessionUpdate::Disconnected | SessionUpdate::TransportError => {
                break Err(SayError::ConnectionLost.into());
            }
            ref other if sent => match printer.observe(&session, other, &mut stdout) {
                Ok(Step::Done) => break Ok(()),
                Ok(Step::More) => {}
                Err(err) => break Err(err.into()),
            },
            _ => {}
        }
    };

    session.shutdown();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection::testing::RecordingConnector;
    use crate::core::envelope::Envelope;
    use std::time::Duration;
    use url::Url;

    fn session(markdown: bool) -> Session {
        let (session, _rx) = Session::with_connector(
            Url::parse("ws://localhost:9000/ws").unwrap(),
            Duration::from_secs(1),
            Arc::new(RecordingConnector::default()),
            say_pipeline(markdown),
        );
        session
    }

    fn feed(
        session: &mut Session,
        printer: &mut ReplyPrinter,
        out: &mut Vec<u8>,
        envelope: Envelope,
    ) -> Step {
        let update = session.dispatch(envelope);
        printer.observe(session, &update, out).unwrap()
    }

    fn content(text: &str) -> Envelope {
        Envelope::StreamContent {
            content: text.to_string(),
        }
    }

    #[tokio::test]
    async fn raw_stream_is_printed_as_it_arrives() {
        let mut session = session(false);
        let mut printer = ReplyPrinter::new(false);
        let mut out = Vec::new();

        assert_eq!(feed(&mut session, &mut printer, &mut out, Envelope::StreamStart), Step::More);
        feed(&mut session, &mut printer, &mut out, content("Hel"));
        assert_eq!(String::from_utf8_lossy(&out), "Hel");
        feed(&mut session, &mut printer, &mut out, content("lo **x**"));
        assert_eq!(
            feed(&mut session, &mut printer, &mut out, Envelope::StreamEnd),
            Step::Done
        );
        assert_eq!(String::from_utf8_lossy(&out), "Hello **x**\n");
    }

    #[tokio::test]
    async fn markdown_stream_is_rendered_once_at_the_end() {
        let mut session = session(true);
        let mut printer = ReplyPrinter::new(true);
        let mut out = Vec::new();

        feed(&mut session, &mut printer, &mut out, Envelope::StreamStart);
        feed(&mut session, &mut printer, &mut out, content("# Title\n"));
        assert!(out.is_empty());
        feed(&mut session, &mut printer, &mut out, content("some *text*"));
        assert_eq!(
            feed(&mut session, &mut printer, &mut out, Envelope::StreamEnd),
            Step::Done
        );
        let printed = String::from_utf8_lossy(&out);
        assert!(printed.contains("Title"));
        assert!(printed.contains("some text"));
        assert!(!printed.contains('*'));
    }

    #[tokio::test]
    async fn only_assistant_messages_finish_the_reply() {
        let mut session = session(false);
        let mut printer = ReplyPrinter::new(false);
        let mut out = Vec::new();

        let echo = Envelope::parse(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(feed(&mut session, &mut printer, &mut out, echo), Step::More);
        assert!(out.is_empty());

        let reply = Envelope::parse(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert_eq!(feed(&mut session, &mut printer, &mut out, reply), Step::Done);
        assert_eq!(String::from_utf8_lossy(&out), "hello\n");
    }
}
