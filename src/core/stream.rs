//! Incremental rendering for a streamed assistant message.
//!
//! Fragments are accumulated into `raw`. A fragment containing a line break
//! triggers a full re-render of `raw`; any other fragment just shows `raw`
//! verbatim until the next boundary. Parsing once per line instead of once
//! per fragment keeps the cost bounded without an incremental parser.

use std::error::Error as StdError;
use std::fmt;

use memchr::memchr2;
use tracing::debug;

use crate::core::markup::RenderPipeline;
use crate::core::message::TranscriptRole;
use crate::core::transcript::{DisplayContent, EntryId, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// No stream was active.
    Ignored,
    /// The accumulated text is shown raw, awaiting a line boundary.
    Pending,
    /// The accumulated text was re-rendered as rich text.
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedStream {
    pub entry: EntryId,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    AlreadyActive { entry: EntryId },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::AlreadyActive { entry } => {
                write!(f, "a stream is already active on entry {}", entry.get())
            }
        }
    }
}

impl StdError for StreamError {}

/// Any of `\n`, `\r\n` or `\r`.
pub fn contains_line_break(fragment: &str) -> bool {
    memchr2(b'\n', b'\r', fragment.as_bytes()).is_some()
}

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    raw: String,
    live: Option<EntryId>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.live.is_some()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn live_entry(&self) -> Option<EntryId> {
        self.live
    }

    pub fn begin(&mut self, transcript: &mut Transcript) -> Result<EntryId, StreamError> {
        if let Some(entry) = self.live {
            return Err(StreamError::AlreadyActive { entry });
        }

        self.raw.clear();
        let entry = transcript.push_plain(TranscriptRole::Assistant, String::new());
        self.live = Some(entry);
        debug!(entry = entry.get(), "Stream started");
        Ok(entry)
    }

    pub fn append(
        &mut self,
        fragment: &str,
        transcript: &mut Transcript,
        pipeline: &RenderPipeline,
    ) -> AppendOutcome {
        let Some(entry) = self.live else {
            debug!("Stream content received with no active stream; ignoring");
            return AppendOutcome::Ignored;
        };

        self.raw.push_str(fragment);

        let outcome = if contains_line_break(fragment) {
            let markup = pipeline.render_rich(&self.raw);
            transcript.replace_display(entry, DisplayContent::Rich(markup));
            AppendOutcome::Rendered
        } else {
            transcript.replace_display(entry, DisplayContent::Plain(self.raw.clone()));
            AppendOutcome::Pending
        };

        transcript.scroll_to_end();
        outcome
    }

    /// Releases the live entry. Its last display stands as-is; a trailing
    /// fragment without a line break stays unrendered.
    pub fn end(&mut self) -> Option<FinishedStream> {
        let entry = self.live.take()?;
        let raw = std::mem::take(&mut self.raw);
        debug!(entry = entry.get(), bytes = raw.len(), "Stream finished");
        Some(FinishedStream { entry, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markup::testing::recording_pipeline;

    fn display_of(transcript: &Transcript, id: EntryId) -> DisplayContent {
        transcript.get(id).unwrap().display().unwrap().clone()
    }

    #[test]
    fn detects_all_line_ending_styles() {
        assert!(contains_line_break("a\nb"));
        assert!(contains_line_break("a\r\nb"));
        assert!(contains_line_break("a\rb"));
        assert!(!contains_line_break("plain words"));
        assert!(!contains_line_break(""));
    }

    #[test]
    fn begin_creates_empty_assistant_entry() {
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        let id = stream.begin(&mut transcript).unwrap();

        let entry = transcript.get(id).unwrap();
        assert_eq!(entry.role, TranscriptRole::Assistant);
        assert!(entry.display().unwrap().is_empty());
        assert!(stream.is_active());
        assert_eq!(stream.live_entry(), Some(id));
    }

    #[test]
    fn begin_refuses_to_nest() {
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        let id = stream.begin(&mut transcript).unwrap();
        assert_eq!(
            stream.begin(&mut transcript),
            Err(StreamError::AlreadyActive { entry: id })
        );
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn raw_is_concatenation_regardless_of_branch() {
        let (pipeline, _, _) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        stream.begin(&mut transcript).unwrap();

        let fragments = ["Hel", "lo\n", "wor", "ld\r\n", "```\n", "x", "\n```", " tail"];
        for fragment in fragments {
            stream.append(fragment, &mut transcript, &pipeline);
        }

        let finished = stream.end().unwrap();
        assert_eq!(finished.raw, fragments.concat());
        assert!(!stream.is_active());
        assert_eq!(stream.raw(), "");
    }

    #[test]
    fn fragment_without_break_shows_raw_without_rendering() {
        let (pipeline, renderer, highlighter) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        let id = stream.begin(&mut transcript).unwrap();

        assert_eq!(
            stream.append("**bold", &mut transcript, &pipeline),
            AppendOutcome::Pending
        );
        assert_eq!(
            stream.append(" text**", &mut transcript, &pipeline),
            AppendOutcome::Pending
        );

        assert_eq!(
            display_of(&transcript, id),
            DisplayContent::Plain("**bold text**".into())
        );
        assert!(renderer.calls.lock().unwrap().is_empty());
        assert_eq!(*highlighter.calls.lock().unwrap(), 0);
    }

    #[test]
    fn fragment_with_break_renders_whole_buffer() {
        let (pipeline, renderer, highlighter) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        let id = stream.begin(&mut transcript).unwrap();

        stream.append("intro ", &mut transcript, &pipeline);
        stream.append("line\n```\ncode", &mut transcript, &pipeline);
        let outcome = stream.append("\n```\n", &mut transcript, &pipeline);
        assert_eq!(outcome, AppendOutcome::Rendered);

        let raw = "intro line\n```\ncode\n```\n";
        assert_eq!(renderer.calls.lock().unwrap().last().unwrap(), raw);

        let expected = pipeline.render_rich(raw);
        match display_of(&transcript, id) {
            DisplayContent::Rich(markup) => {
                assert_eq!(markup, expected);
                assert_eq!(markup.code_blocks().count(), 1);
                assert!(markup.code_blocks().all(|b| b.highlighted));
            }
            other => panic!("expected rich display, got {other:?}"),
        }
        // The second append ends inside an open fence and yields no block;
        // the third yields one, and so does the comparison render above.
        assert_eq!(*highlighter.calls.lock().unwrap(), 2);
    }

    #[test]
    fn break_in_earlier_fragment_does_not_force_render() {
        let (pipeline, renderer, _) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        let id = stream.begin(&mut transcript).unwrap();

        stream.append("first\n", &mut transcript, &pipeline);
        stream.append("*second", &mut transcript, &pipeline);

        assert_eq!(renderer.calls.lock().unwrap().len(), 1);
        assert_eq!(
            display_of(&transcript, id),
            DisplayContent::Plain("first\n*second".into())
        );
    }

    #[test]
    fn end_keeps_last_display() {
        let (pipeline, _, _) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        let id = stream.begin(&mut transcript).unwrap();

        stream.append("done\n", &mut transcript, &pipeline);
        stream.append("`unrendered`", &mut transcript, &pipeline);
        let finished = stream.end().unwrap();

        assert_eq!(finished.entry, id);
        assert_eq!(
            display_of(&transcript, id),
            DisplayContent::Plain("done\n`unrendered`".into())
        );
    }

    #[test]
    fn inactive_stream_ignores_content_and_end() {
        let (pipeline, _, _) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();

        assert_eq!(
            stream.append("orphan\n", &mut transcript, &pipeline),
            AppendOutcome::Ignored
        );
        assert!(stream.end().is_none());
        assert!(transcript.is_empty());
        assert_eq!(transcript.scroll_requests(), 0);
    }

    #[test]
    fn every_append_scrolls_to_end() {
        let (pipeline, _, _) = recording_pipeline();
        let mut transcript = Transcript::new();
        let mut stream = StreamAccumulator::new();
        stream.begin(&mut transcript).unwrap();

        stream.append("a", &mut transcript, &pipeline);
        stream.append("b\n", &mut transcript, &pipeline);
        assert_eq!(transcript.scroll_requests(), 2);
    }
}
