//! Append-only conversation transcript.
//!
//! Entries are only ever pushed. The one exception to immutability is the
//! live streaming entry, whose display is replaced through
//! [`Transcript::replace_display`] until the stream finishes.

use crate::core::attachments::AttachmentMeta;
use crate::core::markup::RenderedMarkup;
use crate::core::message::{AppMessageKind, TranscriptRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayContent {
    /// Shown verbatim; line breaks become visual line breaks.
    Plain(String),
    /// Output of the rich-text renderer.
    Rich(RenderedMarkup),
}

impl DisplayContent {
    pub fn is_empty(&self) -> bool {
        match self {
            DisplayContent::Plain(text) => text.is_empty(),
            DisplayContent::Rich(markup) => markup.blocks.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    Message(DisplayContent),
    Attachment(AttachmentMeta),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub role: TranscriptRole,
    pub body: EntryBody,
}

impl TranscriptEntry {
    pub fn display(&self) -> Option<&DisplayContent> {
        match &self.body {
            EntryBody::Message(display) => Some(display),
            EntryBody::Attachment(_) => None,
        }
    }

    pub fn attachment(&self) -> Option<&AttachmentMeta> {
        match &self.body {
            EntryBody::Attachment(meta) => Some(meta),
            EntryBody::Message(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
    scroll_requests: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn get(&self, id: EntryId) -> Option<&TranscriptEntry> {
        // Ids are handed out in push order, so the index search is exact.
        self.entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn push(&mut self, role: TranscriptRole, body: EntryBody) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(TranscriptEntry { id, role, body });
        id
    }

    pub fn push_plain(&mut self, role: TranscriptRole, text: impl Into<String>) -> EntryId {
        self.push(role, EntryBody::Message(DisplayContent::Plain(text.into())))
    }

    /// Appends a local notice and scrolls to it.
    pub fn push_notice(&mut self, kind: AppMessageKind, text: impl Into<String>) -> EntryId {
        let id = self.push_plain(kind.as_role(), text);
        self.scroll_to_end();
        id
    }

    pub(crate) fn replace_display(&mut self, id: EntryId, display: DisplayContent) -> bool {
        let Ok(index) = self.entries.binary_search_by_key(&id, |entry| entry.id) else {
            return false;
        };
        match &mut self.entries[index].body {
            EntryBody::Message(current) => {
                *current = display;
                true
            }
            EntryBody::Attachment(_) => false,
        }
    }

    /// Asks the attached view to follow the tail on its next draw.
    pub fn scroll_to_end(&mut self) {
        self.scroll_requests += 1;
    }

    /// Monotonic count of scroll-to-end requests; views compare it with the
    /// value they last honoured.
    pub fn scroll_requests(&self) -> u64 {
        self.scroll_requests
    }
}
