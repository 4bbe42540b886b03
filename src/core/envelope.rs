//! JSON envelopes exchanged with the chat server.
//!
//! Inbound frames are discriminated by an optional `type` field. The three
//! stream markers carry their own `type`; anything else is a complete message
//! with a `role` and `content`.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::message::TranscriptRole;

pub const STREAM_START: &str = "stream_start";
pub const STREAM_CONTENT: &str = "stream_content";
pub const STREAM_END: &str = "stream_end";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
    System,
}

impl WireRole {
    pub fn as_str(self) -> &'static str {
        match self {
            WireRole::User => "user",
            WireRole::Assistant => "assistant",
            WireRole::System => "system",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(WireRole::User),
            "assistant" => Some(WireRole::Assistant),
            "system" => Some(WireRole::System),
            _ => None,
        }
    }
}

impl From<WireRole> for TranscriptRole {
    fn from(value: WireRole) -> Self {
        match value {
            WireRole::User => TranscriptRole::User,
            WireRole::Assistant => TranscriptRole::Assistant,
            WireRole::System => TranscriptRole::System,
        }
    }
}

/// One parsed inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    StreamStart,
    StreamContent { content: String },
    StreamEnd,
    Message { role: WireRole, content: String },
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl Envelope {
    pub fn parse(frame: &str) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_str(frame).map_err(EnvelopeError::Json)?;

        match raw.kind.as_deref() {
            Some(STREAM_START) => Ok(Envelope::StreamStart),
            Some(STREAM_END) => Ok(Envelope::StreamEnd),
            Some(STREAM_CONTENT) => {
                let content = raw.content.ok_or(EnvelopeError::MissingContent {
                    kind: STREAM_CONTENT,
                })?;
                Ok(Envelope::StreamContent { content })
            }
            _ => {
                let role = raw.role.ok_or(EnvelopeError::MissingRole)?;
                let role = WireRole::parse(&role).ok_or(EnvelopeError::UnknownRole(role))?;
                let content = raw
                    .content
                    .ok_or(EnvelopeError::MissingContent { kind: "message" })?;
                Ok(Envelope::Message { role, content })
            }
        }
    }
}

/// The only frame tether ever sends.
#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    pub content: &'a str,
    pub role: WireRole,
}

impl<'a> OutboundMessage<'a> {
    pub fn user(content: &'a str) -> Self {
        Self {
            content,
            role: WireRole::User,
        }
    }

    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug)]
pub enum EnvelopeError {
    /// The frame is not a JSON object of the expected shape.
    Json(serde_json::Error),

    /// A frame kind that requires `content` arrived without it.
    MissingContent { kind: &'static str },

    /// A complete message arrived without a `role`.
    MissingRole,

    /// A complete message named a role other than user, assistant or system.
    UnknownRole(String),
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::Json(err) => write!(f, "invalid envelope JSON: {err}"),
            EnvelopeError::MissingContent { kind } => {
                write!(f, "{kind} envelope is missing content")
            }
            EnvelopeError::MissingRole => write!(f, "message envelope is missing role"),
            EnvelopeError::UnknownRole(role) => write!(f, "unknown message role: {role}"),
        }
    }
}

impl StdError for EnvelopeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EnvelopeError::Json(err) => Some(err),
            _ => None,
        }
    }
}
