//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that feeds input and connection
//!   events into [`crate::core::session::Session`].
//! - [`renderer`]: frame composition for the transcript, title and input.
//! - [`markdown`] and [`theme`]: rich-text rendering and style policy.
//!
//! This layer presents and captures interaction state, while [`crate::core`]
//! owns the chat protocol and transcript.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod theme;
