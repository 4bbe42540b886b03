//! Tether is a terminal chat client that talks to a chat server over one
//! persistent WebSocket.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns session state: the connection manager, the stream
//!   accumulator, the transcript and the render pipeline.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and command execution used
//!   by the chat loop.
//! - [`utils`] holds the syntect highlighter and logging setup.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
