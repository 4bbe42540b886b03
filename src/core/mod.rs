pub mod attachments;
pub mod config;
pub mod connection;
pub mod constants;
pub mod envelope;
pub mod input;
pub mod markup;
pub mod message;
pub mod render;
pub mod session;
pub mod stream;
pub mod transcript;
pub mod transport;
