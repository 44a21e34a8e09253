//! A terminal client for a retrieval-augmented chat service.
//!
//! The service exposes `GET /chat/history/{session_id}`, which returns the stored
//! transcript, and `POST /chat`, which answers with a raw UTF-8 text stream.
//! [`ChatController`] keeps a stable session identifier, hydrates the
//! transcript once, and grows each assistant reply in place as chunks
//! arrive. [`sanitize`] strips citation tags from math spans for display.

pub mod chat;
pub mod client;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod history;
pub mod identity;
pub mod render;
pub mod sanitize;
pub mod types;

mod observability;

#[cfg(test)]
mod testing;

pub use client::{ByteStream, ChatBackend, ChatClient};
pub use controller::{ChatController, SendOutcome, SessionStats};
pub use decoder::Utf8StreamDecoder;
pub use error::{Error, Result};
pub use history::load_history;
pub use identity::{FileStore, KeyValueStore, MemoryStore, get_or_create_session_id};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use sanitize::{sanitize, settled_len};
pub use types::*;
