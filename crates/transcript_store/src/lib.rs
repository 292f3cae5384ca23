//! Durable conversation transcripts over SQLite.
//!
//! One conversation owns an ordered sequence of turns; appends are atomic,
//! the most recent turn can be rolled back, and deleting a conversation
//! cascades to everything it owns.

mod error;
mod paths;
mod records;
mod store;

pub use error::TranscriptStoreError;
pub use paths::{data_root, default_db_path};
pub use records::{Conversation, ConversationSummary, Role, Turn, TurnMetadata};
pub use store::TranscriptStore;
