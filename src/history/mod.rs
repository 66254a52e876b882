//! Client-side bookkeeping
//!
//! - Conversation history (append-only, persisted as one JSON blob)
//! - Locally remembered API keys
//! - The key-value stores both sit on

mod entry;
mod keys;
mod log;
mod store;

pub use entry::{HistoryBlob, HistoryEntry, HistoryStats};
pub use keys::ApiKeyStore;
pub use log::{ConversationHistory, HISTORY_KEY};
pub use store::{FileStore, KvStore, MemoryStore};
