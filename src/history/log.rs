use super::entry::{HistoryBlob, HistoryEntry, HistoryStats};
use super::store::KvStore;
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{info, warn};

pub const HISTORY_KEY: &str = "voiceAgent_history";

/// Append-only conversation log mirrored into a key-value store
///
/// The in-memory log is authoritative for the running process; every
/// mutation rewrites the whole persisted blob. Storage failures are logged
/// and never undo the in-memory change.
pub struct ConversationHistory {
    store: Arc<dyn KvStore>,
    entries: Vec<HistoryEntry>,
    stats: HistoryStats,
}

impl ConversationHistory {
    /// Rebuild the log from the store; missing or malformed data yields an empty log
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let blob = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<HistoryBlob>(&raw) {
                Ok(blob) => Some(blob),
                Err(e) => {
                    warn!("Discarding malformed history: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Could not load history: {:#}", e);
                None
            }
        };

        let (entries, stats) = match blob {
            Some(blob) => (blob.conversations, blob.stats),
            None => (Vec::new(), HistoryStats::default()),
        };

        info!("Loaded history: {} conversations", entries.len());

        Self {
            store,
            entries,
            stats,
        }
    }

    /// Record a completed exchange under the next sequence number
    pub fn append(&mut self, user: &str, bot: &str, persona: &str) -> &HistoryEntry {
        let now = Local::now();
        let entry = HistoryEntry {
            id: now.timestamp_millis(),
            user: user.to_string(),
            bot: bot.to_string(),
            persona: persona.to_string(),
            timestamp: now.format("%H:%M:%S").to_string(),
            message_number: self.next_sequence(),
        };

        self.entries.push(entry);
        self.stats.total_messages += 1;
        self.save();

        let entry = &self.entries[self.entries.len() - 1];
        info!("Added to history: #{} ({})", entry.message_number, entry.persona);
        entry
    }

    /// Drop every entry, in memory and in the store
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.total_messages = 0;

        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("Could not clear persisted history: {:#}", e);
        }
        info!("History cleared");
    }

    pub fn set_current_persona(&mut self, persona: &str) {
        if self.stats.current_persona != persona {
            self.stats.current_persona = persona.to_string();
            self.save();
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn stats(&self) -> &HistoryStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_sequence(&self) -> u64 {
        self.entries.last().map_or(1, |e| e.message_number + 1)
    }

    fn save(&self) {
        if let Err(e) = self.persist() {
            warn!("Could not save history: {:#}", e);
        }
    }

    fn persist(&self) -> Result<()> {
        let blob = HistoryBlob {
            conversations: self.entries.clone(),
            stats: self.stats.clone(),
            last_updated: Some(Utc::now()),
        };
        let raw = serde_json::to_string(&blob).context("Failed to encode history")?;
        self.store.set(HISTORY_KEY, &raw)
    }
}
