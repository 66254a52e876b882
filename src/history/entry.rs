use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Creation time in epoch milliseconds
    pub id: i64,

    /// What the user said
    pub user: String,

    /// What the assistant answered
    pub bot: String,

    /// Persona tag the answer was produced under
    pub persona: String,

    /// Local wall-clock time of the exchange (HH:MM:SS)
    pub timestamp: String,

    /// Sequence number, 1-based, strictly increasing
    pub message_number: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_messages: u64,
    pub current_persona: String,
}

impl Default for HistoryStats {
    fn default() -> Self {
        Self {
            total_messages: 0,
            current_persona: "default".to_string(),
        }
    }
}

/// Persisted blob under `voiceAgent_history`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBlob {
    #[serde(default)]
    pub conversations: Vec<HistoryEntry>,

    #[serde(default)]
    pub stats: HistoryStats,

    pub last_updated: Option<DateTime<Utc>>,
}
