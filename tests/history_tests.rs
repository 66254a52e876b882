// Tests for the conversation history and the stores behind it

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;
use voice_agent::backend::{ApiKeys, ApiService};
use voice_agent::history::{ApiKeyStore, ConversationHistory, FileStore, KvStore, MemoryStore, HISTORY_KEY};

#[test]
fn test_append_assigns_increasing_sequence_numbers() {
    let store = Arc::new(MemoryStore::new());
    let mut history = ConversationHistory::load(store);

    history.append("hello", "Hi there!", "default");
    history.append("how are you", "Great!", "storyteller");
    let third = history.append("bye", "Goodbye!", "default").clone();

    assert_eq!(history.len(), 3);
    assert_eq!(third.message_number, 3);
    assert_eq!(history.stats().total_messages, 3);

    let numbers: Vec<u64> = history.entries().iter().map(|e| e.message_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn test_history_survives_reload() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let store = Arc::new(FileStore::open(temp_dir.path())?);
        let mut history = ConversationHistory::load(store);
        history.append("hello", "Hi there!", "default");
        history.append("tell me a joke", "Why did the crab...", "storyteller");
    }

    let store = Arc::new(FileStore::open(temp_dir.path())?);
    let mut history = ConversationHistory::load(store);
    assert_eq!(history.len(), 2);
    assert_eq!(history.entries()[1].persona, "storyteller");

    // Numbering continues from the persisted log
    let next = history.append("again", "Sure", "default");
    assert_eq!(next.message_number, 3);

    Ok(())
}

#[test]
fn test_persisted_blob_shape() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut history = ConversationHistory::load(store.clone());
    history.append("hello", "Hi there!", "default");

    let raw = store.get(HISTORY_KEY)?.expect("history blob");
    let blob: serde_json::Value = serde_json::from_str(&raw)?;

    assert_eq!(blob["conversations"][0]["user"], "hello");
    assert_eq!(blob["conversations"][0]["bot"], "Hi there!");
    assert_eq!(blob["conversations"][0]["messageNumber"], 1);
    assert_eq!(blob["stats"]["totalMessages"], 1);
    assert_eq!(blob["stats"]["currentPersona"], "default");
    assert!(blob["lastUpdated"].is_string());

    Ok(())
}

#[test]
fn test_clear_empties_memory_and_store() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut history = ConversationHistory::load(store.clone());
    history.append("hello", "Hi there!", "default");

    history.clear();

    assert!(history.is_empty());
    assert_eq!(history.stats().total_messages, 0);
    assert_eq!(store.get(HISTORY_KEY)?, None);

    // Numbering restarts after a clear
    assert_eq!(history.append("again", "Hello again", "default").message_number, 1);

    Ok(())
}

#[test]
fn test_malformed_history_is_discarded() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.set(HISTORY_KEY, "{not json")?;

    let history = ConversationHistory::load(store);
    assert!(history.is_empty());
    assert_eq!(history.stats().total_messages, 0);

    Ok(())
}

#[test]
fn test_history_written_by_other_clients_loads() -> Result<()> {
    // Blob without stats or lastUpdated
    let store = Arc::new(MemoryStore::new());
    store.set(
        HISTORY_KEY,
        r#"{"conversations":[{"id":1730000000000,"user":"hi","bot":"hello","persona":"default","timestamp":"10:15:00","messageNumber":7}]}"#,
    )?;

    let mut history = ConversationHistory::load(store);
    assert_eq!(history.len(), 1);
    assert_eq!(history.append("next", "ok", "default").message_number, 8);

    Ok(())
}

#[test]
fn test_file_store_remove_missing_key() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FileStore::open(temp_dir.path().join("nested"))?;

    store.remove("never-written")?;
    assert_eq!(store.get("never-written")?, None);

    store.set("api_key_gemini", "value")?;
    assert_eq!(store.get("api_key_gemini")?.as_deref(), Some("value"));

    Ok(())
}

#[test]
fn test_api_key_store() {
    let store = Arc::new(MemoryStore::new());
    let keys_store = ApiKeyStore::new(store);

    let mut keys = ApiKeys::new();
    keys.insert(ApiService::Gemini, "  AIzaSyA-0123456789  ");
    keys.insert(ApiService::Tavily, "short");
    keys_store.save(&keys).unwrap();

    let loaded = keys_store.load();
    assert_eq!(loaded.get(ApiService::Gemini), Some("AIzaSyA-0123456789"));
    assert_eq!(loaded.get(ApiService::Openweather), None);

    assert!(keys_store.has_key(ApiService::Gemini));
    // Too short to count as configured
    assert!(!keys_store.has_key(ApiService::Tavily));

    let features = keys_store.local_features();
    assert!(features.ai_chat);
    assert!(!features.web_search);
}
