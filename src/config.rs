use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionSettings,
    pub storage: StorageConfig,
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the assistant backend; the socket URL is derived from it
    pub base_url: String,
    pub request_timeout_secs: u64,
}

/// Timing and threshold knobs consulted by the session controller
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Watchdog that force-stops a recognizer which never endpoints
    pub recording_timeout_secs: u64,
    /// How long an error stays on screen before returning to idle
    pub status_reset_ms: u64,
    pub reconnect_delay_ms: u64,
    /// Delay between socket open and the initial persona message
    pub persona_settle_ms: u64,
    pub audio_status_hide_ms: u64,
    pub settings_close_ms: u64,
    pub notice_hide_ms: u64,
    /// Shortest finalized utterance (in characters) worth sending
    pub min_transcript_chars: usize,
    pub max_connect_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    pub persona: String,
    pub words_per_minute: u32,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("backend.request_timeout_secs", 10)?
            .set_default("session.recording_timeout_secs", 15)?
            .set_default("session.status_reset_ms", 3000)?
            .set_default("session.reconnect_delay_ms", 3000)?
            .set_default("session.persona_settle_ms", 1000)?
            .set_default("session.audio_status_hide_ms", 3000)?
            .set_default("session.settings_close_ms", 2000)?
            .set_default("session.notice_hide_ms", 5000)?
            .set_default("session.min_transcript_chars", 2)?
            .set_default("session.max_connect_attempts", 5)?
            .set_default("storage.path", "~/.voice-agent")?
            .set_default("voice.persona", "default")?
            .set_default("voice.words_per_minute", 170)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_AGENT").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageConfig {
    /// Storage directory with `~` and environment variables expanded
    pub fn dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.path)
            .with_context(|| format!("Failed to expand storage path {}", self.path))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }
}

impl SessionSettings {
    pub fn recording_timeout(&self) -> Duration {
        Duration::from_secs(self.recording_timeout_secs)
    }

    pub fn status_reset(&self) -> Duration {
        Duration::from_millis(self.status_reset_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn persona_settle(&self) -> Duration {
        Duration::from_millis(self.persona_settle_ms)
    }

    pub fn audio_status_hide(&self) -> Duration {
        Duration::from_millis(self.audio_status_hide_ms)
    }

    pub fn settings_close(&self) -> Duration {
        Duration::from_millis(self.settings_close_ms)
    }

    pub fn notice_hide(&self) -> Duration {
        Duration::from_millis(self.notice_hide_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            recording_timeout_secs: 15,
            status_reset_ms: 3000,
            reconnect_delay_ms: 3000,
            persona_settle_ms: 1000,
            audio_status_hide_ms: 3000,
            settings_close_ms: 2000,
            notice_hide_ms: 5000,
            min_transcript_chars: 2,
            max_connect_attempts: 5,
        }
    }
}
