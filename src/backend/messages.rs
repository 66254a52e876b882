use crate::persona::Persona;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Frame sent to the backend over the session socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Persona { persona: Persona },
    UserTranscript { text: String },
}

/// Frame received from the backend over the session socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AckTranscript,
    Final {
        text: String,
    },
    LlmResponse {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        persona: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_keys_status: Option<ApiKeysStatus>,
    },
    AudioEnd,
    Error {
        message: String,
    },
}

/// Per-service key status piggybacked on `llm_response`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeysStatus {
    pub gemini: bool,
    pub openweather: bool,
    pub tavily: bool,
}

/// Backend features unlocked by the configured keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableFeatures {
    pub ai_chat: bool,
    pub weather: bool,
    pub web_search: bool,
}

impl From<ApiKeysStatus> for AvailableFeatures {
    fn from(status: ApiKeysStatus) -> Self {
        Self {
            ai_chat: status.gemini,
            weather: status.openweather,
            web_search: status.tavily,
        }
    }
}

// ============================================================================
// HTTP bodies
// ============================================================================

/// GET /session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

/// GET /session/{id}/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub available_features: AvailableFeatures,
}

/// POST /session/{id}/api-keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeysResponse {
    #[serde(default)]
    pub configured_keys: Vec<String>,
}

/// Third-party services the backend can be given keys for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiService {
    Gemini,
    Openweather,
    Tavily,
}

impl ApiService {
    pub const ALL: [ApiService; 3] = [ApiService::Gemini, ApiService::Openweather, ApiService::Tavily];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiService::Gemini => "gemini",
            ApiService::Openweather => "openweather",
            ApiService::Tavily => "tavily",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name.trim())
    }
}

impl fmt::Display for ApiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named API keys, serialized as a flat JSON object (`{"gemini": "..."}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeys(BTreeMap<ApiService, String>);

impl ApiKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key; values are trimmed and empty values dropped
    pub fn insert(&mut self, service: ApiService, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.0.remove(&service);
        } else {
            self.0.insert(service, value.to_string());
        }
    }

    pub fn get(&self, service: ApiService) -> Option<&str> {
        self.0.get(&service).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ApiService, &str)> {
        self.0.iter().map(|(service, value)| (*service, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
