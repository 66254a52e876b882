use crate::backend::AvailableFeatures;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Recording,
    Processing,
    Responding,
    Error,
}

impl AgentState {
    pub fn headline(&self) -> &'static str {
        match self {
            AgentState::Idle => "Ready to Listen",
            AgentState::Recording => "Recording...",
            AgentState::Processing => "Processing...",
            AgentState::Responding => "AI Speaking",
            AgentState::Error => "Error Occurred",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            AgentState::Idle => "Press r to start recording",
            AgentState::Recording => "Speak now, press r to stop",
            AgentState::Processing => "AI is thinking about your request",
            AgentState::Responding => "Listen to the response",
            AgentState::Error => "Please try again",
        }
    }
}

/// Everything a renderer needs to draw the current status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusView {
    pub state: AgentState,

    /// Live transcript preview or the finalized utterance
    pub transcript: Option<String>,

    /// Last assistant response
    pub response: Option<String>,

    /// Speech playback status ("Assistant is speaking...")
    pub audio_status: Option<String>,

    /// Message explaining the current error
    pub error: Option<String>,

    /// Transient notice (API key configuration results)
    pub notice: Option<String>,

    pub settings_open: bool,
    pub connected: bool,
    pub features: AvailableFeatures,
    pub history_len: usize,
}

impl StatusView {
    pub fn headline(&self) -> &'static str {
        self.state.headline()
    }

    pub fn detail(&self) -> &'static str {
        self.state.detail()
    }
}
