use crate::backend::{ApiKeys, AvailableFeatures, ClientMessage, ServerMessage};
use crate::error::{CaptureError, RecognitionError, SynthesisError};
use crate::persona::{Persona, VoiceProfile};
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifies one initialization attempt (new session + new socket)
pub type ConnId = u64;

/// Identifies one scheduled timer
pub type TimerId = u64;

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// One recognizer result segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_final: bool,
}

impl Segment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Return from `error` to `idle`
    IdleReset,
    /// Force-stop a recognizer that never endpoints
    Watchdog,
    /// Re-run the full initialization after losing the socket
    Reconnect,
    /// Send the persona once the server has settled
    PersonaSettle,
    HideAudioStatus,
    HideNotice,
    CloseSettings,
}

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User input
    Activate,
    Cancel,
    SelectPersona(Persona),
    ClearHistory,
    OpenSettings,
    CloseSettings,
    SaveApiKeys(ApiKeys),
    Shutdown,

    // Connection
    Connected { conn_id: ConnId, session_id: String },
    ConnectionFailed { conn_id: ConnId, reason: String },
    SocketClosed { conn_id: ConnId, reason: String },
    SocketError { conn_id: ConnId, reason: String },
    Server { conn_id: ConnId, message: ServerMessage },
    SessionStatus(AvailableFeatures),
    ApiKeysSaved { configured: Vec<String>, keys: ApiKeys },
    ApiKeysFailed { reason: String },

    // Capabilities
    MicrophoneReady,
    MicrophoneDenied(CaptureError),
    RecognizerStarted,
    RecognizerResult(Vec<Segment>),
    RecognizerEnded,
    RecognizerError(RecognitionError),
    SynthesisStarted,
    SynthesisEnded,
    SynthesisFailed(SynthesisError),

    TimerFired { id: TimerId, kind: TimerKind },
}

/// Side effects requested by the controller, executed by the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Close any live socket, then request a new session and open its socket
    Initialize { conn_id: ConnId },
    Disconnect,
    Send(ClientMessage),
    FetchStatus { session_id: String },
    SubmitApiKeys { session_id: String, keys: ApiKeys },
    AcquireMicrophone,
    ReleaseMicrophone,
    StartRecognizer,
    StopRecognizer,
    Speak { text: String, voice: VoiceProfile },
    CancelSpeech,
    Schedule { id: TimerId, kind: TimerKind, after: Duration },
}
