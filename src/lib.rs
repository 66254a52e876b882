pub mod backend;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod history;
pub mod persona;
pub mod runtime;
pub mod speech;

pub use backend::{Backend, ClientMessage, HttpBackend, RetryPolicy, ServerMessage, SocketHandle};
pub use config::{Config, SessionSettings};
pub use controller::{AgentState, Command, Event, SessionController, StatusView};
pub use error::{CaptureError, RecognitionError, SynthesisError};
pub use history::{ConversationHistory, FileStore, HistoryEntry, KvStore, MemoryStore};
pub use persona::{Persona, VoiceProfile};
pub use runtime::{Renderer, Runtime};
pub use speech::{Microphone, Recognizer, SpeechDevices, Synthesizer};
