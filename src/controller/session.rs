use super::event::{Command, ConnId, Event, Segment, TimerId, TimerKind};
use super::state::{AgentState, StatusView};
use super::timers::TimerBook;
use crate::backend::{ApiKeys, ClientMessage, ServerMessage};
use crate::config::SessionSettings;
use crate::error::{RecognitionError, SynthesisError};
use crate::history::{ApiKeyStore, ConversationHistory, KvStore};
use crate::persona::{Persona, VoiceProfile};
use std::sync::Arc;
use tracing::{debug, info, warn};

const LISTENING: &str = "(listening... speak now!)";
const DIDNT_CATCH: &str = "I didn't catch that. Please try again.";
const NOT_CONNECTED: &str = "Connection error. Please try again.";
const CONNECTION_LOST: &str = "Connection lost. Reconnecting...";
const SOCKET_ERROR: &str = "Connection error.";
const CONNECT_FAILED: &str = "Could not reach the assistant. Please try again.";
const KEYS_FAILED: &str = "Failed to save API keys. Please try again.";
const KEYS_NEED_SESSION: &str = "Not connected. API keys can be saved once a session is open.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Link {
    Down,
    Connecting(ConnId),
    Up { conn_id: ConnId, session_id: String },
}

impl Link {
    fn conn_id(&self) -> Option<ConnId> {
        match self {
            Link::Down => None,
            Link::Connecting(id) => Some(*id),
            Link::Up { conn_id, .. } => Some(*conn_id),
        }
    }
}

/// Accumulated text for one user utterance
#[derive(Debug, Default)]
struct RecordingTurn {
    /// Microphone granted and recognizer start requested
    start_requested: bool,
    /// Recognizer reported that it is listening
    started: bool,
    /// Concatenated final segments, each followed by a space
    final_text: String,
    /// The user asked for the stop (click while recording or cancel)
    manual_stop: bool,
}

/// The session state machine
///
/// Owns connection state, the current recording turn, the history log and
/// the status projection. It performs no I/O: `handle` consumes one event
/// and returns the commands the runtime must execute.
pub struct SessionController {
    settings: SessionSettings,
    state: AgentState,
    view: StatusView,
    persona: Persona,
    link: Link,
    next_conn_id: ConnId,
    turn: Option<RecordingTurn>,
    /// User text of the exchange awaiting a response
    pending_user_text: Option<String>,
    speaking_voice: Option<VoiceProfile>,
    history: ConversationHistory,
    api_keys: ApiKeyStore,
    timers: TimerBook,
}

impl SessionController {
    pub fn new(settings: SessionSettings, persona: Persona, store: Arc<dyn KvStore>) -> Self {
        let history = ConversationHistory::load(Arc::clone(&store));
        let api_keys = ApiKeyStore::new(store);

        let view = StatusView {
            features: api_keys.local_features(),
            history_len: history.len(),
            ..StatusView::default()
        };

        Self {
            settings,
            state: AgentState::Idle,
            view,
            persona,
            link: Link::Down,
            next_conn_id: 0,
            turn: None,
            pending_user_text: None,
            speaking_voice: None,
            history,
            api_keys,
            timers: TimerBook::default(),
        }
    }

    /// Kick off the first initialization
    pub fn start(&mut self) -> Vec<Command> {
        vec![self.initialize()]
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn view(&self) -> &StatusView {
        &self.view
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn session_id(&self) -> Option<&str> {
        match &self.link {
            Link::Up { session_id, .. } => Some(session_id),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.link, Link::Up { .. })
    }

    pub fn is_recording(&self) -> bool {
        self.turn.is_some()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.timers.is_pending(TimerKind::Reconnect)
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let mut out = Vec::new();

        match event {
            Event::Activate => self.on_activate(&mut out),
            Event::Cancel => self.on_cancel(&mut out),
            Event::SelectPersona(persona) => self.on_select_persona(persona, &mut out),
            Event::ClearHistory => self.history.clear(),
            Event::OpenSettings => {
                self.view.settings_open = true;
                self.timers.cancel(TimerKind::CloseSettings);
            }
            Event::CloseSettings => {
                self.view.settings_open = false;
                self.timers.cancel(TimerKind::CloseSettings);
            }
            Event::SaveApiKeys(keys) => self.on_save_api_keys(keys, &mut out),
            Event::Shutdown => self.on_shutdown(&mut out),

            Event::Connected {
                conn_id,
                session_id,
            } => self.on_connected(conn_id, session_id, &mut out),
            Event::ConnectionFailed { conn_id, reason } => {
                if self.link == Link::Connecting(conn_id) {
                    warn!("Connection {} failed: {}", conn_id, reason);
                    self.link = Link::Down;
                    self.enter_error(CONNECT_FAILED, &mut out);
                }
            }
            Event::SocketClosed { conn_id, reason } => {
                self.on_socket_closed(conn_id, &reason, &mut out)
            }
            Event::SocketError { conn_id, reason } => {
                if self.link.conn_id() == Some(conn_id) {
                    warn!("Socket {} error: {}", conn_id, reason);
                    self.enter_error(SOCKET_ERROR, &mut out);
                }
            }
            Event::Server { conn_id, message } => {
                if self.link.conn_id() == Some(conn_id) {
                    self.on_server_message(message, &mut out);
                } else {
                    debug!("Ignoring message from stale socket {}", conn_id);
                }
            }
            Event::SessionStatus(features) => self.view.features = features,
            Event::ApiKeysSaved { configured, keys } => {
                self.on_api_keys_saved(&configured, &keys, &mut out)
            }
            Event::ApiKeysFailed { reason } => {
                warn!("Failed to save API keys: {}", reason);
                self.show_notice(KEYS_FAILED.to_string(), &mut out);
            }

            Event::MicrophoneReady => self.on_microphone_ready(&mut out),
            Event::MicrophoneDenied(err) => {
                if self.turn.take().is_some() {
                    warn!("Microphone unavailable: {}", err);
                    self.enter_error(&err.to_string(), &mut out);
                }
            }
            Event::RecognizerStarted => self.on_recognizer_started(&mut out),
            Event::RecognizerResult(segments) => self.on_recognizer_result(segments),
            Event::RecognizerEnded => self.on_recognizer_ended(&mut out),
            Event::RecognizerError(err) => self.on_recognizer_error(err, &mut out),
            Event::SynthesisStarted => {
                if let Some(voice) = self.speaking_voice {
                    self.view.audio_status = Some(format!("{} is speaking...", voice.display_name));
                }
                if self.turn.is_none() {
                    self.set_state(AgentState::Responding);
                }
            }
            Event::SynthesisEnded => {
                if let Some(voice) = self.speaking_voice.take() {
                    self.view.audio_status = Some(format!("{} finished speaking", voice.display_name));
                    out.push(
                        self.timers
                            .schedule(TimerKind::HideAudioStatus, self.settings.audio_status_hide()),
                    );
                }
                if self.state == AgentState::Responding {
                    self.set_state(AgentState::Idle);
                }
            }
            Event::SynthesisFailed(err) => self.on_synthesis_failed(err, &mut out),

            Event::TimerFired { id, kind } => self.on_timer(id, kind, &mut out),
        }

        self.view.connected = self.is_connected();
        self.view.history_len = self.history.len();
        out
    }

    // ========================================================================
    // User input
    // ========================================================================

    fn on_activate(&mut self, out: &mut Vec<Command>) {
        if let Some(turn) = self.turn.as_mut() {
            if turn.started && !turn.manual_stop {
                info!("Stopping current recording");
                turn.manual_stop = true;
                out.push(Command::StopRecognizer);
            } else {
                debug!("Recording is starting or stopping; ignoring activation");
            }
            return;
        }

        self.begin_turn(out);
    }

    fn begin_turn(&mut self, out: &mut Vec<Command>) {
        self.view.transcript = None;
        self.view.response = None;
        self.view.audio_status = None;
        self.view.error = None;
        self.pending_user_text = None;
        self.speaking_voice = None;
        self.timers.cancel(TimerKind::IdleReset);
        self.timers.cancel(TimerKind::HideAudioStatus);

        out.push(Command::CancelSpeech);

        if self.link == Link::Down && !self.reconnect_pending() {
            out.push(self.initialize());
        }

        self.turn = Some(RecordingTurn::default());
        self.set_state(AgentState::Recording);
        out.push(Command::AcquireMicrophone);
    }

    fn on_cancel(&mut self, out: &mut Vec<Command>) {
        out.push(Command::CancelSpeech);
        self.speaking_voice = None;

        // A recognizer that was asked to start must be stopped; its end
        // notification still finalizes whatever it heard
        match self.turn.as_ref().map(|t| (t.start_requested, t.manual_stop)) {
            Some((true, false)) => {
                if let Some(turn) = self.turn.as_mut() {
                    turn.manual_stop = true;
                }
                out.push(Command::StopRecognizer);
            }
            Some((true, true)) => debug!("Recognizer already stopping"),
            Some((false, _)) => {
                self.turn = None;
                out.push(Command::ReleaseMicrophone);
            }
            None => {}
        }

        self.view.settings_open = false;
        self.view.audio_status = None;
        self.view.error = None;
        self.timers.cancel(TimerKind::CloseSettings);
        self.timers.cancel(TimerKind::HideAudioStatus);
        self.timers.cancel(TimerKind::IdleReset);
        self.set_state(AgentState::Idle);
    }

    fn on_select_persona(&mut self, persona: Persona, out: &mut Vec<Command>) {
        info!("Persona selected: {}", persona);
        self.persona = persona;
        self.history.set_current_persona(persona.as_str());

        if self.is_connected() {
            out.push(Command::Send(ClientMessage::Persona { persona }));
        }
    }

    fn on_save_api_keys(&mut self, keys: ApiKeys, out: &mut Vec<Command>) {
        match self.session_id() {
            Some(session_id) => out.push(Command::SubmitApiKeys {
                session_id: session_id.to_string(),
                keys,
            }),
            None => self.show_notice(KEYS_NEED_SESSION.to_string(), out),
        }
    }

    fn on_api_keys_saved(&mut self, configured: &[String], keys: &ApiKeys, out: &mut Vec<Command>) {
        if let Err(e) = self.api_keys.save(keys) {
            warn!("Could not store API keys locally: {:#}", e);
        }

        self.view.features = self.api_keys.local_features();
        self.show_notice(
            format!("{} API key(s) configured successfully!", configured.len()),
            out,
        );
        out.push(
            self.timers
                .schedule(TimerKind::CloseSettings, self.settings.settings_close()),
        );
    }

    fn on_shutdown(&mut self, out: &mut Vec<Command>) {
        out.push(Command::CancelSpeech);
        if let Some(turn) = self.turn.take() {
            if turn.start_requested {
                out.push(Command::StopRecognizer);
            }
            out.push(Command::ReleaseMicrophone);
        }
        out.push(Command::Disconnect);
        self.link = Link::Down;
        self.set_state(AgentState::Idle);
    }

    // ========================================================================
    // Connection
    // ========================================================================

    fn initialize(&mut self) -> Command {
        self.next_conn_id += 1;
        let conn_id = self.next_conn_id;
        self.link = Link::Connecting(conn_id);
        info!("Initializing connection {}", conn_id);
        Command::Initialize { conn_id }
    }

    fn on_connected(&mut self, conn_id: ConnId, session_id: String, out: &mut Vec<Command>) {
        if self.link != Link::Connecting(conn_id) {
            debug!("Ignoring stale connection {}", conn_id);
            return;
        }

        info!("Connected: session {} (connection {})", session_id, conn_id);
        self.link = Link::Up {
            conn_id,
            session_id,
        };
        out.push(
            self.timers
                .schedule(TimerKind::PersonaSettle, self.settings.persona_settle()),
        );
    }

    fn on_socket_closed(&mut self, conn_id: ConnId, reason: &str, out: &mut Vec<Command>) {
        if self.link.conn_id() != Some(conn_id) {
            debug!("Ignoring close of stale socket {}", conn_id);
            return;
        }

        warn!("Socket {} closed unexpectedly: {}", conn_id, reason);
        self.link = Link::Down;
        self.timers.cancel(TimerKind::PersonaSettle);
        self.enter_error(CONNECTION_LOST, out);

        if !self.reconnect_pending() {
            out.push(
                self.timers
                    .schedule(TimerKind::Reconnect, self.settings.reconnect_delay()),
            );
        }
    }

    fn on_server_message(&mut self, message: ServerMessage, out: &mut Vec<Command>) {
        match message {
            ServerMessage::AckTranscript => debug!("Transcript acknowledged"),
            ServerMessage::Final { text } => {
                self.view.transcript = Some(text.clone());
                self.pending_user_text = Some(text);
            }
            ServerMessage::LlmResponse {
                text,
                persona,
                api_keys_status,
            } => {
                let tag = persona.unwrap_or_else(|| self.persona.as_str().to_string());

                if let Some(user) = self.pending_user_text.take().filter(|u| !u.is_empty()) {
                    self.history.append(&user, &text, &tag);
                }
                if let Some(status) = api_keys_status {
                    self.view.features = status.into();
                }

                let voice = Persona::voice_for_tag(&tag);
                self.speaking_voice = Some(voice);
                self.view.response = Some(text.clone());
                self.view.audio_status = None;
                self.view.error = None;
                self.timers.cancel(TimerKind::IdleReset);
                self.timers.cancel(TimerKind::HideAudioStatus);

                out.push(Command::Speak { text, voice });
                if self.turn.is_none() {
                    self.set_state(AgentState::Responding);
                }
            }
            ServerMessage::AudioEnd => {
                if self.turn.is_none() {
                    self.set_state(AgentState::Idle);
                }
            }
            ServerMessage::Error { message } => {
                warn!("Server error: {}", message);
                self.enter_error(&message, out);
            }
        }
    }

    // ========================================================================
    // Capabilities
    // ========================================================================

    fn on_microphone_ready(&mut self, out: &mut Vec<Command>) {
        match self.turn.as_mut() {
            Some(turn) if !turn.start_requested => {
                turn.start_requested = true;
                out.push(Command::StartRecognizer);
            }
            Some(_) => {}
            None => out.push(Command::ReleaseMicrophone),
        }
    }

    fn on_recognizer_started(&mut self, out: &mut Vec<Command>) {
        let Some(turn) = self.turn.as_mut() else {
            warn!("Recognizer started without an active turn; stopping it");
            out.push(Command::StopRecognizer);
            return;
        };

        turn.started = true;
        if turn.manual_stop {
            // Cancelled while starting
            out.push(Command::StopRecognizer);
            return;
        }

        info!("Speech recognition started");
        turn.final_text.clear();
        self.view.transcript = Some(LISTENING.to_string());
        out.push(
            self.timers
                .schedule(TimerKind::Watchdog, self.settings.recording_timeout()),
        );
    }

    fn on_recognizer_result(&mut self, segments: Vec<Segment>) {
        let Some(turn) = self.turn.as_mut() else {
            return;
        };

        let mut interim = String::new();
        for segment in segments {
            if segment.is_final {
                turn.final_text.push_str(&segment.text);
                turn.final_text.push(' ');
            } else {
                interim.push_str(&segment.text);
            }
        }

        let preview = format!("{} {}", turn.final_text, interim).trim().to_string();
        self.view.transcript = Some(if preview.is_empty() {
            LISTENING.to_string()
        } else {
            preview
        });
    }

    fn on_recognizer_ended(&mut self, out: &mut Vec<Command>) {
        let Some(turn) = self.turn.take() else {
            debug!("Recognizer ended without an active turn");
            return;
        };

        info!("Speech recognition ended");
        self.timers.cancel(TimerKind::Watchdog);
        out.push(Command::ReleaseMicrophone);

        let text = turn.final_text.trim().to_string();
        if text.chars().count() >= self.settings.min_transcript_chars {
            self.view.transcript = Some(text.clone());
            if self.is_connected() {
                out.push(Command::Send(ClientMessage::UserTranscript { text: text.clone() }));
                self.pending_user_text = Some(text);
                self.set_state(AgentState::Processing);
            } else {
                self.enter_error(NOT_CONNECTED, out);
            }
        } else if turn.manual_stop {
            self.view.transcript = None;
            self.set_state(AgentState::Idle);
        } else {
            self.enter_error(DIDNT_CATCH, out);
        }
    }

    fn on_recognizer_error(&mut self, err: RecognitionError, out: &mut Vec<Command>) {
        let Some(turn) = self.turn.take() else {
            debug!("Recognizer error without an active turn: {}", err);
            return;
        };

        self.timers.cancel(TimerKind::Watchdog);
        out.push(Command::ReleaseMicrophone);

        if turn.manual_stop && err == RecognitionError::Aborted {
            self.set_state(AgentState::Idle);
            return;
        }

        warn!("Speech recognition error: {}", err);
        self.enter_error(&err.to_string(), out);
    }

    fn on_synthesis_failed(&mut self, err: SynthesisError, out: &mut Vec<Command>) {
        self.speaking_voice = None;
        if err == SynthesisError::Interrupted {
            debug!("Speech interrupted");
            return;
        }

        warn!("Speech synthesis failed: {}", err);
        self.enter_error(&format!("Voice error: {}", err), out);
    }

    // ========================================================================
    // Timers
    // ========================================================================

    fn on_timer(&mut self, id: TimerId, kind: TimerKind, out: &mut Vec<Command>) {
        if !self.timers.fire(id, kind) {
            debug!("Ignoring stale {:?} timer {}", kind, id);
            return;
        }

        match kind {
            TimerKind::IdleReset => {
                if self.state == AgentState::Error {
                    self.view.error = None;
                    // An error raised mid-recording must not hide the live turn
                    let next = match &self.turn {
                        Some(turn) if !turn.manual_stop => AgentState::Recording,
                        _ => AgentState::Idle,
                    };
                    self.set_state(next);
                }
            }
            TimerKind::Watchdog => {
                if self.turn.as_ref().is_some_and(|t| t.started && !t.manual_stop) {
                    info!("Recording timeout reached; stopping recognizer");
                    out.push(Command::StopRecognizer);
                }
            }
            TimerKind::Reconnect => {
                if self.link == Link::Down {
                    info!("Reconnecting...");
                    out.push(self.initialize());
                }
            }
            TimerKind::PersonaSettle => {
                if let Some(session_id) = self.session_id().map(str::to_string) {
                    out.push(Command::Send(ClientMessage::Persona {
                        persona: self.persona,
                    }));
                    out.push(Command::FetchStatus { session_id });
                    self.history.set_current_persona(self.persona.as_str());
                }
            }
            TimerKind::HideAudioStatus => self.view.audio_status = None,
            TimerKind::HideNotice => self.view.notice = None,
            TimerKind::CloseSettings => self.view.settings_open = false,
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn set_state(&mut self, state: AgentState) {
        if self.state != state {
            debug!("state: {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.view.state = state;
    }

    /// Show `message`, enter `error`, and arm the return to idle
    fn enter_error(&mut self, message: &str, out: &mut Vec<Command>) {
        self.view.error = Some(message.to_string());
        self.set_state(AgentState::Error);
        out.push(
            self.timers
                .schedule(TimerKind::IdleReset, self.settings.status_reset()),
        );
    }

    fn show_notice(&mut self, notice: String, out: &mut Vec<Command>) {
        self.view.notice = Some(notice);
        out.push(
            self.timers
                .schedule(TimerKind::HideNotice, self.settings.notice_hide()),
        );
    }
}
