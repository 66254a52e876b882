//! Event loop driving a `SessionController`
//!
//! The runtime is the only consumer of the event queue. It hands each event
//! to the controller, renders the resulting view, and executes the returned
//! commands. Anything that waits (network, microphone permission, timers)
//! runs in a spawned task that reports back through the queue.

use crate::backend::{establish, Backend, ClientMessage, RetryPolicy, SocketHandle};
use crate::controller::{Command, ConnId, Event, EventReceiver, EventSender, SessionController, StatusView};
use crate::speech::SpeechDevices;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Receives the status projection after every handled event
pub trait Renderer: Send {
    fn render(&mut self, view: &StatusView);
}

/// Holder of the single live socket
///
/// Only the socket of the connection currently expected is accepted, so a
/// connector that finishes after being superseded cannot install its socket.
#[derive(Default)]
pub struct SocketSlot {
    expected: Option<ConnId>,
    socket: Option<SocketHandle>,
}

impl SocketSlot {
    /// Close the current socket and wait for `conn_id` instead
    pub fn expect(&mut self, conn_id: ConnId) {
        self.clear();
        self.expected = Some(conn_id);
    }

    /// Close the current socket and accept none
    pub fn clear(&mut self) {
        self.expected = None;
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
    }

    /// Install `socket` if it belongs to the expected connection; a
    /// rejected socket is dropped, which stops its tasks
    pub fn install(&mut self, socket: SocketHandle) -> bool {
        if self.expected != Some(socket.conn_id()) {
            debug!("Discarding socket {} from a superseded connection", socket.conn_id());
            return false;
        }
        self.socket = Some(socket);
        true
    }

    pub fn get(&self) -> Option<&SocketHandle> {
        self.socket.as_ref()
    }
}

pub struct Runtime {
    backend: Arc<dyn Backend>,
    devices: SpeechDevices,
    events: EventSender,
    retry: RetryPolicy,
    /// Filled in by the connector task
    socket: Arc<Mutex<SocketSlot>>,
    connector: Option<JoinHandle<()>>,
}

impl Runtime {
    pub fn new(
        backend: Arc<dyn Backend>,
        devices: SpeechDevices,
        events: EventSender,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            devices,
            events,
            retry,
            socket: Arc::new(Mutex::new(SocketSlot::default())),
            connector: None,
        }
    }

    /// Run until `Event::Shutdown` is handled or every sender is gone
    pub async fn run(
        mut self,
        controller: &mut SessionController,
        mut inbox: EventReceiver,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        info!("Voice agent runtime started");

        for command in controller.start() {
            self.execute(command).await;
        }
        renderer.render(controller.view());

        while let Some(event) = inbox.recv().await {
            let shutdown = event == Event::Shutdown;
            debug!("event: {:?}", event);

            for command in controller.handle(event) {
                self.execute(command).await;
            }
            renderer.render(controller.view());

            if shutdown {
                break;
            }
        }

        self.disconnect().await;
        info!("Voice agent runtime stopped");
        Ok(())
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Initialize { conn_id } => self.initialize(conn_id).await,
            Command::Disconnect => self.disconnect().await,
            Command::Send(message) => self.send(message).await,
            Command::FetchStatus { session_id } => {
                let backend = Arc::clone(&self.backend);
                let events = self.events.clone();
                tokio::spawn(async move {
                    match backend.session_status(&session_id).await {
                        Ok(features) => {
                            let _ = events.send(Event::SessionStatus(features));
                        }
                        Err(e) => warn!("Could not check session status: {:#}", e),
                    }
                });
            }
            Command::SubmitApiKeys { session_id, keys } => {
                let backend = Arc::clone(&self.backend);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match backend.configure_api_keys(&session_id, &keys).await {
                        Ok(configured) => Event::ApiKeysSaved { configured, keys },
                        Err(e) => Event::ApiKeysFailed {
                            reason: format!("{:#}", e),
                        },
                    };
                    let _ = events.send(event);
                });
            }
            Command::AcquireMicrophone => {
                let microphone = Arc::clone(&self.devices.microphone);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match microphone.acquire().await {
                        Ok(()) => Event::MicrophoneReady,
                        Err(e) => Event::MicrophoneDenied(e),
                    };
                    let _ = events.send(event);
                });
            }
            Command::ReleaseMicrophone => self.devices.microphone.release(),
            Command::StartRecognizer => {
                if let Err(e) = self.devices.recognizer.start() {
                    let _ = self.events.send(Event::RecognizerError(e));
                }
            }
            Command::StopRecognizer => self.devices.recognizer.stop(),
            Command::Speak { text, voice } => {
                if let Err(e) = self.devices.synthesizer.speak(&text, voice) {
                    let _ = self.events.send(Event::SynthesisFailed(e));
                }
            }
            Command::CancelSpeech => self.devices.synthesizer.cancel(),
            Command::Schedule { id, kind, after } => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = events.send(Event::TimerFired { id, kind });
                });
            }
        }
    }

    /// Replace whatever link exists with a fresh supervised initialization
    async fn initialize(&mut self, conn_id: ConnId) {
        if let Some(connector) = self.connector.take() {
            connector.abort();
        }
        self.socket.lock().await.expect(conn_id);

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let slot = Arc::clone(&self.socket);
        let retry = self.retry;

        self.connector = Some(tokio::spawn(async move {
            match establish(backend.as_ref(), retry, conn_id, &events).await {
                Ok((session_id, socket)) => {
                    if !slot.lock().await.install(socket) {
                        return;
                    }
                    let _ = events.send(Event::Connected {
                        conn_id,
                        session_id,
                    });
                }
                Err(e) => {
                    error!("Initialization failed: {:#}", e);
                    let _ = events.send(Event::ConnectionFailed {
                        conn_id,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }));
    }

    async fn disconnect(&mut self) {
        if let Some(connector) = self.connector.take() {
            connector.abort();
        }
        self.socket.lock().await.clear();
    }

    async fn send(&self, message: ClientMessage) {
        match self.socket.lock().await.get() {
            Some(socket) => {
                if let Err(e) = socket.send(message) {
                    warn!("Failed to send message: {:#}", e);
                }
            }
            None => warn!("No open socket; dropping {:?}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, error::TryRecvError};

    fn socket(conn_id: ConnId) -> (SocketHandle, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SocketHandle::new(conn_id, tx), rx)
    }

    #[test]
    fn test_slot_rejects_superseded_socket() {
        let mut slot = SocketSlot::default();
        slot.expect(1);
        slot.expect(2);

        let (late, _rx) = socket(1);
        assert!(!slot.install(late));
        assert!(slot.get().is_none());

        let (current, _rx) = socket(2);
        assert!(slot.install(current));
        assert_eq!(slot.get().map(SocketHandle::conn_id), Some(2));
    }

    #[test]
    fn test_slot_rejects_socket_after_clear() {
        let mut slot = SocketSlot::default();
        slot.expect(3);
        slot.clear();

        let (late, mut rx) = socket(3);
        assert!(!slot.install(late));
        assert!(slot.get().is_none());
        // The rejected handle was dropped with its sender
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }
}
