use super::messages::{ClientMessage, ServerMessage};
use crate::controller::{ConnId, Event, EventSender};
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Owner of one open session socket
///
/// Outbound frames go through an internal channel drained by a writer task;
/// inbound frames are parsed by a reader task and posted to the event queue
/// tagged with `conn_id`. Dropping or closing the handle stops both tasks.
pub struct SocketHandle {
    conn_id: ConnId,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    tasks: Vec<JoinHandle<()>>,
}

impl SocketHandle {
    /// Wrap an outbound channel; used by transports other than WebSocket and in tests
    pub fn new(conn_id: ConnId, outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self {
            conn_id,
            outbound,
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn conn_id(&self) -> ConnId {
        self.conn_id
    }

    pub fn send(&self, message: ClientMessage) -> Result<()> {
        self.outbound
            .send(message)
            .map_err(|_| anyhow::anyhow!("Socket {} is closed", self.conn_id))
    }

    pub fn close(self) {
        debug!("Closing socket {}", self.conn_id);
        // Dropping self aborts the tasks
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Open the session socket at `url` and start its reader and writer tasks
pub async fn open(url: &str, conn_id: ConnId, events: EventSender) -> Result<SocketHandle> {
    info!("Connecting socket {} to {}", conn_id, url);

    let (stream, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to open WebSocket {}", url))?;

    info!("Socket {} connected", conn_id);

    let (mut ws_tx, mut ws_rx) = stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();

    let writer_events = events.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to encode outbound message: {}", e);
                    continue;
                }
            };

            if let Err(e) = ws_tx.send(Message::Text(payload.into())).await {
                warn!("Socket {} write failed: {}", conn_id, e);
                let _ = writer_events.send(Event::SocketError {
                    conn_id,
                    reason: e.to_string(),
                });
                break;
            }
        }

        let _ = ws_tx.close().await;
    });

    let reader = tokio::spawn(async move {
        let reason = loop {
            let frame = match ws_rx.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    warn!("Socket {} error: {}", conn_id, e);
                    let _ = events.send(Event::SocketError {
                        conn_id,
                        reason: e.to_string(),
                    });
                    break e.to_string();
                }
                None => break "stream ended".to_string(),
            };

            let text = match frame {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    break match frame {
                        Some(frame) => format!("{} {}", frame.code, frame.reason),
                        None => "closed".to_string(),
                    };
                }
                _ => continue,
            };

            match serde_json::from_str::<ServerMessage>(text.as_str()) {
                Ok(message) => {
                    debug!("Socket {} received {:?}", conn_id, message);
                    if events.send(Event::Server { conn_id, message }).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("Failed to parse server message: {}", e);
                }
            }
        };

        info!("Socket {} closed: {}", conn_id, reason);
        let _ = events.send(Event::SocketClosed { conn_id, reason });
    });

    Ok(SocketHandle::new(conn_id, outbound_tx)
        .with_task(writer)
        .with_task(reader))
}

/// Socket URL for a session: `http` bases map to `ws`, `https` to `wss`
pub fn session_url(base_url: &str, session_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws/{}", base, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_url_schemes() {
        assert_eq!(
            session_url("http://localhost:8000/", "abc"),
            "ws://localhost:8000/ws/abc"
        );
        assert_eq!(
            session_url("https://agent.example.com", "abc"),
            "wss://agent.example.com/ws/abc"
        );
        assert_eq!(session_url("ws://host", "x"), "ws://host/ws/x");
    }

    #[tokio::test]
    async fn test_handle_send_after_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(7, tx);
        drop(rx);
        assert!(handle.send(ClientMessage::UserTranscript { text: "hi".into() }).is_err());
    }
}
