use super::client::Backend;
use super::socket::SocketHandle;
use crate::controller::{ConnId, EventSender};
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded retry policy for one full initialization
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Run the initialization sequence (new session, then its socket) until it
/// succeeds or `policy.max_attempts` attempts have failed
///
/// Returns the session id with its open socket, or the last error.
pub async fn establish(
    backend: &dyn Backend,
    policy: RetryPolicy,
    conn_id: ConnId,
    events: &EventSender,
) -> Result<(String, SocketHandle)> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        if attempt > 1 {
            info!("Reconnecting (attempt {}/{})", attempt, max_attempts);
        }

        let result = async {
            let session_id = backend.create_session().await?;
            let socket = backend.connect(&session_id, conn_id, events.clone()).await?;
            Ok::<_, anyhow::Error>((session_id, socket))
        }
        .await;

        match result {
            Ok(established) => return Ok(established),
            Err(e) if attempt >= max_attempts => {
                warn!("Initialization failed after {} attempts: {:#}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Initialization attempt {} failed: {:#}", attempt, e);
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
