use super::event::{Command, TimerId, TimerKind};
use std::collections::HashMap;
use std::time::Duration;

/// Pending timers, at most one per kind
///
/// Scheduling a kind that is already pending supersedes the older timer; a
/// superseded or cancelled timer that still fires is reported as stale.
#[derive(Debug, Default)]
pub struct TimerBook {
    next_id: TimerId,
    pending: HashMap<TimerKind, TimerId>,
}

impl TimerBook {
    pub fn schedule(&mut self, kind: TimerKind, after: Duration) -> Command {
        self.next_id += 1;
        let id = self.next_id;
        self.pending.insert(kind, id);
        Command::Schedule { id, kind, after }
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.remove(&kind);
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Consume a fired timer; false when it was superseded or cancelled
    pub fn fire(&mut self, id: TimerId, kind: TimerKind) -> bool {
        if self.pending.get(&kind) == Some(&id) {
            self.pending.remove(&kind);
            true
        } else {
            false
        }
    }
}
