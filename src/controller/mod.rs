//! Session controller
//!
//! This module provides the `SessionController` state machine that coordinates:
//! - The recording turn (microphone, recognizer, watchdog)
//! - The backend link (initialization, reconnect, persona announcement)
//! - Responses (history, speech synthesis)
//! - The status projection handed to the renderer

mod event;
mod session;
mod state;
mod timers;

pub use event::{
    Command, ConnId, Event, EventReceiver, EventSender, Segment, TimerId, TimerKind,
};
pub use session::SessionController;
pub use state::{AgentState, StatusView};
