//! Link to the assistant backend
//!
//! - `client`: the `Backend` trait and its reqwest/WebSocket implementation
//! - `socket`: the session socket (JSON text frames in both directions)
//! - `messages`: wire types for the socket and the session HTTP endpoints
//! - `supervisor`: bounded-attempt initialization (new session + new socket)

pub mod client;
pub mod messages;
pub mod socket;
pub mod supervisor;

pub use client::{Backend, HttpBackend};
pub use messages::{
    ApiKeys, ApiKeysResponse, ApiKeysStatus, ApiService, AvailableFeatures, ClientMessage,
    ServerMessage, SessionCreated, SessionStatus,
};
pub use socket::SocketHandle;
pub use supervisor::{establish, RetryPolicy};
