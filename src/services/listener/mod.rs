//! Push-channel listener service.
//!
//! Provides the long-lived subscription client for the gateway's push
//! channel:
//!
//! - Connection lifecycle and handshake state machine
//! - Typed inbound message parsing and multicast dispatch
//! - Per-address subscriptions with multisig fan-out
//! - Transport abstraction with the production WebSocket implementation

mod channel;
mod config;
mod connection;
mod error;
mod message;
mod service;
mod transport;

pub use channel::ListenerChannel;
pub use config::ListenerConfig;
pub use connection::ConnectionState;
pub use error::{CloseEvent, ListenerError};
pub use message::{InboundFrame, ListenerMessage, ListenerPayload};
pub use service::Listener;
pub use transport::{FrameSink, PushChannel, WireEvent, WireEventStream, WsPushChannel};
