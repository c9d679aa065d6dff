//! Subscription protocol module
//!
//! # Components
//!
//! - `frame` - Wire frames, topics and payload de-noising
//! - `transport` - Connection abstraction and the WebSocket implementation
//! - `session` - Handshake, id allocation and the sub/unsub exchange

pub mod frame;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use frame::{extract_json, parse_payload, InboundFrame, MessageId, OutboundFrame, Topic};
pub use session::{MessageIdCounter, ProtocolSession};
pub use transport::{Transport, WebSocketTransport};
