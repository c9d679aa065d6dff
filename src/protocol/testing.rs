//! In-memory transports for unit tests
//!
//! [`ScriptedTransport`] records every message the session sends and queues the
//! replies produced by a [`Responder`]. [`TimelineServer`] is a responder that
//! speaks the subscription protocol with canned timeline pages and details.

use crate::protocol::frame::extract_json;
use crate::protocol::transport::Transport;
use crate::types::ProtocolError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Produces the server replies to one client message
pub trait Responder: Send {
    fn respond(&mut self, message: &str) -> Vec<String>;
}

/// Replies handed out in order, one batch per client message
struct ReplyQueue(VecDeque<Vec<String>>);

impl Responder for ReplyQueue {
    fn respond(&mut self, _message: &str) -> Vec<String> {
        self.0.pop_front().unwrap_or_default()
    }
}

pub struct ScriptedTransport {
    responder: Box<dyn Responder>,
    inbound: VecDeque<String>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedTransport {
    pub fn new(responder: impl Responder + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            inbound: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_replies(replies: Vec<Vec<String>>) -> Self {
        Self::new(ReplyQueue(replies.into()))
    }

    /// Shared log of every message sent through the transport
    pub fn sent_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, message: String) -> Result<(), ProtocolError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionClosed);
        }
        let replies = self.responder.respond(&message);
        self.inbound.extend(replies);
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, ProtocolError> {
        self.inbound.pop_front().ok_or(ProtocolError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Protocol-speaking responder with canned pages and details
///
/// Pages are keyed by the `after` cursor they answer (`None` for the first page).
/// Unknown pages and details are answered with an error frame.
#[derive(Default)]
pub struct TimelineServer {
    pages: HashMap<Option<String>, Value>,
    details: HashMap<String, Value>,
    hang_up_on: HashSet<String>,
}

impl TimelineServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, after: Option<&str>, page: Value) -> Self {
        self.pages.insert(after.map(str::to_string), page);
        self
    }

    pub fn detail(mut self, id: &str, detail: Value) -> Self {
        self.details.insert(id.to_string(), detail);
        self
    }

    /// Drop the connection instead of answering the detail request for `id`
    pub fn hang_up_on_detail(mut self, id: &str) -> Self {
        self.hang_up_on.insert(id.to_string());
        self
    }
}

impl Responder for TimelineServer {
    fn respond(&mut self, message: &str) -> Vec<String> {
        if message.starts_with("connect ") {
            return vec!["connected".to_string()];
        }
        if let Some(id) = message.strip_prefix("unsub ") {
            return vec![format!("{} C", id)];
        }

        let Some(rest) = message.strip_prefix("sub ") else {
            return Vec::new();
        };
        let id = rest.split(' ').next().unwrap_or_default();
        let payload: Value = serde_json::from_str(extract_json(rest)).unwrap_or_default();

        let answer = match payload["type"].as_str() {
            Some("timelineTransactions") => {
                let after = payload["after"].as_str().map(str::to_string);
                self.pages.get(&after).cloned()
            }
            Some("timelineDetailV2") => {
                let tx_id = payload["id"].as_str().unwrap_or_default();
                if self.hang_up_on.contains(tx_id) {
                    return Vec::new();
                }
                self.details.get(tx_id).cloned()
            }
            _ => None,
        };

        match answer {
            Some(body) => vec![format!("{} A {}", id, body)],
            None => vec![format!("{} E {{\"errors\":[{{\"errorCode\":\"NOT_FOUND\"}}]}}", id)],
        }
    }
}
