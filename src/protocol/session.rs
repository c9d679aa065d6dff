//! Protocol session
//!
//! [`ProtocolSession`] owns the single connection of a run together with the
//! session token and the message-id counter. Every request follows the same
//! strictly sequential exchange:
//!
//! ```text
//! sub <id> <payload>   → wait for the frame correlated to <id>
//! unsub <id>           → wait for its acknowledgement
//! return the de-noised payload
//! ```
//!
//! Only one subscription is ever outstanding. Frames that are not correlated
//! to it are logged and discarded by the read loop.

use crate::config::LocaleConfig;
use crate::core::traits::SubscriptionClient;
use crate::protocol::frame::{
    FrameState, InboundFrame, MessageId, OutboundFrame, Topic, PROTOCOL_VERSION,
};
use crate::protocol::transport::Transport;
use crate::types::{ProtocolError, SessionToken};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Monotonic message-id allocator
///
/// Ids start at 1 and are never reused within a session.
#[derive(Debug, Default)]
pub struct MessageIdCounter {
    last: MessageId,
}

impl MessageIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> MessageId {
        self.last += 1;
        self.last
    }

    /// Last id handed out, 0 before the first allocation
    pub fn last_issued(&self) -> MessageId {
        self.last
    }
}

/// Single-connection subscription session
pub struct ProtocolSession<T: Transport> {
    transport: T,
    token: SessionToken,
    ids: MessageIdCounter,
    /// Subscription still waiting for its unsubscribe acknowledgement
    outstanding: Option<MessageId>,
}

impl<T: Transport> ProtocolSession<T> {
    /// Perform the connect handshake over `transport`
    ///
    /// Sends `connect <version> <locale-config>` and waits for the server's
    /// acknowledgement before returning; no other traffic happens before that.
    /// The transport is closed when the handshake fails.
    pub async fn open(
        mut transport: T,
        token: SessionToken,
        locale: &LocaleConfig,
    ) -> Result<Self, ProtocolError> {
        if let Err(e) = Self::handshake(&mut transport, locale).await {
            if let Err(close_error) = transport.close().await {
                warn!(error = %close_error, "failed to close transport after handshake error");
            }
            return Err(e);
        }

        Ok(Self {
            transport,
            token,
            ids: MessageIdCounter::new(),
            outstanding: None,
        })
    }

    async fn handshake(transport: &mut T, locale: &LocaleConfig) -> Result<(), ProtocolError> {
        let config = serde_json::to_value(locale)?;
        let connect = OutboundFrame::Connect {
            version: PROTOCOL_VERSION,
            config,
        };
        transport.send(connect.to_string()).await?;
        let ack = transport.recv().await?;
        debug!(ack = %ack, "connect acknowledged");
        Ok(())
    }

    /// Last message id issued on this session
    pub fn last_message_id(&self) -> MessageId {
        self.ids.last_issued()
    }

    /// Subscribe to `topic`, wait for its answer, unsubscribe and return the payload
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::OutstandingSubscription`] if a previous exchange was
    ///   interrupted and never unsubscribed
    /// - [`ProtocolError::Subscription`] if the server answered with an error frame
    /// - [`ProtocolError::MalformedResponse`] if the payload cannot be parsed
    /// - transport errors, which leave the session unusable
    pub async fn request(&mut self, topic: &Topic) -> Result<Value, ProtocolError> {
        if let Some(pending) = self.outstanding {
            return Err(ProtocolError::OutstandingSubscription { pending });
        }

        let id = self.ids.next_id();
        let subscribe = OutboundFrame::Subscribe {
            id,
            payload: topic.to_payload(&self.token),
        };
        debug!(id, topic = topic.name(), "sub");
        self.transport.send(subscribe.to_string()).await?;
        self.outstanding = Some(id);

        let response = self.read_until(id, |_| true).await?;

        self.transport
            .send(OutboundFrame::Unsubscribe { id }.to_string())
            .await?;
        self.read_until(id, |frame| {
            !matches!(frame.state, Some(FrameState::Answer | FrameState::Delta))
        })
        .await?;
        self.outstanding = None;
        debug!(id, "unsub acknowledged");

        if response.state == Some(FrameState::Error) {
            return Err(ProtocolError::Subscription {
                id,
                message: response.payload().map_or_else(
                    |_| response.raw.clone(),
                    |payload| payload.to_string(),
                ),
            });
        }

        response.payload()
    }

    /// Close the underlying connection
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        debug!(last_id = self.ids.last_issued(), "closing session");
        self.transport.close().await
    }

    /// Read frames until one correlated to `id` satisfies `accept`
    async fn read_until<F>(&mut self, id: MessageId, accept: F) -> Result<InboundFrame, ProtocolError>
    where
        F: Fn(&InboundFrame) -> bool + Send,
    {
        loop {
            let raw = self.transport.recv().await?;
            let frame = InboundFrame::parse(&raw);
            if frame.is_correlated_to(id) && accept(&frame) {
                return Ok(frame);
            }
            warn!(expected = id, received = ?frame.id, "discarding uncorrelated frame");
        }
    }
}

#[async_trait]
impl<T: Transport> SubscriptionClient for ProtocolSession<T> {
    async fn request(&mut self, topic: &Topic) -> Result<Value, ProtocolError> {
        ProtocolSession::request(self, topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::{ScriptedTransport, TimelineServer};
    use serde_json::json;

    async fn open_session(transport: ScriptedTransport) -> ProtocolSession<ScriptedTransport> {
        ProtocolSession::open(transport, SessionToken::new("tok"), &LocaleConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_sends_connect_and_waits_for_ack() {
        let transport = ScriptedTransport::new(TimelineServer::new());
        let sent = transport.sent_log();

        let session = open_session(transport).await;

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("connect 31 {"));
        assert!(sent[0].contains("\"platformId\":\"webtrading\""));
        assert_eq!(session.last_message_id(), 0);
    }

    #[tokio::test]
    async fn test_failed_handshake_closes_transport() {
        let transport = ScriptedTransport::from_replies(vec![]);
        let closed = transport.closed_flag();

        let result =
            ProtocolSession::open(transport, SessionToken::new("tok"), &LocaleConfig::default()).await;

        assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_request_sub_unsub_exchange() {
        let server = TimelineServer::new().page(None, json!({ "items": [], "cursors": {} }));
        let transport = ScriptedTransport::new(server);
        let sent = transport.sent_log();
        let mut session = open_session(transport).await;

        let payload = session
            .request(&Topic::TimelineTransactions { after: None })
            .await
            .unwrap();

        assert_eq!(payload, json!({ "items": [], "cursors": {} }));
        let sent = sent.lock().unwrap();
        let subscribe = sent[1].strip_prefix("sub 1 ").unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(subscribe).unwrap(),
            json!({ "type": "timelineTransactions", "token": "tok" })
        );
        assert_eq!(sent[2], "unsub 1");
        assert_eq!(sent.len(), 3);
    }

    #[tokio::test]
    async fn test_ids_strictly_increase() {
        let server = TimelineServer::new()
            .page(None, json!({ "items": [] }))
            .detail("a", json!({ "sections": [] }))
            .detail("b", json!({ "sections": [] }));
        let transport = ScriptedTransport::new(server);
        let sent = transport.sent_log();
        let mut session = open_session(transport).await;

        session
            .request(&Topic::TimelineTransactions { after: None })
            .await
            .unwrap();
        session
            .request(&Topic::TimelineDetail { id: "a".to_string() })
            .await
            .unwrap();
        session
            .request(&Topic::TimelineDetail { id: "b".to_string() })
            .await
            .unwrap();

        let ids: Vec<u32> = sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|frame| frame.strip_prefix("sub "))
            .map(|rest| rest.split(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(session.last_message_id(), 3);
    }

    #[tokio::test]
    async fn test_uncorrelated_frames_are_discarded() {
        let transport = ScriptedTransport::from_replies(vec![
            vec!["connected".to_string()],
            vec![
                "99 A {\"stale\":true}".to_string(),
                "noise without id".to_string(),
                "1 A garbage{\"ok\":1}garbage".to_string(),
            ],
            vec!["99 C".to_string(), "1 C".to_string()],
        ]);
        let mut session = open_session(transport).await;

        let payload = session
            .request(&Topic::TimelineDetail { id: "x".to_string() })
            .await
            .unwrap();

        assert_eq!(payload, json!({ "ok": 1 }));
    }

    #[tokio::test]
    async fn test_payload_without_json_is_empty_object() {
        let transport = ScriptedTransport::from_replies(vec![
            vec!["connected".to_string()],
            vec!["1 A".to_string()],
            vec!["1 C".to_string()],
        ]);
        let mut session = open_session(transport).await;

        let payload = session
            .request(&Topic::TimelineDetail { id: "x".to_string() })
            .await
            .unwrap();

        assert_eq!(payload, json!({}));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let transport = ScriptedTransport::from_replies(vec![
            vec!["connected".to_string()],
            vec!["1 A {\"items\": [}".to_string()],
            vec!["1 C".to_string()],
        ]);
        let sent_log = transport.sent_log();
        let mut session = open_session(transport).await;

        let result = session
            .request(&Topic::TimelineTransactions { after: None })
            .await;

        assert!(matches!(
            result,
            Err(ProtocolError::MalformedResponse { .. })
        ));
        // The unsubscribe still happened before the error surfaced
        assert_eq!(sent_log.lock().unwrap().last().unwrap(), "unsub 1");
    }

    #[tokio::test]
    async fn test_error_frame() {
        let server = TimelineServer::new();
        let transport = ScriptedTransport::new(server);
        let mut session = open_session(transport).await;

        let result = session
            .request(&Topic::TimelineDetail {
                id: "unknown".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(ProtocolError::Subscription { id: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_interrupted_exchange_blocks_next_request() {
        let transport = ScriptedTransport::from_replies(vec![vec!["connected".to_string()]]);
        let mut session = open_session(transport).await;

        let first = session
            .request(&Topic::TimelineTransactions { after: None })
            .await;
        assert_eq!(first, Err(ProtocolError::ConnectionClosed));

        let second = session
            .request(&Topic::TimelineTransactions { after: None })
            .await;
        assert_eq!(
            second,
            Err(ProtocolError::OutstandingSubscription { pending: 1 })
        );
    }
}
