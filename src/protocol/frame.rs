//! Wire frames of the subscription protocol
//!
//! The protocol is made of plain text commands over one connection:
//!
//! ```text
//! client: connect 31 {"locale":"fr",...}      server: connected
//! client: sub 7 {"type":"timelineTransactions","token":"..."}
//!                                             server: 7 A {"items":[...],"cursors":{...}}
//! client: unsub 7                             server: 7 C
//! ```
//!
//! Server payloads may be wrapped in extraneous bytes; [`extract_json`] isolates
//! the JSON object before parsing.

use crate::types::{Cursor, ProtocolError, SessionToken};
use serde_json::{json, Value};
use std::fmt;

/// Client-assigned message identifier
pub type MessageId = u32;

/// Version announced in the `connect` command
pub const PROTOCOL_VERSION: u32 = 31;

/// Command sent by the client
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Connect { version: u32, config: Value },
    Subscribe { id: MessageId, payload: Value },
    Unsubscribe { id: MessageId },
}

impl fmt::Display for OutboundFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundFrame::Connect { version, config } => write!(f, "connect {} {}", version, config),
            OutboundFrame::Subscribe { id, payload } => write!(f, "sub {} {}", id, payload),
            OutboundFrame::Unsubscribe { id } => write!(f, "unsub {}", id),
        }
    }
}

/// State code following the id of a server frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Full answer to a subscription
    Answer,
    /// Incremental update of a previous answer
    Delta,
    /// Subscription completed (acknowledges an unsubscribe)
    Complete,
    /// Subscription failed
    Error,
}

impl FrameState {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "A" => Some(FrameState::Answer),
            "D" => Some(FrameState::Delta),
            "C" => Some(FrameState::Complete),
            "E" => Some(FrameState::Error),
            _ => None,
        }
    }
}

/// Message received from the server
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// Leading message id, when the frame carries one
    pub id: Option<MessageId>,
    pub state: Option<FrameState>,
    pub raw: String,
}

impl InboundFrame {
    pub fn parse(raw: &str) -> Self {
        let mut tokens = raw.trim_start().split_whitespace();
        let id = tokens.next().and_then(|token| token.parse().ok());
        let state = id
            .and_then(|_| tokens.next())
            .and_then(FrameState::from_token);

        InboundFrame {
            id,
            state,
            raw: raw.to_string(),
        }
    }

    pub fn is_correlated_to(&self, id: MessageId) -> bool {
        self.id == Some(id)
    }

    /// Parsed JSON body of the frame, `{}` when it carries none
    pub fn payload(&self) -> Result<Value, ProtocolError> {
        parse_payload(&self.raw)
    }
}

/// Subscription topic, rendered into a payload together with the session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// One page of the transaction timeline, `after` the given cursor
    TimelineTransactions { after: Option<Cursor> },
    /// Structured detail of one transaction
    TimelineDetail { id: String },
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::TimelineTransactions { .. } => "timelineTransactions",
            Topic::TimelineDetail { .. } => "timelineDetailV2",
        }
    }

    pub fn to_payload(&self, token: &SessionToken) -> Value {
        match self {
            Topic::TimelineTransactions { after: None } => json!({
                "type": self.name(),
                "token": token.as_str(),
            }),
            Topic::TimelineTransactions { after: Some(cursor) } => json!({
                "type": self.name(),
                "token": token.as_str(),
                "after": cursor,
            }),
            Topic::TimelineDetail { id } => json!({
                "type": self.name(),
                "id": id,
                "token": token.as_str(),
            }),
        }
    }
}

/// Isolate the JSON object inside a noisy message
///
/// Returns the slice from the first `{` to the last `}`, or `"{}"` when the
/// message holds no such pair.
pub fn extract_json(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => "{}",
    }
}

/// De-noise and parse a server message
pub fn parse_payload(raw: &str) -> Result<Value, ProtocolError> {
    serde_json::from_str(extract_json(raw)).map_err(|e| {
        ProtocolError::malformed(format!("{} in payload '{}'", e, truncate(raw, 120)))
    })
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((index, _)) => &raw[..index],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::noisy("xxx{\"a\":1}yyy", "{\"a\":1}")]
    #[case::framed("12 A {\"items\":[]}", "{\"items\":[]}")]
    #[case::nested("1 A {\"a\":{\"b\":2}} trailing", "{\"a\":{\"b\":2}}")]
    #[case::no_braces("connected", "{}")]
    #[case::empty("", "{}")]
    #[case::only_open("abc{", "{}")]
    #[case::reversed("}x{", "{}")]
    fn test_extract_json(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(extract_json(raw), expected);
    }

    #[test]
    fn test_parse_payload_without_braces_is_empty_object() {
        assert_eq!(parse_payload("7 C").unwrap(), json!({}));
    }

    #[test]
    fn test_parse_payload_malformed() {
        let result = parse_payload("1 A {not json}");
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedResponse { .. })
        ));
    }

    #[rstest]
    #[case::answer("3 A {\"x\":1}", Some(3), Some(FrameState::Answer))]
    #[case::complete("3 C", Some(3), Some(FrameState::Complete))]
    #[case::error("14 E {\"errors\":[]}", Some(14), Some(FrameState::Error))]
    #[case::delta("2 D =1", Some(2), Some(FrameState::Delta))]
    #[case::no_state("5 {\"x\":1}", Some(5), None)]
    #[case::connected("connected", None, None)]
    #[case::noise("xx{\"a\":1}", None, None)]
    fn test_inbound_frame_parse(
        #[case] raw: &str,
        #[case] id: Option<MessageId>,
        #[case] state: Option<FrameState>,
    ) {
        let frame = InboundFrame::parse(raw);
        assert_eq!(frame.id, id);
        assert_eq!(frame.state, state);
        assert_eq!(frame.raw, raw);
    }

    #[test]
    fn test_outbound_frames() {
        let connect = OutboundFrame::Connect {
            version: PROTOCOL_VERSION,
            config: json!({ "locale": "fr" }),
        };
        let subscribe = OutboundFrame::Subscribe {
            id: 4,
            payload: json!({ "type": "timelineTransactions" }),
        };

        assert_eq!(connect.to_string(), "connect 31 {\"locale\":\"fr\"}");
        assert_eq!(
            subscribe.to_string(),
            "sub 4 {\"type\":\"timelineTransactions\"}"
        );
        assert_eq!(OutboundFrame::Unsubscribe { id: 4 }.to_string(), "unsub 4");
    }

    #[test]
    fn test_topic_payloads() {
        let token = SessionToken::new("tok");

        assert_eq!(
            Topic::TimelineTransactions { after: None }.to_payload(&token),
            json!({ "type": "timelineTransactions", "token": "tok" })
        );
        assert_eq!(
            Topic::TimelineTransactions {
                after: Some("X".to_string())
            }
            .to_payload(&token),
            json!({ "type": "timelineTransactions", "token": "tok", "after": "X" })
        );
        assert_eq!(
            Topic::TimelineDetail {
                id: "tx-1".to_string()
            }
            .to_payload(&token),
            json!({ "type": "timelineDetailV2", "id": "tx-1", "token": "tok" })
        );
    }
}
