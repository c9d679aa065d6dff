//! Core traits
//!
//! [`SubscriptionClient`] is the seam between the ingestion logic (pager and
//! enricher) and the protocol session, so both can be exercised without a socket.

use crate::protocol::Topic;
use crate::types::ProtocolError;
use async_trait::async_trait;
use serde_json::Value;

/// Issues one correlated request and returns its parsed payload
#[async_trait]
pub trait SubscriptionClient: Send {
    /// Request `topic` and wait for the answer
    ///
    /// Implementations must keep at most one request in flight and allocate
    /// message ids from a single counter shared by every caller.
    async fn request(&mut self, topic: &Topic) -> Result<Value, ProtocolError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Client returning canned responses in order and recording requested topics
    #[derive(Default)]
    pub struct RecordingClient {
        pub responses: VecDeque<Result<Value, ProtocolError>>,
        pub topics: Vec<Topic>,
    }

    impl RecordingClient {
        pub fn new(responses: Vec<Result<Value, ProtocolError>>) -> Self {
            Self {
                responses: responses.into(),
                topics: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl SubscriptionClient for RecordingClient {
        async fn request(&mut self, topic: &Topic) -> Result<Value, ProtocolError> {
            self.topics.push(topic.clone());
            self.responses
                .pop_front()
                .unwrap_or(Err(ProtocolError::ConnectionClosed))
        }
    }
}
