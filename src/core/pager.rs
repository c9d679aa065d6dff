//! Cursor-based timeline pagination
//!
//! The pager requests `timelineTransactions` pages through a
//! [`SubscriptionClient`] and follows the `cursors.after` value of each page.
//!
//! # Termination
//!
//! The loop stops at the first page whose item list is empty or which carries
//! no next cursor. Items of that last page are still kept. Server order is
//! preserved within and across pages; nothing is reordered or deduplicated.

use crate::core::traits::SubscriptionClient;
use crate::protocol::Topic;
use crate::types::{Cursor, ProtocolError, RawTransaction, TimelinePage};
use tracing::{debug, info};

/// Drives timeline pagination over a subscription client
pub struct TransactionPager<'a, C: SubscriptionClient + ?Sized> {
    client: &'a mut C,
}

impl<'a, C: SubscriptionClient + ?Sized> TransactionPager<'a, C> {
    pub fn new(client: &'a mut C) -> Self {
        Self { client }
    }

    /// Fetch every page of the timeline
    ///
    /// # Returns
    ///
    /// All transactions in server order.
    ///
    /// # Errors
    ///
    /// Propagates any [`ProtocolError`] from the client, and returns
    /// [`ProtocolError::MalformedResponse`] for a page that is not a timeline page.
    pub async fn fetch_all(&mut self) -> Result<Vec<RawTransaction>, ProtocolError> {
        let mut transactions = Vec::new();
        let mut after: Option<Cursor> = None;
        let mut pages = 0usize;

        loop {
            let payload = self
                .client
                .request(&Topic::TimelineTransactions {
                    after: after.take(),
                })
                .await?;
            let page: TimelinePage = serde_json::from_value(payload)
                .map_err(|e| ProtocolError::malformed(format!("timeline page: {}", e)))?;
            pages += 1;

            let item_count = page.items.len();
            let next = page.next_cursor().map(str::to_string);
            transactions.extend(page.items);
            debug!(page = pages, items = item_count, has_next = next.is_some(), "timeline page");

            match next {
                Some(cursor) if item_count > 0 => after = Some(cursor),
                _ => break,
            }
        }

        info!(pages, transactions = transactions.len(), "timeline fetched");
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::testing::RecordingClient;
    use serde_json::json;

    fn after_of(topic: &Topic) -> Option<&str> {
        match topic {
            Topic::TimelineTransactions { after } => after.as_deref(),
            other => panic!("unexpected topic {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_follows_cursor_until_absent() {
        let mut client = RecordingClient::new(vec![
            Ok(json!({ "items": [{ "id": "1" }, { "id": "2" }], "cursors": { "after": "X" } })),
            Ok(json!({ "items": [{ "id": "3" }], "cursors": {} })),
            Ok(json!({ "items": [{ "id": "never" }] })),
        ]);

        let transactions = TransactionPager::new(&mut client).fetch_all().await.unwrap();

        let ids: Vec<&str> = transactions.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(client.topics.len(), 2);
        assert_eq!(after_of(&client.topics[0]), None);
        assert_eq!(after_of(&client.topics[1]), Some("X"));
    }

    #[tokio::test]
    async fn test_stops_on_empty_page_even_with_cursor() {
        let mut client = RecordingClient::new(vec![
            Ok(json!({ "items": [{ "id": "1" }], "cursors": { "after": "A" } })),
            Ok(json!({ "items": [], "cursors": { "after": "B" } })),
            Ok(json!({ "items": [{ "id": "never" }] })),
        ]);

        let transactions = TransactionPager::new(&mut client).fetch_all().await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(client.topics.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_payload_ends_pagination() {
        let mut client = RecordingClient::new(vec![Ok(json!({}))]);

        let transactions = TransactionPager::new(&mut client).fetch_all().await.unwrap();

        assert!(transactions.is_empty());
        assert_eq!(client.topics.len(), 1);
    }

    #[tokio::test]
    async fn test_null_items_end_pagination() {
        let mut client = RecordingClient::new(vec![
            Ok(json!({ "items": [{ "id": "1" }], "cursors": { "after": "A" } })),
            Ok(json!({ "items": null, "cursors": { "after": "B" } })),
            Ok(json!({ "items": [{ "id": "never" }] })),
        ]);

        let transactions = TransactionPager::new(&mut client).fetch_all().await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(client.topics.len(), 2);
    }

    #[tokio::test]
    async fn test_items_without_id_are_kept() {
        let mut client = RecordingClient::new(vec![Ok(json!({
            "items": [
                { "id": "a", "title": "First" },
                { "id": null, "title": "Second" },
                { "title": "Third" }
            ],
            "cursors": {}
        }))]);

        let transactions = TransactionPager::new(&mut client).fetch_all().await.unwrap();

        let ids: Vec<&str> = transactions.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "", ""]);
        assert_eq!(transactions[1].title.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_preserves_server_order_and_duplicates() {
        let mut client = RecordingClient::new(vec![
            Ok(json!({ "items": [{ "id": "b" }, { "id": "a" }], "cursors": { "after": "1" } })),
            Ok(json!({ "items": [{ "id": "a" }, { "id": "c" }] })),
        ]);

        let transactions = TransactionPager::new(&mut client).fetch_all().await.unwrap();

        let ids: Vec<&str> = transactions.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "a", "c"]);
    }

    #[tokio::test]
    async fn test_malformed_page() {
        let mut client = RecordingClient::new(vec![Ok(json!({ "items": "nope" }))]);

        let result = TransactionPager::new(&mut client).fetch_all().await;

        assert!(matches!(
            result,
            Err(ProtocolError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_propagates_client_error() {
        let mut client = RecordingClient::new(vec![
            Ok(json!({ "items": [{ "id": "1" }], "cursors": { "after": "A" } })),
            Err(ProtocolError::ConnectionClosed),
        ]);

        let result = TransactionPager::new(&mut client).fetch_all().await;

        assert_eq!(result.unwrap_err(), ProtocolError::ConnectionClosed);
    }
}
