//! Per-transaction detail enrichment
//!
//! For every retained transaction the enricher issues a `timelineDetailV2`
//! request through the same [`SubscriptionClient`] used by the pager, so message
//! ids stay unique across both kinds of traffic.
//!
//! # Merging
//!
//! - Items of the section titled "Transaction" become `details` entries (title → text)
//! - The payload of an `instrumentDetail` action, on any section, becomes the ISIN
//! - The detail sections are carried onto the record unchanged for the JSON export
//!
//! # Failure Policy
//!
//! A failed detail request either aborts the run or leaves the record
//! unenriched, depending on [`EnrichmentFailurePolicy`]. Transport failures
//! always abort because the connection can no longer be used.

use crate::config::EnrichmentFailurePolicy;
use crate::core::traits::SubscriptionClient;
use crate::protocol::Topic;
use crate::types::{DetailResponse, ExportError, ProtocolError, RawTransaction};
use tracing::{debug, info, warn};

/// Title of the detail section holding the line items
pub const TRANSACTION_SECTION: &str = "Transaction";

/// Action type whose payload is the security identifier
pub const INSTRUMENT_ACTION: &str = "instrumentDetail";

/// Remove canceled transactions, keeping the order of the others
pub fn drop_canceled(transactions: Vec<RawTransaction>) -> Vec<RawTransaction> {
    let before = transactions.len();
    let kept: Vec<RawTransaction> = transactions
        .into_iter()
        .filter(|tx| !tx.is_canceled())
        .collect();
    if kept.len() != before {
        debug!(dropped = before - kept.len(), "canceled transactions removed");
    }
    kept
}

/// Merge a detail response into `transaction`
pub fn merge_detail(transaction: &mut RawTransaction, detail: DetailResponse) {
    for section in &detail.sections {
        if section.title.as_deref() == Some(TRANSACTION_SECTION) {
            for item in &section.items {
                if let (Some(title), Some(text)) = (&item.title, &item.text) {
                    if !title.is_empty() && !text.is_empty() {
                        transaction.details.insert(title.clone(), text.clone());
                    }
                }
            }
        }

        if transaction.isin.is_none() {
            let isin = section
                .action
                .as_ref()
                .filter(|action| action.kind.as_deref() == Some(INSTRUMENT_ACTION))
                .and_then(|action| action.payload.as_ref())
                .and_then(|payload| payload.as_str())
                .filter(|payload| !payload.is_empty());
            if let Some(isin) = isin {
                transaction.isin = Some(isin.to_string());
            }
        }
    }

    transaction.sections = detail.raw_sections;
}

/// Fetches and merges transaction details
#[derive(Debug, Clone, Copy)]
pub struct DetailEnricher {
    policy: EnrichmentFailurePolicy,
}

impl DetailEnricher {
    pub fn new(policy: EnrichmentFailurePolicy) -> Self {
        Self { policy }
    }

    /// Enrich every non-canceled transaction
    ///
    /// Canceled transactions are dropped; transactions without an id pass
    /// through untouched. Output order equals input order.
    ///
    /// # Errors
    ///
    /// - [`ExportError::Protocol`] on transport failures
    /// - [`ExportError::Enrichment`] on a detail failure under the abort policy
    pub async fn enrich_all<C>(
        &self,
        client: &mut C,
        transactions: Vec<RawTransaction>,
    ) -> Result<Vec<RawTransaction>, ExportError>
    where
        C: SubscriptionClient + ?Sized,
    {
        let transactions = drop_canceled(transactions);
        let total = transactions.len();
        let mut enriched = Vec::with_capacity(total);
        let mut skipped = 0usize;

        for mut transaction in transactions {
            if !transaction.id.is_empty() {
                match self.enrich_one(client, &mut transaction).await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal_to_session() => return Err(e.into()),
                    Err(e) => match self.policy {
                        EnrichmentFailurePolicy::Abort => {
                            return Err(ExportError::enrichment(&transaction.id, e))
                        }
                        EnrichmentFailurePolicy::Skip => {
                            warn!(id = %transaction.id, error = %e, "detail unavailable, keeping record unenriched");
                            skipped += 1;
                        }
                    },
                }
            }
            enriched.push(transaction);
        }

        info!(transactions = total, skipped, "details fetched");
        Ok(enriched)
    }

    /// Fetch and merge the detail of one transaction
    pub async fn enrich_one<C>(
        &self,
        client: &mut C,
        transaction: &mut RawTransaction,
    ) -> Result<(), ProtocolError>
    where
        C: SubscriptionClient + ?Sized,
    {
        let payload = client
            .request(&Topic::TimelineDetail {
                id: transaction.id.clone(),
            })
            .await?;
        let detail: DetailResponse = serde_json::from_value(payload)
            .map_err(|e| ProtocolError::malformed(format!("detail {}: {}", transaction.id, e)))?;
        merge_detail(transaction, detail);
        Ok(())
    }
}
