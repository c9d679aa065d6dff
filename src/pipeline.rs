//! Export pipeline
//!
//! Orchestrates one run end to end:
//!
//! ```text
//! authenticate → open socket → handshake → paginate → drop canceled
//!     → enrich (optional) → export strategy → file
//! ```
//!
//! The socket is closed on success and on every error path once the handshake
//! has completed. Nothing is written to disk unless the whole run succeeds.

use crate::auth::{AuthApi, CodePrompt, CredentialAuthenticator};
use crate::config::AppConfig;
use crate::core::{drop_canceled, DetailEnricher, SubscriptionClient, TransactionPager};
use crate::protocol::{ProtocolSession, Transport, WebSocketTransport};
use crate::strategy::create_strategy;
use crate::types::{ExportError, RawTransaction, SessionToken};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Location of the written artifact
    pub path: PathBuf,
    /// Transactions retrieved from the timeline, canceled ones included
    pub fetched: usize,
    /// Records present in the artifact
    pub written: usize,
}

/// Run a complete export against the configured endpoints
pub async fn run<A, P>(
    config: &AppConfig,
    authenticator: &mut CredentialAuthenticator<A, P>,
) -> Result<ExportSummary, ExportError>
where
    A: AuthApi,
    P: CodePrompt,
{
    config.ensure_output_dir()?;

    let token = authenticator.authenticate(&config.credentials).await?;
    let transport = WebSocketTransport::connect(&config.api.socket_url).await?;

    run_with_transport(config, token, transport).await
}

/// Run the socket part of an export over an already connected transport
///
/// The transport is closed on every path, including a failed handshake.
pub async fn run_with_transport<T: Transport>(
    config: &AppConfig,
    token: SessionToken,
    transport: T,
) -> Result<ExportSummary, ExportError> {
    let mut session = ProtocolSession::open(transport, token, &config.locale).await?;

    let collected = collect(config, &mut session).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close session");
    }
    let (fetched, transactions) = collected?;

    let path = config.output_path();
    let written = write_export(config, &transactions, &path).await?;
    info!(path = %path.display(), fetched, written, "export complete");

    Ok(ExportSummary {
        path,
        fetched,
        written,
    })
}

/// Paginate, filter and optionally enrich
async fn collect<C>(
    config: &AppConfig,
    client: &mut C,
) -> Result<(usize, Vec<RawTransaction>), ExportError>
where
    C: SubscriptionClient + ?Sized,
{
    let transactions = TransactionPager::new(&mut *client).fetch_all().await?;
    let fetched = transactions.len();

    let transactions = if config.extract_details {
        DetailEnricher::new(config.enrichment_failure)
            .enrich_all(client, transactions)
            .await?
    } else {
        drop_canceled(transactions)
    };

    Ok((fetched, transactions))
}

async fn write_export(
    config: &AppConfig,
    transactions: &[RawTransaction],
    path: &Path,
) -> Result<usize, ExportError> {
    let strategy = create_strategy(config.output_format);
    let mut buffer = Vec::new();
    let written = strategy.export(transactions, &mut buffer)?;
    tokio::fs::write(path, buffer).await?;
    Ok(written)
}
