//! JSON export strategy
//!
//! Writes the merged raw records as received from the server, enrichment fields
//! included, so nothing the socket delivered is lost.

use crate::io::json_format::write_transactions_json;
use crate::strategy::ExportStrategy;
use crate::types::{ExportError, RawTransaction};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct JsonExportStrategy;

impl ExportStrategy for JsonExportStrategy {
    fn export(
        &self,
        transactions: &[RawTransaction],
        output: &mut dyn Write,
    ) -> Result<usize, ExportError> {
        let written = write_transactions_json(transactions, output)?;
        debug!(records = written, "json export written");
        Ok(written)
    }
}
