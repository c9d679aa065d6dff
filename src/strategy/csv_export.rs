//! CSV export strategy
//!
//! Normalizes the transactions into the accounting schema and writes them with
//! the `;`-delimited layout of [`crate::io::csv_format`]. Records the normalizer
//! rejects (zero total, unparsable date, canceled) are not written.

use crate::core::RecordNormalizer;
use crate::io::csv_format::write_records_csv;
use crate::strategy::ExportStrategy;
use crate::types::{ExportError, RawTransaction};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct CsvExportStrategy {
    normalizer: RecordNormalizer,
}

impl CsvExportStrategy {
    pub fn new(normalizer: RecordNormalizer) -> Self {
        Self { normalizer }
    }
}

impl ExportStrategy for CsvExportStrategy {
    fn export(
        &self,
        transactions: &[RawTransaction],
        output: &mut dyn Write,
    ) -> Result<usize, ExportError> {
        let records = self.normalizer.normalize_all(transactions);
        write_records_csv(&records, output)?;
        debug!(
            records = records.len(),
            dropped = transactions.len() - records.len(),
            "csv export written"
        );
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_export_drops_zero_and_canceled() {
        let transactions: Vec<RawTransaction> = serde_json::from_value(json!([
            { "id": "1", "eventType": "INTEREST_PAYOUT", "timestamp": "2024-05-01T08:00:00.000+0000",
              "title": "Intérêts", "amount": { "value": 1.23, "currency": "EUR" } },
            { "id": "2", "timestamp": "2024-05-02T08:00:00.000+0000", "amount": { "value": 0 } },
            { "id": "3", "status": "CANCELED", "timestamp": "2024-05-03T08:00:00.000+0000",
              "amount": { "value": 10 } }
        ]))
        .unwrap();

        let mut output = Vec::new();
        let written = CsvExportStrategy::default()
            .export(&transactions, &mut output)
            .unwrap();

        assert_eq!(written, 1);
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2024-05-01;Intérêts;Intérêts;;;;1,23;EUR;;");
    }
}
