//! JSON export of merged raw records

use crate::types::{ExportError, RawTransaction};
use std::io::Write;

/// Write `transactions` as a pretty-printed JSON array
///
/// Canceled transactions are left out. Field names follow the server payload;
/// fields the exporter does not interpret are written back unchanged.
pub fn write_transactions_json(
    transactions: &[RawTransaction],
    output: &mut dyn Write,
) -> Result<usize, ExportError> {
    let kept: Vec<&RawTransaction> = transactions
        .iter()
        .filter(|transaction| !transaction.is_canceled())
        .collect();

    serde_json::to_writer_pretty(&mut *output, &kept).map_err(|e| ExportError::Serialization {
        message: e.to_string(),
    })?;
    output.write_all(b"\n")?;
    output.flush()?;

    Ok(kept.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_write_transactions_json() {
        let transactions: Vec<RawTransaction> = serde_json::from_value(json!([
            { "id": "1", "status": "EXECUTED", "amount": { "value": 12.5, "currency": "EUR" }, "icon": "logo" },
            { "id": "2", "status": "CANCELED" },
            { "id": "3", "eventType": "PAYMENT_INBOUND" }
        ]))
        .unwrap();

        let mut output = Vec::new();
        let written = write_transactions_json(&transactions, &mut output).unwrap();

        assert_eq!(written, 2);
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("[\n  {"));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["id"], "1");
        assert_eq!(parsed[0]["icon"], "logo");
        assert_eq!(parsed[0]["amount"]["currency"], "EUR");
        assert_eq!(parsed[1]["eventType"], "PAYMENT_INBOUND");
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_export_is_empty_array() {
        let mut output = Vec::new();
        write_transactions_json(&[], &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "[]\n");
    }
}
