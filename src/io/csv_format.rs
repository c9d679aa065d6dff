//! CSV format handling for the accounting export
//!
//! This module centralizes all tabular output concerns:
//! - The column layout (`CSV_HEADER`) shared with downstream accounting tools
//! - Localized rendering of decimals and dates
//! - Serialization of [`NormalizedRecord`]s to any writer
//!
//! The output is `;` delimited with a header line that is always written, even
//! when there are no records.

use crate::types::{ExportError, NormalizedRecord};
use rust_decimal::Decimal;
use std::io::Write;

/// Field delimiter of the export
pub const CSV_DELIMITER: u8 = b';';

/// Column names, in output order
pub const CSV_HEADER: [&str; 10] = [
    "Date",
    "Type",
    "Nom du titre",
    "ISIN",
    "Note",
    "Nombre de titres",
    "Valeur",
    "Devise",
    "Frais",
    "Impôts / taxes",
];

/// Render a decimal with a comma separator and no grouping (`-1234,5`)
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string().replace('.', ",")
}

fn format_optional_decimal(value: Option<Decimal>) -> String {
    value.map(format_decimal).unwrap_or_default()
}

/// Build the cells of one record, in `CSV_HEADER` order
pub fn record_row(record: &NormalizedRecord) -> [String; 10] {
    [
        record.date.format("%Y-%m-%d").to_string(),
        record.record_type.label().to_string(),
        record.title.clone(),
        record.isin.clone().unwrap_or_default(),
        record.note.clone().unwrap_or_default(),
        format_optional_decimal(record.quantity),
        format_decimal(record.total),
        record.currency.clone().unwrap_or_default(),
        format_optional_decimal(record.fees),
        format_optional_decimal(record.taxes),
    ]
}

/// Write normalized records in the accounting CSV layout
///
/// Records are written in the order given.
///
/// # Errors
///
/// Returns [`ExportError::Serialization`] if the writer rejects a row or the
/// final flush fails.
pub fn write_records_csv(
    records: &[NormalizedRecord],
    output: &mut dyn Write,
) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_writer(output);

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(record_row(record))?;
    }
    writer.flush()?;

    Ok(())
}
