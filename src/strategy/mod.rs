//! Export strategy module
//!
//! This module defines the Strategy pattern for the final stage of a run: turning
//! the retrieved (and possibly enriched) transactions into an export artifact.
//! The implementation is selected at runtime from the configured output format.

use crate::config::OutputFormat;
use crate::types::{ExportError, RawTransaction};
use std::io::Write;

pub mod csv_export;
pub mod json_export;

pub use csv_export::CsvExportStrategy;
pub use json_export::JsonExportStrategy;

/// Export strategy trait
///
/// Each strategy writes one complete artifact for the given transactions.
/// Canceled transactions never appear in the output, whatever the strategy.
pub trait ExportStrategy: Send + Sync {
    /// Write the export of `transactions` to `output`
    ///
    /// # Returns
    ///
    /// The number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or a write to `output` fails.
    fn export(
        &self,
        transactions: &[RawTransaction],
        output: &mut dyn Write,
    ) -> Result<usize, ExportError>;
}

/// Create the export strategy for `format`
pub fn create_strategy(format: OutputFormat) -> Box<dyn ExportStrategy> {
    match format {
        OutputFormat::Json => Box::new(JsonExportStrategy),
        OutputFormat::Csv => Box::new(CsvExportStrategy::default()),
    }
}
