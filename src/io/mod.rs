//! I/O module
//!
//! Handles the export artifacts.
//!
//! # Components
//!
//! - `csv_format` - Accounting CSV layout and serialization
//! - `json_format` - Pretty-printed JSON document of merged records

pub mod csv_format;
pub mod json_format;

pub use csv_format::{format_decimal, write_records_csv, CSV_HEADER};
pub use json_format::write_transactions_json;
