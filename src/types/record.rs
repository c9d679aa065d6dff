//! Normalized accounting record
//!
//! The fixed schema every merged transaction is mapped into before the tabular export.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

/// Accounting category of a record
///
/// The labels are part of the export contract with downstream accounting tools
/// and are therefore kept in French.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Purchase of a security, including savings plan executions
    Achat,
    /// Sale of a security
    Vente,
    /// Dividend or fund distribution
    Dividendes,
    /// Interest payout
    Interets,
    /// Incoming transfer
    Depot,
    /// Outgoing transfer
    Retrait,
    /// Anything the classification rules do not recognise
    Autre,
}

impl RecordType {
    /// Label written to the export
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Achat => "Achat",
            RecordType::Vente => "Vente",
            RecordType::Dividendes => "Dividendes",
            RecordType::Interets => "Intérêts",
            RecordType::Depot => "Dépôt",
            RecordType::Retrait => "Retrait",
            RecordType::Autre => "Autre",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the accounting export
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Calendar date of the transaction (time of day discarded)
    pub date: NaiveDate,
    pub record_type: RecordType,
    /// Security or counterparty name
    pub title: String,
    pub isin: Option<String>,
    pub note: Option<String>,
    /// Number of shares, when the detail carries one
    pub quantity: Option<Decimal>,
    /// Signed amount; never zero in an exported record
    pub total: Decimal,
    pub currency: Option<String>,
    pub fees: Option<Decimal>,
    pub taxes: Option<Decimal>,
}
