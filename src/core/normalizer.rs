//! Record normalization
//!
//! Maps merged [`RawTransaction`]s into the fixed accounting schema of
//! [`NormalizedRecord`]. Records that cannot be represented are dropped, not
//! reported:
//!
//! - canceled transactions
//! - transactions whose total is missing, unparsable or zero
//! - transactions whose timestamp has no recognisable date
//!
//! Quantities, fees and taxes come from the detail entries and use the
//! localized notation of the server ("1.234,56 €", "Gratuit").

use crate::core::classifier::Classifier;
use crate::types::{NormalizedRecord, RawTransaction};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

pub const QUANTITY_KEYS: &[&str] = &["Titres", "Actions", "Parts", "Quantité", "Shares"];
pub const FEE_KEYS: &[&str] = &["Frais", "Fee", "Frais externes"];
pub const TAX_KEYS: &[&str] = &["Impôts", "Taxes", "Tax"];

/// Texts meaning "no charge"
pub const FREE_MARKERS: &[&str] = &["gratuit", "free", "kostenlos"];

/// Parse a localized decimal such as `"1.234,56 €"`, `"-2,5"` or `"Gratuit"`
///
/// Currency symbols, spaces and other non-numeric characters are ignored. A comma
/// is the decimal separator unless a dot follows it; dots alone are read as
/// grouping only when every group after the first has exactly three digits.
pub fn parse_localized_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();
    if FREE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Some(Decimal::ZERO);
    }

    let negative = trimmed
        .chars()
        .take_while(|c| !c.is_ascii_digit())
        .any(|c| c == '-' || c == '−');

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let canonical = canonicalize_separators(&kept)?;
    let value = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -value } else { value })
}

/// Rewrite grouping and decimal separators into `1234.56` form
fn canonicalize_separators(digits: &str) -> Option<String> {
    let last_comma = digits.rfind(',');
    let last_dot = digits.rfind('.');

    let canonical = match (last_comma, last_dot) {
        // "1,234.56": the rightmost separator is the decimal point
        (Some(comma), Some(dot)) if dot > comma => digits.replace(',', ""),
        (Some(_), Some(_)) => digits.replace('.', "").replace(',', "."),
        (Some(_), None) if digits.matches(',').count() > 1 => digits.replace(',', ""),
        (Some(_), None) => digits.replace(',', "."),
        (None, Some(_)) if is_dot_grouped(digits) => digits.replace('.', ""),
        (None, Some(_)) if digits.matches('.').count() > 1 => return None,
        _ => digits.to_string(),
    };
    Some(canonical)
}

fn is_dot_grouped(digits: &str) -> bool {
    let mut groups = digits.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let head_ok = (1..=3).contains(&head.len()) && head != "0";
    head_ok && groups.all(|group| group.len() == 3)
}

/// Calendar date of a server timestamp
///
/// Accepts RFC 3339, the server's `+0000` offset form, and falls back to a
/// leading `YYYY-MM-DD`.
pub fn parse_date(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.date_naive());
    }
    if let Ok(parsed) = DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.date_naive());
    }
    timestamp
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Maps raw transactions to accounting records
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    classifier: Classifier,
}

impl RecordNormalizer {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// Normalize one transaction, `None` if it must not be exported
    pub fn normalize(&self, transaction: &RawTransaction) -> Option<NormalizedRecord> {
        if transaction.is_canceled() {
            return None;
        }

        let total = transaction.amount_value().filter(|total| !total.is_zero())?;
        let Some(date) = transaction.timestamp.as_deref().and_then(parse_date) else {
            debug!(
                id = %transaction.id,
                timestamp = ?transaction.timestamp,
                "dropping transaction with unparsable timestamp"
            );
            return None;
        };

        Some(NormalizedRecord {
            date,
            record_type: self.classifier.classify(transaction),
            title: transaction.title.clone().unwrap_or_default(),
            isin: transaction.isin.clone(),
            note: transaction.subtitle.clone(),
            quantity: detail_decimal(transaction, QUANTITY_KEYS),
            total,
            currency: transaction.currency().map(str::to_string),
            fees: detail_decimal(transaction, FEE_KEYS),
            taxes: detail_decimal(transaction, TAX_KEYS),
        })
    }

    /// Normalize a batch, preserving input order
    pub fn normalize_all(&self, transactions: &[RawTransaction]) -> Vec<NormalizedRecord> {
        let records: Vec<NormalizedRecord> = transactions
            .iter()
            .filter_map(|transaction| self.normalize(transaction))
            .collect();
        debug!(
            input = transactions.len(),
            kept = records.len(),
            "transactions normalized"
        );
        records
    }
}

fn detail_decimal(transaction: &RawTransaction, keys: &[&str]) -> Option<Decimal> {
    transaction.detail(keys).and_then(parse_localized_decimal)
}
