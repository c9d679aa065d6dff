//! Benchmark suite for the export strategies
//!
//! Measures normalization plus serialization of synthetic timelines with the
//! divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Each generated timeline cycles through buys with localized detail entries,
//! dividends, deposits, zero-amount and canceled transactions, so both the
//! keep and drop paths of the normalizer are exercised.

use serde_json::json;
use tr_export::config::OutputFormat;
use tr_export::core::parse_localized_decimal;
use tr_export::strategy::create_strategy;
use tr_export::RawTransaction;

fn main() {
    divan::main();
}

const EVENT_TYPES: [&str; 5] = [
    "TRADE_INVOICE",
    "SSP_CORPORATE_ACTION_CASH",
    "PAYMENT_INBOUND",
    "CARD_VERIFICATION",
    "TRADE_INVOICE",
];

const SUBTITLES: [&str; 5] = [
    "Ordre d'achat",
    "Dividende",
    "Virement reçu",
    "",
    "Ordre de vente",
];

fn timeline(size: usize) -> Vec<RawTransaction> {
    (0..size)
        .map(|i| {
            let day = i % 28 + 1;
            let value = match i % 5 {
                0 => json!(-0.5 - i as f64),
                1 => json!(0.42),
                2 => json!(1000),
                3 => json!(0),
                _ => json!(-12.3),
            };
            let event_type = EVENT_TYPES[i % EVENT_TYPES.len()];
            let subtitle = SUBTITLES[i % SUBTITLES.len()];
            let status = if i % 7 == 0 { "CANCELED" } else { "EXECUTED" };
            let mut tx: RawTransaction = serde_json::from_value(json!({
                "id": format!("tx-{}", i),
                "eventType": event_type,
                "timestamp": format!("2024-03-{:02}T10:15:00.000+0000", day),
                "title": "Apple",
                "subtitle": subtitle,
                "status": status,
                "amount": { "currency": "EUR", "value": value }
            }))
            .expect("valid transaction");
            tx.details.insert("Titres".to_string(), "1.234,5".to_string());
            tx.details.insert("Frais".to_string(), "1,00 €".to_string());
            tx.isin = Some("US0378331005".to_string());
            tx
        })
        .collect()
}

/// CSV export: normalization, classification and `;`-delimited writing
#[divan::bench(args = [100, 1_000, 10_000])]
fn csv_export(bencher: divan::Bencher, size: usize) {
    let transactions = timeline(size);
    let strategy = create_strategy(OutputFormat::Csv);

    bencher.bench(|| {
        let mut output = Vec::new();
        strategy
            .export(&transactions, &mut output)
            .expect("Export failed");
        output
    });
}

/// JSON export: pretty-printed raw records
#[divan::bench(args = [100, 1_000, 10_000])]
fn json_export(bencher: divan::Bencher, size: usize) {
    let transactions = timeline(size);
    let strategy = create_strategy(OutputFormat::Json);

    bencher.bench(|| {
        let mut output = Vec::new();
        strategy
            .export(&transactions, &mut output)
            .expect("Export failed");
        output
    });
}

/// Localized decimal parsing alone
#[divan::bench(args = ["1.234,56 €", "-0,07 €", "Gratuit", "1,234.56"])]
fn localized_decimal(text: &str) -> Option<rust_decimal::Decimal> {
    parse_localized_decimal(divan::black_box(text))
}
