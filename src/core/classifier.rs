//! Transaction type classification
//!
//! Classification is a priority-ordered decision table: each [`ClassificationRule`]
//! pairs a predicate with a [`RecordType`], and the first matching rule wins.
//! Transactions no rule recognises are classified as [`RecordType::Autre`].

use crate::types::{RawTransaction, RecordType};

const BUY_KEYWORDS: &[&str] = &["achat", "buy"];
const SELL_KEYWORDS: &[&str] = &["vente", "sell"];
const DISTRIBUTION_KEYWORDS: &[&str] = &["distribution", "dividende", "dividend"];

/// One row of the decision table
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    /// Short identifier used in logs and tests
    pub name: &'static str,
    pub label: RecordType,
    pub matches: fn(&RawTransaction) -> bool,
}

/// Ordered rule list
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Insert a rule at `position` in the priority order
    pub fn insert_rule(&mut self, position: usize, rule: ClassificationRule) {
        let position = position.min(self.rules.len());
        self.rules.insert(position, rule);
    }

    /// Label of the first matching rule, or `Autre`
    pub fn classify(&self, transaction: &RawTransaction) -> RecordType {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(transaction))
            .map(|rule| rule.label)
            .unwrap_or(RecordType::Autre)
    }
}

/// Standard rule table
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            name: "buy",
            label: RecordType::Achat,
            matches: |tx| event_type_contains(tx, "SAVINGS_PLAN") || subtitle_contains_any(tx, BUY_KEYWORDS),
        },
        ClassificationRule {
            name: "sell",
            label: RecordType::Vente,
            matches: |tx| subtitle_contains_any(tx, SELL_KEYWORDS),
        },
        ClassificationRule {
            name: "distribution",
            label: RecordType::Dividendes,
            matches: |tx| {
                subtitle_contains_any(tx, DISTRIBUTION_KEYWORDS)
                    || event_type(tx).is_some_and(|event| event.eq_ignore_ascii_case("CREDIT"))
            },
        },
        ClassificationRule {
            name: "interest",
            label: RecordType::Interets,
            matches: |tx| event_type_contains(tx, "INTEREST"),
        },
        ClassificationRule {
            name: "inbound_transfer",
            label: RecordType::Depot,
            matches: |tx| event_type_contains(tx, "INBOUND") || event_type_contains(tx, "INCOMING"),
        },
        ClassificationRule {
            name: "outbound_transfer",
            label: RecordType::Retrait,
            matches: |tx| event_type_contains(tx, "OUTBOUND") || event_type_contains(tx, "OUTGOING"),
        },
    ]
}

fn event_type(tx: &RawTransaction) -> Option<&str> {
    tx.event_type.as_deref().map(str::trim)
}

fn event_type_contains(tx: &RawTransaction, fragment: &str) -> bool {
    event_type(tx).is_some_and(|event| event.to_uppercase().contains(fragment))
}

fn subtitle_contains_any(tx: &RawTransaction, keywords: &[&str]) -> bool {
    tx.subtitle.as_deref().is_some_and(|subtitle| {
        let subtitle = subtitle.to_lowercase();
        keywords.iter().any(|keyword| subtitle.contains(keyword))
    })
}
