//! Transaction-related types for the exporter
//!
//! This module defines the raw timeline transaction as received from the socket,
//! the detail sections returned by the detail subscription, and the page envelope
//! used by pagination.
//!
//! The server payloads are loosely shaped. Fields that matter to the pipeline are
//! typed and optional; everything else is kept verbatim in side-maps so the JSON
//! export can reproduce what was received.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Opaque pagination cursor issued by the server
pub type Cursor = String;

/// Status marker of transactions that must never be exported
pub const CANCELED_MARKER: &str = "CANCELED";

/// Monetary amount attached to a timeline transaction
///
/// The value is kept as sent so the JSON export writes it back unchanged;
/// [`Amount::decimal`] gives the parsed form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    /// Raw value, `Some(Value::Null)` when the server sent an explicit null
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,

    /// ISO currency code (e.g. "EUR")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Other amount fields such as `fractionDigits`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Amount {
    /// Amount with a numeric value and a currency
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        let text = value.normalize().to_string();
        let value = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        Self {
            value: Some(value),
            currency: Some(currency.into()),
            extra: Map::new(),
        }
    }

    /// Signed value, `None` when missing or unparsable
    pub fn decimal(&self) -> Option<Decimal> {
        self.value.as_ref().and_then(decimal_from_value)
    }
}

/// Raw timeline transaction
///
/// Represents one item of a `timelineTransactions` page, optionally merged with
/// the fields obtained through the detail subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Server transaction identifier, empty when missing or null
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,

    /// Event kind, e.g. `SAVINGS_PLAN_EXECUTED`, `PAYMENT_INBOUND`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// ISO-8601 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Settlement status, e.g. `EXECUTED`, `CANCELED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Detail sections exactly as returned by the detail subscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Value>,

    /// Title→text pairs merged from the "Transaction" detail section
    #[serde(default, skip_serializing_if = "DetailMap::is_empty")]
    pub details: DetailMap,

    /// Security identifier captured from an `instrumentDetail` action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,

    /// Every field the exporter does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawTransaction {
    /// Whether the transaction was canceled and must be left out of every export
    pub fn is_canceled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.contains(CANCELED_MARKER))
    }

    /// Amount value, if present and parseable
    pub fn amount_value(&self) -> Option<Decimal> {
        self.amount.as_ref().and_then(Amount::decimal)
    }

    /// Amount currency, if present
    pub fn currency(&self) -> Option<&str> {
        self.amount
            .as_ref()
            .and_then(|amount| amount.currency.as_deref())
    }

    /// Look up the first detail entry matching one of `keys` (case-insensitive)
    pub fn detail(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| {
            self.details
                .iter()
                .find(|(title, _)| title.trim().eq_ignore_ascii_case(key))
                .map(|(_, text)| text)
        })
    }
}

/// Detail entries in server order
///
/// Serialized as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailMap {
    entries: Vec<(String, String)>,
}

impl DetailMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; a repeated title replaces the text in place
    pub fn insert(&mut self, title: String, text: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == title) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((title, text)),
        }
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == title)
            .map(|(_, text)| text.as_str())
    }

    pub fn contains_key(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(title, text)| (title.as_str(), text.as_str()))
    }
}

impl Serialize for DetailMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (title, text) in &self.entries {
            map.serialize_entry(title, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DetailMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DetailMapVisitor;

        impl<'de> Visitor<'de> for DetailMapVisitor {
            type Value = DetailMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of detail titles to texts")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<DetailMap, M::Error> {
                let mut details = DetailMap::new();
                while let Some((title, text)) = access.next_entry::<String, String>()? {
                    details.insert(title, text);
                }
                Ok(details)
            }
        }

        deserializer.deserialize_map(DetailMapVisitor)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for DetailMap {
    fn from(entries: [(&str, &str); N]) -> Self {
        let mut details = DetailMap::new();
        for (title, text) in entries {
            details.insert(title.to_string(), text.to_string());
        }
        details
    }
}

/// One line of a detail section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "WireDetailItem")]
pub struct DetailItem {
    pub title: Option<String>,
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct WireDetailItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<WireDetailText>,
}

#[derive(Deserialize)]
struct WireDetailText {
    #[serde(default)]
    text: Option<String>,
}

impl From<WireDetailItem> for DetailItem {
    fn from(wire: WireDetailItem) -> Self {
        DetailItem {
            title: wire.title,
            text: wire.detail.and_then(|detail| detail.text),
        }
    }
}

/// Action attached to a detail section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetailAction {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub payload: Option<Value>,
}

/// Section of a `timelineDetailV2` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetailSection {
    #[serde(default)]
    pub title: Option<String>,

    /// Section lines; the wire field is `data` and is not always a list
    #[serde(rename = "data", default, deserialize_with = "lenient_vec")]
    pub items: Vec<DetailItem>,

    #[serde(default)]
    pub action: Option<DetailAction>,
}

/// Envelope of a `timelineDetailV2` response
///
/// `sections` is the typed view used for merging; `raw_sections` is the wire
/// value carried onto the record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "WireDetailResponse")]
pub struct DetailResponse {
    pub sections: Vec<DetailSection>,
    pub raw_sections: Option<Value>,
}

#[derive(Deserialize)]
struct WireDetailResponse {
    #[serde(default, deserialize_with = "present")]
    sections: Option<Value>,
}

impl From<WireDetailResponse> for DetailResponse {
    fn from(wire: WireDetailResponse) -> Self {
        let sections = match &wire.sections {
            Some(Value::Array(elements)) => elements
                .iter()
                .filter_map(|element| DetailSection::deserialize(element).ok())
                .collect(),
            _ => Vec::new(),
        };
        DetailResponse {
            sections,
            raw_sections: wire.sections,
        }
    }
}

/// Pagination cursors of a timeline page
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub after: Option<Cursor>,
    #[serde(default)]
    pub before: Option<Cursor>,
}

/// Envelope of a `timelineTransactions` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelinePage {
    /// Page items; a null list is an empty page
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<RawTransaction>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
}

impl TimelinePage {
    /// Cursor of the next page; empty strings count as absent
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursors
            .as_ref()
            .and_then(|cursors| cursors.after.as_deref())
            .filter(|cursor| !cursor.is_empty())
    }
}

/// Accept a number or numeric string, map anything else to `None`
fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| Decimal::from_scientific(&number.to_string()).ok())
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// Keep a present field as `Some`, including an explicit `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a list, skipping elements of the wrong shape; non-lists become empty
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(elements)) => elements
            .into_iter()
            .filter_map(|element| serde_json::from_value(element).ok())
            .collect(),
        _ => Vec::new(),
    })
}
