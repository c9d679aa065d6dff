//! Core ingestion and normalization logic
//!
//! This module contains the components that turn subscription responses into
//! exportable records:
//! - `traits` - The request seam shared by pager and enricher
//! - `pager` - Cursor-driven retrieval of the transaction timeline
//! - `enricher` - Per-transaction detail requests and merging
//! - `classifier` - Ordered rule table mapping transactions to record types
//! - `normalizer` - Mapping into the accounting schema

pub mod classifier;
pub mod enricher;
pub mod normalizer;
pub mod pager;
pub mod traits;

pub use classifier::{default_rules, ClassificationRule, Classifier};
pub use enricher::{drop_canceled, merge_detail, DetailEnricher};
pub use normalizer::{parse_date, parse_localized_decimal, RecordNormalizer};
pub use pager::TransactionPager;
pub use traits::SubscriptionClient;
