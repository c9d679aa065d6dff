//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `auth`: Credentials and session artifacts
//! - `transaction`: Raw timeline transactions, detail sections and pages
//! - `record`: The normalized accounting record
//! - `error`: Error types for the exporter

pub mod auth;
pub mod error;
pub mod record;
pub mod transaction;

pub use auth::{AuthSession, Credentials, SessionToken};
pub use error::{AuthError, ConfigError, ExportError, ProtocolError};
pub use record::{NormalizedRecord, RecordType};
pub use transaction::{
    Amount, Cursor, Cursors, DetailAction, DetailItem, DetailMap, DetailResponse, DetailSection,
    RawTransaction, TimelinePage,
};
