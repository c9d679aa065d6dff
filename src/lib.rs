//! tr-export Library
//! # Overview
//!
//! This library exports a Trade Republic account's transaction history. It logs
//! in over HTTP (phone number, PIN and a second-factor code), then talks to the
//! broker's socket API with a `connect`/`sub`/`unsub` text protocol to page
//! through the timeline and, optionally, fetch the detail of every transaction.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (transactions, records, credentials, errors)
//! - [`config`] - TOML configuration and command line overrides
//! - [`cli`] - CLI arguments parsing
//! - [`auth`] - Login handshake state machine and its HTTP endpoints
//! - [`protocol`] - Socket framing, id correlation and the protocol session
//! - [`core`] - Ingestion and normalization:
//!   - [`core::pager`] - Cursor-driven timeline pagination
//!   - [`core::enricher`] - Per-transaction detail requests
//!   - [`core::classifier`] - Record type decision table
//!   - [`core::normalizer`] - Mapping into the accounting schema
//! - [`io`] - CSV and JSON writers
//! - [`strategy`] - Export strategies selected from the output format
//! - [`pipeline`] - End-to-end orchestration of one run
//!
//! # Export Formats
//!
//! - **json**: merged raw records, unknown server fields preserved
//! - **csv**: `;`-delimited accounting schema with French column names and
//!   comma decimal separators
//!
//! Canceled transactions never appear in either format.

// Module declarations
pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod pipeline;
pub mod protocol;
pub mod strategy;
pub mod types;

pub use config::{AppConfig, EnrichmentFailurePolicy, OutputFormat};
pub use pipeline::{run, run_with_transport, ExportSummary};
pub use types::{
    AuthError, ConfigError, ExportError, NormalizedRecord, ProtocolError, RawTransaction,
    RecordType,
};
