//! Error types for the transaction exporter
//!
//! This module defines all error types that can occur during an export run.
//! Errors are designed to be descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: Missing file or field, invalid enum values
//! - **Authentication Errors**: Rejected credentials, wrong code, missing session cookie
//! - **Protocol Errors**: Malformed socket payloads, transport failures
//! - **Enrichment Errors**: Failure fetching one transaction's detail
//! - **Export Errors**: Failure writing the output artifact
//!
//! Every category is fatal except enrichment, whose handling is governed by
//! [`EnrichmentFailurePolicy`](crate::config::EnrichmentFailurePolicy).

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {path}")]
    MissingFile {
        /// The path that was not found
        path: String,
    },

    /// Configuration file exists but could not be read
    #[error("Failed to read configuration file {path}: {message}")]
    Read { path: String, message: String },

    /// Configuration file is not valid TOML or does not match the expected layout
    #[error("Invalid configuration file: {message}")]
    Parse { message: String },

    /// A required value is absent or blank
    #[error("Missing configuration value '{field}'")]
    MissingField { field: String },

    /// Output format is not one of the supported values
    #[error("Unknown output format '{value}', expected 'json' or 'csv'")]
    InvalidFormat { value: String },

    /// Enrichment failure policy is not one of the supported values
    #[error("Unknown enrichment failure policy '{value}', expected 'abort' or 'skip'")]
    InvalidPolicy { value: String },

    /// Output directory could not be created
    #[error("Cannot create output directory {path}: {message}")]
    OutputDir { path: String, message: String },
}

/// Errors raised by the login handshake
///
/// All authentication errors are fatal. The only alternate path is a single
/// code resend, which happens before any of these can be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// The initiate call did not return a process id
    #[error("Login initialisation failed, check the phone number and PIN")]
    InvalidCredentials,

    /// The code verification call did not succeed
    #[error("Device verification failed (HTTP {status})")]
    VerificationFailed {
        /// HTTP status returned by the verify call
        status: u16,
    },

    /// Verification succeeded but the session cookie was not set
    #[error("Session cookie '{cookie}' not found in verification response")]
    NoSessionCookie { cookie: String },

    /// The user did not provide a code
    #[error("No verification code entered")]
    NoCode,

    /// HTTP transport failure
    #[error("HTTP error during {step}: {message}")]
    Http { step: String, message: String },

    /// Reading the code from the terminal failed
    #[error("Failed to read verification code: {message}")]
    Prompt { message: String },
}

/// Errors raised by the socket protocol layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// Payload could not be parsed after de-noising, or did not have the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The server answered a subscription with an error frame
    #[error("Subscription {id} failed: {message}")]
    Subscription { id: u32, message: String },

    /// Socket-level failure
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The server closed the connection while a reply was expected
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// A subscription was issued while another one was still awaiting its unsubscribe
    #[error("Subscription {pending} is still outstanding")]
    OutstandingSubscription { pending: u32 },
}

/// Top-level error type for an export run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Fetching the detail of one transaction failed
    #[error("Enrichment of transaction {transaction_id} failed: {source}")]
    Enrichment {
        transaction_id: String,
        source: ProtocolError,
    },

    /// I/O error occurred while writing the export artifact
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Records could not be serialized into the output format
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<std::io::Error> for ExportError {
    fn from(error: std::io::Error) -> Self {
        ExportError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(error: csv::Error) -> Self {
        ExportError::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::MalformedResponse {
            message: error.to_string(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ProtocolError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match error {
            WsError::ConnectionClosed | WsError::AlreadyClosed => ProtocolError::ConnectionClosed,
            other => ProtocolError::Transport {
                message: other.to_string(),
            },
        }
    }
}

// Helper functions for creating common errors

impl ProtocolError {
    /// Create a MalformedResponse error
    pub fn malformed(message: impl Into<String>) -> Self {
        ProtocolError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Whether the connection can still carry traffic after this error
    ///
    /// Transport failures leave the session unusable; payload-level errors do not.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            ProtocolError::Transport { .. }
                | ProtocolError::ConnectionClosed
                | ProtocolError::OutstandingSubscription { .. }
        )
    }
}

impl AuthError {
    /// Create an Http error for the given handshake step
    pub fn http(step: &str, error: impl std::fmt::Display) -> Self {
        AuthError::Http {
            step: step.to_string(),
            message: error.to_string(),
        }
    }
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(field: &str) -> Self {
        ConfigError::MissingField {
            field: field.to_string(),
        }
    }
}

impl ExportError {
    /// Create an Enrichment error
    pub fn enrichment(transaction_id: &str, source: ProtocolError) -> Self {
        ExportError::Enrichment {
            transaction_id: transaction_id.to_string(),
            source,
        }
    }
}
