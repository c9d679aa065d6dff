//! Authentication-related types
//!
//! Secrets never appear in `Debug` output, so they cannot leak through logs.

use std::fmt;

/// Phone number and PIN used to initiate the login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub phone_number: String,
    pub pin: String,
}

impl Credentials {
    pub fn new(phone_number: impl Into<String>, pin: impl Into<String>) -> Self {
        Credentials {
            phone_number: phone_number.into(),
            pin: pin.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("phone_number", &self.phone_number)
            .field("pin", &"****")
            .finish()
    }
}

/// Handshake state returned by the initiate call
///
/// Lives only until the code has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub process_id: String,
    /// Seconds before the issued code expires
    pub countdown_seconds: u64,
}

/// Opaque session token extracted from the session cookie
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        SessionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(****)")
    }
}
