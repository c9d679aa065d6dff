//! Authentication module
//!
//! # Components
//!
//! - `api` - The HTTP side of the login handshake
//! - `prompt` - Interactive collection of the second-factor code
//! - `authenticator` - The handshake state machine driving both

pub mod api;
pub mod authenticator;
pub mod prompt;

pub use api::{AuthApi, HttpAuthApi, SESSION_COOKIE};
pub use authenticator::{AuthState, CredentialAuthenticator, RESEND_KEYWORD};
pub use prompt::{CodePrompt, StdinPrompt};
