//! Login handshake state machine
//!
//! ```text
//! Init ──initiate──▶ AwaitingCode ──code──▶ Verified
//!                        │    ▲
//!                      "SMS"  │ resend (once)
//!                        ▼    │
//!                    ResendRequested
//! ```
//!
//! A missing process id ends the handshake before any prompt is shown. Only one
//! resend is allowed; after it, the next answer is always submitted as a code.

use crate::auth::api::AuthApi;
use crate::auth::prompt::CodePrompt;
use crate::types::{AuthError, AuthSession, Credentials, SessionToken};
use tracing::{debug, info};

/// Answer that asks for the code to be sent again by SMS
pub const RESEND_KEYWORD: &str = "SMS";

/// Handshake progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Init,
    AwaitingCode { session: AuthSession, resent: bool },
    ResendRequested { session: AuthSession },
    Verified(SessionToken),
}

/// Drives the handshake against an [`AuthApi`] using a [`CodePrompt`]
pub struct CredentialAuthenticator<A, P> {
    api: A,
    prompt: P,
}

impl<A: AuthApi, P: CodePrompt> CredentialAuthenticator<A, P> {
    pub fn new(api: A, prompt: P) -> Self {
        Self { api, prompt }
    }

    /// Run the handshake to completion and return the session token
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] if the login is refused
    /// - [`AuthError::NoCode`] if the prompt ends without an answer
    /// - [`AuthError::VerificationFailed`] or [`AuthError::NoSessionCookie`] if
    ///   the code is rejected
    /// - [`AuthError::Http`] on transport failures
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<SessionToken, AuthError> {
        let mut state = AuthState::Init;
        loop {
            state = match state {
                AuthState::Verified(token) => {
                    info!("authenticated");
                    return Ok(token);
                }
                other => self.step(other, credentials).await?,
            };
        }
    }

    /// Advance the handshake by one transition
    pub async fn step(&mut self, state: AuthState, credentials: &Credentials) -> Result<AuthState, AuthError> {
        match state {
            AuthState::Init => {
                let session = self.api.initiate(credentials).await?;
                if session.process_id.is_empty() {
                    return Err(AuthError::InvalidCredentials);
                }
                debug!(countdown = session.countdown_seconds, "login accepted, awaiting code");
                Ok(AuthState::AwaitingCode { session, resent: false })
            }
            AuthState::AwaitingCode { session, resent } => {
                let question = if resent {
                    "Enter the 2FA code received by SMS: ".to_string()
                } else {
                    format!(
                        "Enter the 2FA code ({}s) or type '{}' to receive it by SMS: ",
                        session.countdown_seconds, RESEND_KEYWORD
                    )
                };
                let answer = self
                    .prompt
                    .ask(&question)
                    .await?
                    .map(|answer| answer.trim().to_string())
                    .filter(|answer| !answer.is_empty())
                    .ok_or(AuthError::NoCode)?;

                if !resent && answer.eq_ignore_ascii_case(RESEND_KEYWORD) {
                    return Ok(AuthState::ResendRequested { session });
                }

                let token = self.api.submit_code(&session.process_id, &answer).await?;
                Ok(AuthState::Verified(token))
            }
            AuthState::ResendRequested { session } => {
                self.api.resend_code(&session.process_id).await?;
                info!("code resent by SMS");
                Ok(AuthState::AwaitingCode { session, resent: true })
            }
            verified @ AuthState::Verified(_) => Ok(verified),
        }
    }
}
