//! Login endpoints
//!
//! [`AuthApi`] abstracts the three HTTP calls of the handshake so the state
//! machine can be tested without a server. [`HttpAuthApi`] is the `reqwest`
//! implementation:
//!
//! ```text
//! POST {base}/api/v1/auth/web/login                   {"phoneNumber", "pin"}
//! POST {base}/api/v1/auth/web/login/{processId}/resend
//! POST {base}/api/v1/auth/web/login/{processId}/{code} → Set-Cookie: tr_session=...
//! ```

use crate::types::{AuthError, AuthSession, Credentials, SessionToken};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "tr_session";

const LOGIN_PATH: &str = "/api/v1/auth/web/login";

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Start the handshake; fails with `InvalidCredentials` when no process id is issued
    async fn initiate(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;

    /// Ask for the code to be sent again by SMS
    async fn resend_code(&self, process_id: &str) -> Result<(), AuthError>;

    /// Submit the second-factor code and obtain the session token
    async fn submit_code(&self, process_id: &str, code: &str) -> Result<SessionToken, AuthError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    phone_number: &'a str,
    pin: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    process_id: Option<String>,
    #[serde(default)]
    countdown_in_seconds: Option<u64>,
}

/// `reqwest` implementation of the login endpoints
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Login endpoint URL followed by percent-encoded path segments
    fn login_url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}{}", self.base_url, LOGIN_PATH);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn initiate(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.login_url(&[]))
            .json(&LoginRequest {
                phone_number: &credentials.phone_number,
                pin: &credentials.pin,
            })
            .send()
            .await
            .map_err(|e| AuthError::http("login", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::http("login", e))?;
        debug!(status = status.as_u16(), "login initiated");

        // Any body without a process id means the credentials were refused
        let login: LoginResponse = serde_json::from_str(&body).unwrap_or_default();
        match login.process_id.filter(|id| !id.is_empty()) {
            Some(process_id) => Ok(AuthSession {
                process_id,
                countdown_seconds: login.countdown_in_seconds.unwrap_or_default(),
            }),
            None => Err(AuthError::InvalidCredentials),
        }
    }

    async fn resend_code(&self, process_id: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.login_url(&[process_id, "resend"]))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AuthError::http("resend", e))?;
        debug!(status = response.status().as_u16(), "code resend requested");
        Ok(())
    }

    async fn submit_code(&self, process_id: &str, code: &str) -> Result<SessionToken, AuthError> {
        let response = self
            .client
            .post(self.login_url(&[process_id, code]))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AuthError::http("verify", e))?;

        if response.status() != StatusCode::OK {
            return Err(AuthError::VerificationFailed {
                status: response.status().as_u16(),
            });
        }

        session_cookie(&response)
            .map(SessionToken::new)
            .ok_or_else(|| AuthError::NoSessionCookie {
                cookie: SESSION_COOKIE.to_string(),
            })
    }
}

/// Value of the session cookie set by `response`, if any
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}
