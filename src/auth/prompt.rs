//! Second-factor code prompt

use crate::types::AuthError;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

/// Source of the user's answers during the handshake
#[async_trait]
pub trait CodePrompt: Send {
    /// Show `question` and return the trimmed answer, `None` on end of input
    async fn ask(&mut self, question: &str) -> Result<Option<String>, AuthError>;
}

/// Prompt on the terminal: question on stdout, answer from stdin
pub struct StdinPrompt {
    input: BufReader<Stdin>,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for StdinPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodePrompt for StdinPrompt {
    async fn ask(&mut self, question: &str) -> Result<Option<String>, AuthError> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(question.as_bytes())
            .await
            .map_err(|e| AuthError::Prompt { message: e.to_string() })?;
        stdout
            .flush()
            .await
            .map_err(|e| AuthError::Prompt { message: e.to_string() })?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .await
            .map_err(|e| AuthError::Prompt { message: e.to_string() })?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
