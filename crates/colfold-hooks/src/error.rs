//! Typed errors for the hooks crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("token request failed: {0}")]
    TokenRequestFailed(String),
}

impl From<reqwest::Error> for HookError {
    fn from(e: reqwest::Error) -> Self {
        HookError::TokenRequestFailed(e.to_string())
    }
}
