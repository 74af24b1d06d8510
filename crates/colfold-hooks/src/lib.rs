//! colfold hooks - record-layer helpers
//!
//! - Password fields encrypted before save and decrypted after load
//! - Bearer-token `Authorization` header for HTTP-backed data sources

pub mod bearer;
pub mod error;
pub mod password;

pub use bearer::{BearerTokenConfig, BearerTokenProvider};
pub use error::HookError;
pub use password::{PasswordCipher, PasswordFieldHook};
