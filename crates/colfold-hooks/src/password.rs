//! Password-field transformation on save and load.
//!
//! Values are sealed with AES-256-GCM under a key supplied at construction.
//! The stored form is base64 of `nonce (12 bytes) || ciphertext || tag`.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use colfold_core::{Row, Value};
use rand::RngCore;
use tracing::debug;

use crate::error::HookError;

const NONCE_LEN: usize = 12;

/// Symmetric cipher for password values.
pub struct PasswordCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCipher").finish_non_exhaustive()
    }
}

impl PasswordCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, HookError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| HookError::InvalidKey(e.to_string()))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| HookError::InvalidKey(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self::new(key))
    }

    pub fn encrypt_password(&self, plaintext: &str) -> Result<String, HookError> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| HookError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt_password(&self, encoded: &str) -> Result<String, HookError> {
        let sealed = STANDARD
            .decode(encoded)
            .map_err(|e| HookError::DecryptionFailed(e.to_string()))?;
        if sealed.len() < NONCE_LEN {
            return Err(HookError::DecryptionFailed("sealed value too short".to_string()));
        }

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|e| HookError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| HookError::DecryptionFailed(e.to_string()))
    }
}

/// Encrypts the listed fields of a row before it is saved and decrypts them
/// after rows are loaded. Null, absent, non-text and empty fields are left
/// as they are.
#[derive(Debug)]
pub struct PasswordFieldHook {
    fields: Vec<String>,
    cipher: PasswordCipher,
}

impl PasswordFieldHook {
    pub fn new(fields: Vec<String>, cipher: PasswordCipher) -> Self {
        Self { fields, cipher }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn before_save(&self, row: &mut Row) -> Result<(), HookError> {
        for field in &self.fields {
            if let Some(Value::Text(plain)) = row.get_mut(field) {
                if plain.is_empty() {
                    continue;
                }
                *plain = self.cipher.encrypt_password(plain)?;
                debug!("Encrypted password field '{}'", field);
            }
        }
        Ok(())
    }

    pub fn after_load(&self, rows: &mut [Row]) -> Result<(), HookError> {
        for row in rows {
            for field in &self.fields {
                if let Some(Value::Text(sealed)) = row.get_mut(field) {
                    if sealed.is_empty() {
                        continue;
                    }
                    *sealed = self.cipher.decrypt_password(sealed)?;
                }
            }
        }
        Ok(())
    }
}
