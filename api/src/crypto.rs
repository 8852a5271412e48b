//! AES-GCM encryption for individual stored fields.
//!
//! Ciphertext format: `base64(nonce (12 bytes) || ciphertext || tag (16 bytes))`.
//! A fresh random nonce is drawn for every call to [`FieldCipher::encrypt`], so
//! encrypting the same value twice yields different output.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce,
};
use base64::engine::{general_purpose::STANDARD, Engine};
use rand_core::{OsRng, RngCore};

use crate::error::AppError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Clone)]
enum Cipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

/// Authenticated cipher for a single string field, built once from the configured key.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Cipher,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Accepts a 16-byte (AES-128) or 32-byte (AES-256) key.
    pub fn new(key: &[u8]) -> Result<Self, AppError> {
        let cipher = match key.len() {
            16 => Cipher::Aes128(
                Aes128Gcm::new_from_slice(key).map_err(|e| AppError::Crypto(e.to_string()))?,
            ),
            32 => Cipher::Aes256(
                Aes256Gcm::new_from_slice(key).map_err(|e| AppError::Crypto(e.to_string()))?,
            ),
            n => {
                return Err(AppError::Crypto(format!(
                    "key must be 16 or 32 bytes, got {n}"
                )))
            }
        };
        Ok(Self { cipher })
    }

    pub fn from_base64_key(encoded: &str) -> Result<Self, AppError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Crypto(format!("failed to decode base64 key: {e}")))?;
        Self::new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = match &self.cipher {
            Cipher::Aes128(c) => c.encrypt(nonce, plaintext.as_bytes()),
            Cipher::Aes256(c) => c.encrypt(nonce, plaintext.as_bytes()),
        }
        .map_err(|e| AppError::Crypto(format!("encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    /// Fails on malformed input or a tag mismatch; never returns partial plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String, AppError> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Crypto(format!("malformed ciphertext: {e}")))?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(AppError::Crypto("ciphertext too short".into()));
        }

        let (nonce_bytes, sealed) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = match &self.cipher {
            Cipher::Aes128(c) => c.decrypt(nonce, sealed),
            Cipher::Aes256(c) => c.decrypt(nonce, sealed),
        }
        .map_err(|_| AppError::Crypto("authentication failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Crypto(format!("decrypted field is not utf-8: {e}")))
    }
}
