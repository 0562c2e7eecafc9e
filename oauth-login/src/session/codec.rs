//! Sealed session cookies
//!
//! A cookie value is `base64url(nonce || AES-256-GCM(json(SessionData)))`.
//! The key is the SHA-256 digest of the configured session secret. Any value
//! that fails to decode, authenticate, or parse opens as an error and the
//! caller starts a fresh session.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::data::{SessionData, SessionError};

/// Minimum secret length accepted in production
pub const MIN_SECRET_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// 256-bit session cookie key
#[derive(Clone)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    /// Derive a key from a secret string
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSecret`] if the secret is blank.
    pub fn from_secret(secret: &str) -> Result<Self, SessionError> {
        if secret.trim().is_empty() {
            return Err(SessionError::InvalidSecret("secret is empty".to_string()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(secret.as_bytes()));
        Ok(Self(key))
    }

    /// Generate a random key
    ///
    /// Sessions sealed with a generated key do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// Seals and opens session cookie values
#[derive(Clone)]
pub struct SessionCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

impl SessionCodec {
    /// Create a codec for `key`
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSecret`] if the cipher rejects the key.
    pub fn new(key: &SessionKey) -> Result<Self, SessionError> {
        let cipher = Aes256Gcm::new_from_slice(&key.0)
            .map_err(|e| SessionError::InvalidSecret(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt session data into a cookie-safe string
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be serialized or encrypted.
    pub fn seal(&self, data: &SessionData) -> Result<String, SessionError> {
        let plaintext = serde_json::to_vec(data)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_ref())
            .map_err(|_| SessionError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypt a cookie value back into session data
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidCookie`] for anything this codec did not
    /// seal, including values sealed under a different key.
    pub fn open(&self, value: &str) -> Result<SessionData, SessionError> {
        let sealed = URL_SAFE_NO_PAD
            .decode(value.trim())
            .map_err(|_| SessionError::InvalidCookie)?;

        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(SessionError::InvalidCookie);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SessionError::InvalidCookie)?;

        serde_json::from_slice(&plaintext).map_err(|_| SessionError::InvalidCookie)
    }
}
