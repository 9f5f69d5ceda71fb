//! Cryptographic primitives.
//!
//! AES-256-GCM with a fresh random 96-bit nonce per call and a caller
//! supplied context as associated data; the output layout is
//! `nonce (12) || ciphertext || tag (16)`. Sub-keys are derived with
//! HKDF-SHA256. Key bytes are zeroized on drop and never printed.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

/// A 256-bit key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random key from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }

    /// Parse a standard-base64 encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the text is not base64 or does
    /// not decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey {
                reason: e.to_string(),
            })?;

        let result = <[u8; 32]>::try_from(decoded.as_slice())
            .map(Self)
            .map_err(|_| CryptoError::InvalidKey {
                reason: format!("expected 32 bytes, got {}", decoded.len()),
            });
        decoded.zeroize();
        result
    }

    /// Raw key bytes. Never log or persist them.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypt `plaintext` under `key`, binding it to `context`.
///
/// `context` is authenticated but not encrypted; the same bytes must be
/// passed to [`decrypt`]. The barrier uses the storage key, so a value
/// copied to another entry no longer decrypts.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the AEAD operation fails.
pub fn encrypt(
    key: &EncryptionKey,
    plaintext: &[u8],
    context: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut sealed = nonce.to_vec();
    let body = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: context,
            },
        )
        .map_err(|e| CryptoError::Encryption {
            reason: e.to_string(),
        })?;
    sealed.extend(body);
    Ok(sealed)
}

/// Decrypt output of [`encrypt`] produced with the same `context`.
///
/// # Errors
///
/// Returns [`CryptoError::CiphertextTooShort`] for inputs shorter than a
/// nonce plus tag, and [`CryptoError::Decryption`] when authentication fails
/// (wrong key, wrong context or tampered bytes).
pub fn decrypt(
    key: &EncryptionKey,
    sealed: &[u8],
    context: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let Some((nonce, body)) = sealed
        .split_at_checked(NONCE_LEN)
        .filter(|(_, body)| body.len() >= TAG_LEN)
    else {
        return Err(CryptoError::CiphertextTooShort {
            expected: MIN_SEALED_LEN,
            actual: sealed.len(),
        });
    };

    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: body,
                aad: context,
            },
        )
        .map_err(|e| CryptoError::Decryption {
            reason: e.to_string(),
        })
}

/// Derive a purpose-bound sub-key from `master` with HKDF-SHA256.
///
/// `purpose` becomes the HKDF info, e.g. `b"embercrypt-vaultpassword-v1"`.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if HKDF expansion fails.
pub fn derive_key(
    master: &EncryptionKey,
    salt: Option<&[u8]>,
    purpose: &[u8],
) -> Result<EncryptionKey, CryptoError> {
    let mut okm = [0u8; 32];
    let expanded = Hkdf::<Sha256>::new(salt, master.as_bytes()).expand(purpose, &mut okm);
    let key = expanded.map(|()| EncryptionKey::from_bytes(okm));
    okm.zeroize();
    key.map_err(|e| CryptoError::KeyDerivation {
        context: String::from_utf8_lossy(purpose).into_owned(),
        reason: e.to_string(),
    })
}
