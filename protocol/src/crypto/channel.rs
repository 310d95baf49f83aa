//! # The Symmetric Session Channel
//!
//! Everything the two peers say to each other after the PAKE round travels
//! through a [`SessionCipher`]: AES-256-GCM keyed from the shared session
//! secret. We use AES-256-GCM because:
//!
//! - It's an AEAD cipher — authentication and encryption in one operation.
//!   No "encrypt-then-MAC" vs "MAC-then-encrypt" debates. It just works.
//! - AES-NI hardware acceleration is available on every modern x86 CPU and
//!   most ARM chips. Performance is essentially free.
//! - A tampered or wrong-key ciphertext fails loudly at the auth check,
//!   which doubles as WISP's password confirmation: mismatched passwords
//!   mean mismatched keys mean the very first decrypt fails.
//!
//! ## Key derivation
//!
//! The AES key is `HKDF-SHA256(salt, session_key)` expanded under a
//! versioned info string. The salt is generated fresh by the sender and
//! crosses the wire exactly once, in plaintext, after the PAKE completes —
//! it adds no secrecy and needs none; it separates this session's key from
//! any other derivation of the same secret. [`derive_key`] is a pure
//! function of its inputs: two peers constructing ciphers from the same
//! `(session key, salt)` pair are guaranteed interoperable, and the tests
//! hold us to that.
//!
//! ## Nonce management
//!
//! GCM is notoriously unforgiving about nonce reuse. If you encrypt two
//! different messages with the same key and nonce, an attacker can recover
//! the XOR of the plaintexts AND forge authentication tags. Game over.
//!
//! Our strategy: random 96-bit nonces from a CSPRNG, fresh per call. The
//! birthday bound for 96-bit nonces is ~2^48 messages per key, and a WISP
//! session key dies with the session long before that.
//!
//! ## Wire format
//!
//! `encrypt()` returns `nonce || ciphertext` as a single `Vec<u8>`: the
//! first 12 bytes are the nonce, the rest is ciphertext + auth tag.
//! `decrypt()` expects the same format.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH, CHANNEL_KEY_INFO, SALT_LENGTH};
use crate::crypto::pake::SessionKey;

/// Errors that can occur on the encrypted channel.
///
/// We intentionally keep these vague. Detailed error messages about
/// cryptographic failures are a gift to attackers. The difference between
/// "wrong key" and "corrupted ciphertext" is none of their business.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key, tampering, or corrupted ciphertext")]
    DecryptFailed,

    #[error("invalid salt length: expected {SALT_LENGTH} bytes, got {0}")]
    InvalidSaltLength(usize),

    #[error("ciphertext too short: must be at least {AES_NONCE_LENGTH} bytes")]
    CiphertextTooShort,
}

/// Derive the symmetric channel key from the PAKE secret and the session salt.
///
/// Pure and deterministic: same inputs, same key, on any host, forever.
/// This is the interoperability contract between the two peers — each builds
/// its own [`SessionCipher`] independently and the frames must still match.
pub fn derive_key(session_key: &SessionKey, salt: &[u8; SALT_LENGTH]) -> [u8; AES_KEY_LENGTH] {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), session_key.as_bytes());
    let mut key = [0u8; AES_KEY_LENGTH];
    hkdf.expand(CHANNEL_KEY_INFO, &mut key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    key
}

/// One peer's handle on the session's symmetric channel.
///
/// Each peer holds its own independently derived instance; both must produce
/// identical key material from identical `(session key, salt)` inputs or
/// nothing decrypts. Construction order matters to the protocol: the sender
/// calls [`new`](Self::new) (minting the salt), the receiver calls
/// [`with_salt`](Self::with_salt) with the salt it was handed.
#[derive(Clone)]
pub struct SessionCipher {
    key: [u8; AES_KEY_LENGTH],
    salt: [u8; SALT_LENGTH],
}

impl SessionCipher {
    /// Builds a cipher with a freshly generated random salt.
    pub fn new(session_key: &SessionKey) -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        Self {
            key: derive_key(session_key, &salt),
            salt,
        }
    }

    /// Builds a cipher from a salt received from the peer.
    ///
    /// # Errors
    ///
    /// [`ChannelError::InvalidSaltLength`] if the peer sent a salt of the
    /// wrong size — a sign of version skew or tampering, fatal either way.
    pub fn with_salt(session_key: &SessionKey, salt: &[u8]) -> Result<Self, ChannelError> {
        let salt: [u8; SALT_LENGTH] = salt
            .try_into()
            .map_err(|_| ChannelError::InvalidSaltLength(salt.len()))?;
        Ok(Self {
            key: derive_key(session_key, &salt),
            salt,
        })
    }

    /// The salt this cipher was derived with — the one value that is allowed
    /// to cross the wire in plaintext after the session secret exists.
    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    /// Encrypt a message with a fresh random nonce.
    ///
    /// Returns `nonce || ciphertext`; identical plaintexts produce distinct
    /// ciphertexts on every call.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, ChannelError> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| ChannelError::EncryptFailed)?;

        let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| ChannelError::EncryptFailed)?;

        // Pack nonce || ciphertext into a single buffer so the caller never
        // has to manage the nonce separately.
        let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt and authenticate a message previously produced by
    /// [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// [`ChannelError::DecryptFailed`] if the key is wrong or the ciphertext
    /// was modified in any way — never partially decrypted data. Treat it as
    /// tampering and abandon the session.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, ChannelError> {
        if data.len() < AES_NONCE_LENGTH {
            return Err(ChannelError::CiphertextTooShort);
        }

        let (nonce_bytes, ciphertext) = data.split_at(AES_NONCE_LENGTH);
        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| ChannelError::DecryptFailed)?;
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| ChannelError::DecryptFailed)
    }
}

// Key material stays out of logs; the salt is public but noise.
impl fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCipher(..)")
    }
}
