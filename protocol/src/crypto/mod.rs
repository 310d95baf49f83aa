//! # Cryptographic Primitives for WISP
//!
//! This module is the foundation of everything security-related in the
//! protocol: the human-transcribable password, the SPAKE2 exchange that
//! turns it into a strong shared secret, and the AES-256-GCM channel that
//! secret keys.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **SPAKE2 / Ed25519** for the key exchange — a weak password in, a
//!   full-strength session key out, nothing grindable on the wire.
//! - **HKDF-SHA256** for key derivation — deterministic, salted, dull.
//! - **AES-256-GCM** for symmetric encryption — AEAD done right.
//! - **SHA-256** for the password digest — because the rendezvous service
//!   only needs to match, never to recover.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod channel;
pub mod pake;
pub mod password;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy. Life's too short for five levels of `use` statements.
pub use channel::{derive_key, ChannelError, SessionCipher};
pub use pake::{KeyExchange, PakeError, SessionKey};
pub use password::Password;
