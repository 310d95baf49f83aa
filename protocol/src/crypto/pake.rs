//! # Password-Authenticated Key Exchange
//!
//! SPAKE2 over the Ed25519 group, run in symmetric mode: both peers execute
//! the identical computation, exchange one blob of round material each, and
//! arrive at the same session key — or, with a wrong password, at two
//! different keys and no way to tell from the transcript alone. That
//! asymmetry is the whole point: an eavesdropper (or the rendezvous service)
//! gets nothing it can grind offline against a short password.
//!
//! ## Lifecycle
//!
//! ```text
//! KeyExchange::initiate(password)   — pure computation, produces round bytes
//!         │
//!         ▼  outbound_bytes() ──────────► peer (via rendezvous)
//!         │  peer bytes ◄──────────────── peer (via rendezvous)
//!         ▼
//! absorb(peer_bytes)                — consumes the one allowed peer round
//!         │
//!         ▼
//! session_key()                     — valid exactly once absorb succeeded
//! ```
//!
//! Any deviation — absorbing twice, asking for the key early, malformed peer
//! material — is a hard error, and per protocol policy the whole session is
//! abandoned. There is no retry: a fresh attempt means a fresh password.
//!
//! ## A note on cost
//!
//! `initiate` and `absorb` do elliptic-curve math and are deliberately not
//! async: they perform no I/O and belong on a blocking thread
//! (`tokio::task::spawn_blocking`) so a slow exchange cannot starve message
//! delivery on the reactor.

use std::fmt;

use spake2::{Ed25519Group, Identity, Password as SpakePassword, Spake2};
use thiserror::Error;

use crate::config::PAKE_IDENTITY;
use crate::crypto::password::Password;

/// Errors from misusing or failing the PAKE lifecycle. All terminal.
#[derive(Debug, Error)]
pub enum PakeError {
    /// The peer's round material was malformed (wrong length, bad point).
    /// Either a broken peer or someone tampering with the signaling channel.
    #[error("malformed peer exchange material: {0}")]
    Corrupt(#[from] spake2::Error),

    /// `absorb` was called a second time. One round in, one round out —
    /// that's the protocol.
    #[error("peer material already absorbed -- the exchange is single-round")]
    AlreadyComplete,

    /// `session_key` was called before the peer round was absorbed.
    #[error("session key requested before the exchange completed")]
    NotReady,
}

/// The raw shared secret produced by a completed exchange.
///
/// Feed it to the channel key derivation and forget it existed. `Debug` is
/// redacted so it cannot wander into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(Vec<u8>);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// One peer's half of the SPAKE2 exchange.
///
/// Holds the curve state between the two rounds; dropped (and with it the
/// ephemeral scalar) as soon as the session key is extracted.
pub struct KeyExchange {
    state: Option<Spake2<Ed25519Group>>,
    outbound: Vec<u8>,
    session_key: Option<SessionKey>,
}

impl KeyExchange {
    /// Starts a symmetric exchange seeded with the password bytes.
    ///
    /// Pure computation — no network I/O happens here or anywhere else in
    /// this module. The outgoing round material is available immediately via
    /// [`outbound_bytes`](Self::outbound_bytes).
    pub fn initiate(password: &Password) -> Self {
        let (state, outbound) = Spake2::<Ed25519Group>::start_symmetric(
            &SpakePassword::new(password.as_str().as_bytes()),
            &Identity::new(PAKE_IDENTITY),
        );

        Self {
            state: Some(state),
            outbound,
            session_key: None,
        }
    }

    /// This peer's outgoing round material, to be relayed to the other side.
    pub fn outbound_bytes(&self) -> &[u8] {
        &self.outbound
    }

    /// Consumes the peer's round material and finishes the exchange.
    ///
    /// # Errors
    ///
    /// [`PakeError::AlreadyComplete`] on a second call;
    /// [`PakeError::Corrupt`] if the bytes are not a valid round message.
    /// Both are fatal to the session.
    pub fn absorb(&mut self, peer_bytes: &[u8]) -> Result<(), PakeError> {
        let state = self.state.take().ok_or(PakeError::AlreadyComplete)?;
        let key = state.finish(peer_bytes)?;
        self.session_key = Some(SessionKey(key));
        Ok(())
    }

    /// The shared session key.
    ///
    /// # Errors
    ///
    /// [`PakeError::NotReady`] unless exactly one [`absorb`](Self::absorb)
    /// has succeeded.
    pub fn session_key(&self) -> Result<SessionKey, PakeError> {
        self.session_key.clone().ok_or(PakeError::NotReady)
    }
}
