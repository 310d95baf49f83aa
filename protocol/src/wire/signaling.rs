//! # Signaling Envelope
//!
//! The plaintext bootstrap messages exchanged with the rendezvous service
//! before (and while) the session secret is established. Each message is a
//! tagged `{type, payload}` JSON object carried in a websocket text frame —
//! deliberately human-readable, because everything in it is public by
//! design: session ids, a one-way password digest, PAKE round material that
//! is safe to publish, and finally the channel salt.
//!
//! The exchange is strictly ordered. A peer at a given protocol step expects
//! exactly one message type; anything else is a desynchronization and kills
//! the session. The expected-type checks live in the transport layer
//! ([`crate::transport::SignalingConnection::recv_signaling`]) so no driver
//! can forget them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A plaintext signaling message.
///
/// Byte payloads are hex-encoded on the wire to keep the text frames
/// readable in packet captures and rendezvous logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// Rendezvous → binding peer: a fresh session id was allocated.
    Bind { session_id: u32 },

    /// Peer → rendezvous: join a session. Carries the session id (parsed
    /// from the password prefix on the receiving side) so the service can
    /// pair peers without comparing secrets, plus the password digest so it
    /// can flag obvious mismatches.
    Establish { session_id: u32, digest: String },

    /// Rendezvous → sender: the other peer has established; safe to begin
    /// the key exchange.
    Ready,

    /// Peer → rendezvous: this peer's PAKE round material. Opaque to the
    /// service, which relays it to the other side as [`PeerPake`].
    ///
    /// [`PeerPake`]: SignalingMessage::PeerPake
    Pake {
        #[serde(with = "hex::serde")]
        bytes: Vec<u8>,
    },

    /// Rendezvous → peer: the other peer's PAKE round material.
    PeerPake {
        #[serde(with = "hex::serde")]
        bytes: Vec<u8>,
    },

    /// Sender → rendezvous → receiver: the channel salt. The one and only
    /// plaintext message sent after the session secret exists.
    Salt {
        #[serde(with = "hex::serde")]
        salt: Vec<u8>,
    },
}

impl SignalingMessage {
    /// The type tag of this message, for expected-type checks.
    pub fn message_type(&self) -> SignalingType {
        match self {
            SignalingMessage::Bind { .. } => SignalingType::Bind,
            SignalingMessage::Establish { .. } => SignalingType::Establish,
            SignalingMessage::Ready => SignalingType::Ready,
            SignalingMessage::Pake { .. } => SignalingType::Pake,
            SignalingMessage::PeerPake { .. } => SignalingType::PeerPake,
            SignalingMessage::Salt { .. } => SignalingType::Salt,
        }
    }
}

/// The fieldless twin of [`SignalingMessage`], used in expected-type sets
/// and protocol-desync errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalingType {
    Bind,
    Establish,
    Ready,
    Pake,
    PeerPake,
    Salt,
}

impl fmt::Display for SignalingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Matches the wire-level tag names.
        let name = match self {
            SignalingType::Bind => "bind",
            SignalingType::Establish => "establish",
            SignalingType::Ready => "ready",
            SignalingType::Pake => "pake",
            SignalingType::PeerPake => "peer_pake",
            SignalingType::Salt => "salt",
        };
        f.write_str(name)
    }
}
