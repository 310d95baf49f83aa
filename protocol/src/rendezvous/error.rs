//! Error types for the rendezvous session flow.
//!
//! Every failure here is terminal: the session driver surfaces exactly one
//! of these to its caller, the transport is torn down, and retrying means a
//! brand-new session with a brand-new password. There are no partial
//! successes to resume and no automatic retries to paper over a desync —
//! on an authenticated channel, "weird but recoverable" is not a category.

use thiserror::Error;

use crate::crypto::{ChannelError, PakeError};
use crate::wire::{SignalingType, TransferType};

/// Errors that can occur while driving a rendezvous session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying websocket failed or behaved unexpectedly.
    #[error("transport failure: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The peer or the rendezvous service hung up mid-protocol.
    #[error("rendezvous connection closed before the session completed")]
    ConnectionClosed,

    /// PAKE misuse or malformed peer key material.
    #[error("key exchange failed: {0}")]
    Handshake(#[from] PakeError),

    /// Authenticated encryption failed. Wrong password, tampering, or
    /// truncation — deliberately indistinguishable, uniformly fatal.
    #[error("secure channel failure: {0}")]
    Cipher(#[from] ChannelError),

    /// A signaling message arrived whose type does not match the current
    /// protocol step. Carries the full expected set for diagnosis.
    #[error(
        "signaling desync: expected one of [{}], received {actual}",
        format_types(.expected)
    )]
    WrongSignalingType {
        expected: Vec<SignalingType>,
        actual: SignalingType,
    },

    /// A transfer message arrived whose type does not match the current
    /// protocol step.
    #[error(
        "transfer desync: expected one of [{}], received {actual}",
        format_types(.expected)
    )]
    WrongTransferType {
        expected: Vec<TransferType>,
        actual: TransferType,
    },

    /// The wrong websocket frame kind arrived — text where ciphertext was
    /// expected or vice versa. A desync the transport spots without parsing.
    #[error("framing violation: expected a {expected} frame")]
    UnexpectedFrame { expected: &'static str },

    /// A bounded read expired. Treated exactly like a protocol error.
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str },

    /// The supplied password has no parseable session id prefix.
    #[error("malformed password: no numeric session id prefix")]
    MalformedPassword,

    /// A local resource could not be obtained (ephemeral port, local
    /// address discovery, ...).
    #[error("local resource unavailable: {0}")]
    Resource(String),

    /// A message failed to serialize or deserialize.
    #[error("message encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}

fn format_types<T: std::fmt::Display>(types: &[T]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
