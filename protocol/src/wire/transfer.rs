//! # Transfer Envelope
//!
//! The peer-to-peer messages exchanged after the key exchange: endpoint
//! advertisement and the direct-vs-relay decision. Structurally these are
//! the same tagged `{type, payload}` JSON objects as the signaling layer,
//! but they never touch the wire in that form — every transfer message is
//! serialized, sealed by the [`SessionCipher`], and carried as an opaque
//! websocket binary frame. The rendezvous service relays ciphertext it
//! cannot read.
//!
//! Ordering is as strict as on the signaling layer: each step expects one
//! statically known message type (or, at the route decision point, one of
//! two), and anything else is fatal.
//!
//! [`SessionCipher`]: crate::crypto::SessionCipher

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// An encrypted peer-to-peer message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TransferMessage {
    /// Receiver → sender: opens the transfer handshake, advertising the
    /// address the sender should expect the direct connection from.
    ReceiverHandshake { ip: IpAddr },

    /// Sender → receiver: the direct-transfer endpoint and the total payload
    /// size. Only sent once the payload is fully prepared and the listener
    /// is bound — the size is a promise, not an estimate.
    SenderHandshake {
        ip: IpAddr,
        port: u16,
        payload_size: u64,
    },

    /// Receiver → sender: the direct endpoint was reachable; the bulk
    /// transfer will use the fresh TCP connection.
    DirectCommunication,

    /// Sender → receiver: acknowledged; the signaling transport is done
    /// carrying payload frames.
    DirectAck,

    /// Receiver → sender: the direct endpoint was not reachable; tunnel
    /// everything through the rendezvous connection instead.
    RelayCommunication,

    /// Sender → receiver: acknowledged; the signaling transport is now a
    /// relay conduit.
    RelayAck,
}

impl TransferMessage {
    /// The type tag of this message, for expected-type checks.
    pub fn message_type(&self) -> TransferType {
        match self {
            TransferMessage::ReceiverHandshake { .. } => TransferType::ReceiverHandshake,
            TransferMessage::SenderHandshake { .. } => TransferType::SenderHandshake,
            TransferMessage::DirectCommunication => TransferType::DirectCommunication,
            TransferMessage::DirectAck => TransferType::DirectAck,
            TransferMessage::RelayCommunication => TransferType::RelayCommunication,
            TransferMessage::RelayAck => TransferType::RelayAck,
        }
    }
}

/// The fieldless twin of [`TransferMessage`], used in expected-type sets
/// and protocol-desync errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferType {
    ReceiverHandshake,
    SenderHandshake,
    DirectCommunication,
    DirectAck,
    RelayCommunication,
    RelayAck,
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Matches the wire-level tag names.
        let name = match self {
            TransferType::ReceiverHandshake => "receiver_handshake",
            TransferType::SenderHandshake => "sender_handshake",
            TransferType::DirectCommunication => "direct_communication",
            TransferType::DirectAck => "direct_ack",
            TransferType::RelayCommunication => "relay_communication",
            TransferType::RelayAck => "relay_ack",
        };
        f.write_str(name)
    }
}
