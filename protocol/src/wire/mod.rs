//! # Wire Envelopes
//!
//! Two message layers, one envelope discipline. Every message in WISP is a
//! tagged `{type, payload}` object, and every protocol step expects a
//! statically known set of types — exhaustive `match` on a sum type per
//! layer, no stringly-typed dispatch, no silent skipping of whatever showed
//! up instead.
//!
//! The layers differ only in what may see them:
//!
//! - [`signaling`] — plaintext JSON in websocket **text** frames, readable
//!   by the rendezvous service, used up to and including the salt exchange.
//! - [`transfer`] — the same JSON discipline, but sealed by the session
//!   cipher and carried in websocket **binary** frames. The rendezvous
//!   service relays these blind.
//!
//! The frame-kind split is intentional: a text frame arriving where
//! ciphertext is expected (or vice versa) is a protocol violation the
//! transport can spot without parsing a single byte.

pub mod signaling;
pub mod transfer;

pub use signaling::{SignalingMessage, SignalingType};
pub use transfer::{TransferMessage, TransferType};
