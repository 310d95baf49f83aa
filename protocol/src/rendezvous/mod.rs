//! # The Rendezvous Session Flow
//!
//! Everything between "two strangers share a password" and "an encrypted
//! transfer route exists" happens here, in one strictly ordered exchange
//! through the introducer service:
//!
//! ```text
//!   ┌──────────┐          ┌────────────┐          ┌──────────┐
//!   │  Sender  │          │ Rendezvous │          │ Receiver │
//!   └────┬─────┘          └─────┬──────┘          └────┬─────┘
//!        │◄──── Bind {id} ──────┤                      │
//!        ├─ Establish {digest} ─►                      │
//!        │                      ◄─ Establish {digest} ─┤
//!        │◄──── Ready ──────────┤                      │
//!        ├───── Pake ───────────┼───── PeerPake ──────►│
//!        │◄──── PeerPake ───────┼────── Pake ──────────┤
//!        ├───── Salt ───────────┼───── Salt ──────────►│
//!        │                      │                      │
//!        │ ════ everything below is ciphertext ════════│
//!        │                      │                      │
//!        │◄─────────────── ReceiverHandshake {ip} ─────┤
//!        ├──── SenderHandshake {ip, port, size} ──────►│
//!        │                      │            (receiver dials ip:port)
//!        │◄──────── DirectCommunication / RelayCommunication
//!        ├───────── DirectAck / RelayAck ─────────────►│
//! ```
//!
//! Three rules hold everywhere:
//!
//! 1. **One expected message per step.** Whatever else arrives is a
//!    desynchronization, reported with the full expected/actual detail and
//!    fatal to the session.
//! 2. **Nothing encrypted before the cipher, nothing plaintext after the
//!    salt.** The salt is the single post-secret plaintext message.
//! 3. **No retries.** A failed session is abandoned wholesale; trying again
//!    means a new session id and a new password.
//!
//! The sender driver coordinates with its local collaborators — password
//! display, payload preparation, listener bootstrap, relay consumption —
//! exclusively through one-shot channels; see [`sender::SenderChannels`].

pub mod error;
pub mod negotiate;
pub mod receiver;
pub mod sender;

pub use error::SessionError;
pub use negotiate::{dial_direct, DirectListener, ServerOptions};
pub use receiver::{Receiver, ReceiverOutcome, ReceiverRoute};
pub use sender::{Sender, SenderChannels, SenderRoute};
