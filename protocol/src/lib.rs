// Copyright (c) 2026 Wisp Contributors. MIT License.
// See LICENSE for details.

//! # WISP Protocol — Core Library
//!
//! WISP moves a payload between two machines whose only shared context is a
//! short password read over a phone call. No accounts, no key distribution,
//! no prior network knowledge — a rendezvous service introduces the peers,
//! a PAKE turns the weak password into a strong session key, and the peers
//! then settle the only remaining question: can they reach each other
//! directly, or does the introducer have to keep carrying (now opaque)
//! bytes?
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual layers of the
//! protocol:
//!
//! - **crypto** — Passwords, the SPAKE2 exchange, the AES-256-GCM session
//!   channel. Don't roll your own.
//! - **wire** — The tagged message envelopes, one sum type per protocol
//!   layer: plaintext signaling and encrypted transfer.
//! - **transport** — The rendezvous websocket: framing discipline, bounded
//!   reads, expected-type enforcement, relay repurposing.
//! - **rendezvous** — The session drivers for both roles plus the
//!   connectivity negotiation between direct TCP and relay fallback.
//! - **config** — Protocol constants and the per-session configuration.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over cleverness — a rendezvous has maybe six messages;
//!    none of them is allowed to surprise anyone.
//! 2. Every failure is terminal. Sessions are cheap, trust is not.
//! 3. The type system enforces the protocol where it can: a repurposed
//!    relay connection simply has no signaling methods left to call.
//! 4. If it touches key material, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod rendezvous;
pub mod transport;
pub mod wire;
