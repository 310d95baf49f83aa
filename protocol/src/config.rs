//! # Protocol Configuration & Constants
//!
//! Every magic number in WISP lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! The constants define the wire-level DNA of the protocol — change one and
//! two peers running different builds will happily talk past each other
//! until the first authenticated decrypt fails. Choose wisely.

use std::net::IpAddr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string, assembled at compile time so we don't
/// allocate for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Rendezvous Service
// ---------------------------------------------------------------------------

/// Default rendezvous (introducer) host. Overridable per session via
/// [`RendezvousConfig`] — the public instance is a convenience, not a
/// dependency.
pub const DEFAULT_RENDEZVOUS_HOST: &str = "rendezvous.wisp.sh";

/// Default rendezvous port.
pub const DEFAULT_RENDEZVOUS_PORT: u16 = 8090;

/// Websocket path a sending peer dials.
pub const SENDER_ENDPOINT: &str = "/establish-sender";

/// Websocket path a receiving peer dials.
pub const RECEIVER_ENDPOINT: &str = "/establish-receiver";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// AES-256-GCM for the symmetric channel. 256-bit keys, 96-bit nonces,
/// 128-bit authentication tags. The holy trinity of authenticated encryption.
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-GCM";

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits is the standard and the only
/// length you should use. 12 bytes. Not 16. Not 8. Twelve.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// Length of the salt generated alongside each session cipher and exchanged
/// once, in plaintext, after the PAKE round completes.
pub const SALT_LENGTH: usize = 16;

/// Domain-separation info string for the HKDF expansion that turns
/// `(session key, salt)` into the AES key. Versioned so a future key
/// schedule can change without silently interoperating with this one.
pub const CHANNEL_KEY_INFO: &[u8] = b"wisp transfer channel v1";

/// SPAKE2 symmetric identity. Both sides must use the exact same bytes or
/// the exchange produces garbage keys with no error to show for it.
pub const PAKE_IDENTITY: &[u8] = b"wisp rendezvous v1";

// ---------------------------------------------------------------------------
// Password Parameters
// ---------------------------------------------------------------------------

/// Number of random words appended to the numeric session id.
/// Three words from a 256-entry list is 24 bits of suffix entropy — plenty
/// for a secret that lives for one rendezvous and is burned by a single
/// failed PAKE round.
pub const PASSWORD_WORD_COUNT: usize = 3;

/// Separator between the session id and the password words.
pub const PASSWORD_SEPARATOR: char = '-';

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// How long a peer will sit at the rendezvous waiting for the other human
/// to show up (the sender's `Ready` wait, the receiver's first PAKE read).
/// Ten minutes is generous — passwords travel over chat apps and phone
/// calls, not fiber.
pub const PEER_WAIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Upper bound on every other signaling read. Once both peers are present,
/// each protocol step should complete within seconds; thirty covers a slow
/// PAKE derivation on an old laptop with margin.
pub const SIGNALING_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the receiver probes the sender's advertised endpoint before
/// falling back to the relay path. Direct TCP either works quickly or not
/// at all — NATs don't get more permissive if you wait politely.
pub const DIRECT_DIAL_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Rendezvous Configuration
// ---------------------------------------------------------------------------

/// Immutable per-session configuration, passed into the sender and receiver
/// constructors. There is deliberately no global mutable state behind this —
/// a session gets a config and keeps it.
#[derive(Clone, Debug)]
pub struct RendezvousConfig {
    /// Rendezvous service hostname or address.
    pub host: String,
    /// Rendezvous service port.
    pub port: u16,
    /// IP address to advertise to the peer for the direct-transfer endpoint.
    ///
    /// When `None`, the local address of the rendezvous connection is used —
    /// correct on open networks, wrong behind NAT. Set this explicitly when
    /// the host knows its reachable address.
    pub advertise_ip: Option<IpAddr>,
    /// Bound on the waits that depend on the other human showing up.
    pub peer_wait_timeout: Duration,
    /// Bound on every other signaling read.
    pub read_timeout: Duration,
    /// Bound on the receiver's direct-connection probe.
    pub dial_timeout: Duration,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RENDEZVOUS_HOST.to_string(),
            port: DEFAULT_RENDEZVOUS_PORT,
            advertise_ip: None,
            peer_wait_timeout: PEER_WAIT_TIMEOUT,
            read_timeout: SIGNALING_READ_TIMEOUT,
            dial_timeout: DIRECT_DIAL_TIMEOUT,
        }
    }
}

impl RendezvousConfig {
    /// Builds the websocket URL for the given endpoint path.
    pub fn url(&self, endpoint: &str) -> String {
        format!("ws://{}:{}{}", self.host, self.port, endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(AES_KEY_LENGTH, 32);
        assert_eq!(AES_NONCE_LENGTH, 12);
        assert_eq!(AES_TAG_LENGTH, 16);
        assert_eq!(SALT_LENGTH, 16);
    }

    #[test]
    fn test_timeouts_are_ordered() {
        // A single protocol step must never be allowed to out-wait the
        // human-arrival window, or the timeout taxonomy stops meaning anything.
        assert!(SIGNALING_READ_TIMEOUT < PEER_WAIT_TIMEOUT);
        assert!(DIRECT_DIAL_TIMEOUT < SIGNALING_READ_TIMEOUT);
    }

    #[test]
    fn test_default_config_uses_constants() {
        let config = RendezvousConfig::default();
        assert_eq!(config.host, DEFAULT_RENDEZVOUS_HOST);
        assert_eq!(config.port, DEFAULT_RENDEZVOUS_PORT);
        assert!(config.advertise_ip.is_none());
        assert_eq!(config.read_timeout, SIGNALING_READ_TIMEOUT);
    }

    #[test]
    fn test_url_building() {
        let config = RendezvousConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(
            config.url(SENDER_ENDPOINT),
            "ws://127.0.0.1:9000/establish-sender"
        );
        assert_eq!(
            config.url(RECEIVER_ENDPOINT),
            "ws://127.0.0.1:9000/establish-receiver"
        );
    }

    #[test]
    fn test_domain_separation_strings_are_distinct() {
        // The PAKE identity and the channel KDF info must never collide —
        // they separate two different uses of the same password-derived secret.
        assert_ne!(PAKE_IDENTITY, CHANNEL_KEY_INFO);
    }
}
