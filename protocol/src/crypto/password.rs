//! # Transfer Passwords
//!
//! A WISP password is the only secret two peers share: a numeric session id
//! issued by the rendezvous service, followed by random words a human can
//! read over the phone without spelling anything — `4217-ember-lagoon-pine`.
//!
//! The password itself never crosses the wire. The rendezvous service sees
//! its SHA-256 digest (enough to verify both peers typed the same thing,
//! useless for impersonation), and the peer sees only SPAKE2 round material
//! derived from it. A wrong password survives every plaintext step and dies
//! at the first authenticated decrypt — exactly where it should.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::{PASSWORD_SEPARATOR, PASSWORD_WORD_COUNT};

/// The word suffix alphabet. 256 entries so a single random byte indexes the
/// list exactly — no modulo bias, no rejection sampling, no cleverness.
///
/// Words are short, common, and phonetically distinct; nothing here should
/// survive an autocorrect mangling ambiguously.
const WORDLIST: [&str; 256] = [
    "acorn", "alley", "amber", "anchor", "apple", "apron", "arrow", "aspen",
    "atlas", "attic", "autumn", "badge", "bagel", "bamboo", "banjo", "barley",
    "basil", "beacon", "beach", "bean", "beaver", "bell", "berry", "birch",
    "bison", "blanket", "blossom", "bluff", "boat", "bonfire", "book", "boot",
    "bottle", "boulder", "bramble", "brass", "breeze", "brick", "bridge", "brook",
    "broom", "bucket", "butter", "cabin", "cactus", "camel", "candle", "canoe",
    "canyon", "carpet", "carrot", "castle", "cedar", "cellar", "chalk", "cherry",
    "chess", "chime", "cider", "cinder", "clam", "cliff", "clover", "coast",
    "cobalt", "coconut", "comet", "compass", "copper", "coral", "cotton", "cove",
    "crane", "crater", "creek", "cricket", "crocus", "crumb", "crystal", "cumin",
    "cypress", "daisy", "deer", "delta", "denim", "desert", "dew", "dill",
    "dome", "dove", "dragon", "drift", "drum", "dune", "eagle", "earth",
    "echo", "eel", "elbow", "elder", "elm", "ember", "engine", "fable",
    "falcon", "fern", "ferry", "fiddle", "fig", "finch", "fjord", "flame",
    "flask", "flint", "flora", "flour", "flute", "fog", "forest", "fossil",
    "fox", "frost", "galaxy", "garden", "garlic", "gazebo", "geyser", "ginger",
    "glacier", "glade", "glen", "glove", "goose", "gourd", "granite", "grape",
    "grove", "guitar", "gull", "hammock", "harbor", "harp", "hazel", "heather",
    "hedge", "helmet", "heron", "hickory", "hill", "hollow", "honey", "hoof",
    "horizon", "hornet", "husk", "igloo", "inlet", "iris", "island", "ivory",
    "ivy", "jade", "jasmine", "jelly", "jetty", "jigsaw", "juniper", "kayak",
    "kelp", "kettle", "kite", "knoll", "lagoon", "lake", "lantern", "larch",
    "latch", "laurel", "lava", "lemon", "lichen", "lilac", "lily", "lime",
    "linen", "lion", "lobster", "locket", "loft", "lotus", "lumber", "lunar",
    "magnet", "mango", "maple", "marble", "marsh", "meadow", "melon", "mesa",
    "mint", "mirror", "mist", "moss", "moth", "mulberry", "mural", "musk",
    "nectar", "nettle", "night", "nomad", "north", "nutmeg", "oak", "oasis",
    "ocean", "olive", "onion", "opal", "orbit", "orchard", "osprey", "otter",
    "owl", "oyster", "paddle", "pagoda", "palm", "panda", "pansy", "papaya",
    "parlor", "parrot", "peach", "pearl", "pebble", "pecan", "pelican", "pepper",
    "perch", "pigeon", "pine", "piano", "plank", "plaza", "plum", "pond",
    "poplar", "poppy", "prairie", "prism", "quartz", "quill", "rabbit", "raft",
];

/// A human-transcribable transfer password.
///
/// Generated once per session by the peer that binds the rendezvous session;
/// typed in by the other peer. Equality is byte equality — there is no
/// normalization, what you read aloud is what must be typed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a password as supplied by the user.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Generates a fresh password for the given rendezvous session id:
    /// deterministic numeric prefix, cryptographically random word suffix.
    pub fn generate(session_id: u32) -> Self {
        let mut indices = [0u8; PASSWORD_WORD_COUNT];
        OsRng.fill_bytes(&mut indices);

        let mut password = session_id.to_string();
        for index in indices {
            password.push(PASSWORD_SEPARATOR);
            password.push_str(WORDLIST[index as usize]);
        }
        Self(password)
    }

    /// Parses the numeric session id prefix back out of the password.
    ///
    /// Returns `None` for anything that does not start with
    /// `<digits><separator>` — a mistyped or truncated password.
    pub fn session_id(&self) -> Option<u32> {
        let prefix = self.0.split(PASSWORD_SEPARATOR).next()?;
        prefix.parse().ok()
    }

    /// SHA-256 of the full password, lowercase hex.
    ///
    /// This is the only password-derived value the rendezvous service ever
    /// sees: deterministic so both peers' digests match, one-way so the
    /// service learns nothing worth stealing.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }

    /// The raw password string, for display to the human who must relay it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// The password is a credential; keep it out of debug logs.
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordlist_has_exactly_one_byte_of_entropy_per_word() {
        // The generator indexes the list with a raw random byte; anything
        // other than 256 entries would bias or panic.
        assert_eq!(WORDLIST.len(), 256);
    }

    #[test]
    fn wordlist_entries_are_unique() {
        let mut sorted = WORDLIST.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 256, "duplicate word in WORDLIST");
    }

    #[test]
    fn generated_password_has_expected_shape() {
        let password = Password::generate(7);
        let parts: Vec<&str> = password.as_str().split(PASSWORD_SEPARATOR).collect();

        assert_eq!(parts.len(), 1 + PASSWORD_WORD_COUNT);
        assert_eq!(parts[0], "7");
        for word in &parts[1..] {
            assert!(WORDLIST.contains(word), "unknown word: {word}");
        }
    }

    #[test]
    fn session_id_round_trips_through_generation() {
        for id in [0, 7, 4217, u32::MAX] {
            assert_eq!(Password::generate(id).session_id(), Some(id));
        }
    }

    #[test]
    fn session_id_rejects_garbage() {
        assert_eq!(Password::new("apple-river").session_id(), None);
        assert_eq!(Password::new("").session_id(), None);
        assert_eq!(Password::new("x7-apple").session_id(), None);
    }

    #[test]
    fn digest_is_deterministic_and_distinct() {
        let a = Password::new("7-apple-river");
        let b = Password::new("7-apple-river");
        let c = Password::new("7-apple-rivet");

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        // SHA-256 → 32 bytes → 64 hex chars.
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn debug_does_not_leak_the_password() {
        let password = Password::new("7-apple-river");
        assert_eq!(format!("{:?}", password), "Password(..)");
        // Display is the UI path and must show the real thing.
        assert_eq!(password.to_string(), "7-apple-river");
    }
}
