//! Narrated CLI demo of the WISP cryptographic lifecycle.
//!
//! Walks through what the two peers compute locally during a rendezvous:
//! password generation, the symmetric SPAKE2 exchange, salt-based key
//! derivation, and sealed frames crossing the (here, imaginary) wire —
//! including what happens when the receiving human mistypes the password.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use wisp_protocol::crypto::{KeyExchange, Password, SessionCipher};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";

fn step(n: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}[{n}] {title}{RESET}");
}

fn note(text: &str) {
    println!("    {DIM}{text}{RESET}");
}

fn main() {
    println!();
    println!("{BOLD}WISP — rendezvous cryptography, end to end, in one process{RESET}");

    // -- Password -----------------------------------------------------------
    step(1, "The sender is issued session id 7 and mints a password");
    let password = Password::generate(7);
    println!("    password: {GREEN}{password}{RESET}");
    note("The numeric prefix routes the receiver to the right session;");
    note("the word suffix is the actual secret. Neither ever crosses the");
    note("wire — the rendezvous service sees only this digest:");
    println!("    digest:   {DIM}{}{RESET}", password.digest());

    // -- PAKE ---------------------------------------------------------------
    step(2, "Both peers run the SPAKE2 exchange");
    let started = Instant::now();
    let mut sender_exchange = KeyExchange::initiate(&password);
    let transcribed = Password::new(password.as_str());
    let mut receiver_exchange = KeyExchange::initiate(&transcribed);

    let sender_round = sender_exchange.outbound_bytes().to_vec();
    let receiver_round = receiver_exchange.outbound_bytes().to_vec();
    note("One round each way, relayed by the introducer, opaque to it.");

    sender_exchange
        .absorb(&receiver_round)
        .expect("receiver round material is well-formed");
    receiver_exchange
        .absorb(&sender_round)
        .expect("sender round material is well-formed");

    let sender_key = sender_exchange.session_key().expect("exchange completed");
    let receiver_key = receiver_exchange.session_key().expect("exchange completed");
    assert_eq!(sender_key, receiver_key);
    println!(
        "    {GREEN}identical session keys derived independently{RESET} {DIM}({:?}){RESET}",
        started.elapsed()
    );

    // -- Channel ------------------------------------------------------------
    step(3, "The sender mints a salt; both sides derive the channel key");
    let sender_cipher = SessionCipher::new(&sender_key);
    let receiver_cipher = SessionCipher::with_salt(&receiver_key, sender_cipher.salt())
        .expect("salt has the right length");
    println!("    salt: {DIM}{}{RESET}  (plaintext on the wire, and that's fine)",
        hex::encode(sender_cipher.salt()));

    let sealed = sender_cipher
        .encrypt(b"{\"type\":\"sender_handshake\",...}")
        .expect("encryption");
    let opened = receiver_cipher.decrypt(&sealed).expect("authenticated decrypt");
    println!(
        "    sealed {YELLOW}{}{RESET} bytes -> opened {YELLOW}{}{RESET} bytes, intact",
        sealed.len(),
        opened.len()
    );

    // -- The mistyped password ---------------------------------------------
    step(4, "The same story with one mistyped character");
    let mistyped = Password::new(format!("{}x", password.as_str()));
    let mut wrong_exchange = KeyExchange::initiate(&mistyped);
    let mut honest_exchange = KeyExchange::initiate(&password);

    let wrong_round = wrong_exchange.outbound_bytes().to_vec();
    let honest_round = honest_exchange.outbound_bytes().to_vec();
    wrong_exchange.absorb(&honest_round).expect("round parses");
    honest_exchange.absorb(&wrong_round).expect("round parses");
    note("The exchange completes mechanically — no error yet, by design.");

    let honest_cipher = SessionCipher::new(&honest_exchange.session_key().unwrap());
    let wrong_cipher = SessionCipher::with_salt(
        &wrong_exchange.session_key().unwrap(),
        honest_cipher.salt(),
    )
    .unwrap();

    let sealed = honest_cipher.encrypt(b"first encrypted message").unwrap();
    match wrong_cipher.decrypt(&sealed) {
        Err(e) => println!("    {RED}first decrypt fails:{RESET} {e}"),
        Ok(_) => unreachable!("mismatched keys cannot authenticate"),
    }
    note("That failure is the password check. The session is abandoned and");
    note("a fresh password minted — nothing to brute-force from the wire.");

    println!();
    println!("{BOLD}{GREEN}Done.{RESET} The network half of this story lives in tests/session_flow.rs.");
    println!();
}
