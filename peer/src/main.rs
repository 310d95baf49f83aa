// Copyright (c) 2026 Wisp Contributors. MIT License.
// See LICENSE for details.

//! # WISP Peer
//!
//! Entry point for the `wisp` binary. Parses CLI arguments, initializes
//! logging, and drives one side of a rendezvous session:
//!
//! - `send <path>` — bind a session, print the password, negotiate the route
//! - `receive [password]` — join the session and negotiate from the other end
//! - `version` — print build version information
//!
//! The binary owns the wiring between the protocol driver and its local
//! collaborators: the terminal (password display), the filesystem (payload
//! readiness), and the listener bootstrap. The bulk transfer engine picks up
//! where the negotiation ends — with a direct TCP connection or a relay
//! conduit, and a session cipher for either.

mod cli;
mod logging;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tokio::sync::oneshot;

use wisp_protocol::config::RendezvousConfig;
use wisp_protocol::crypto::Password;
use wisp_protocol::rendezvous::{
    Receiver, ReceiverRoute, Sender, SenderChannels, SenderRoute,
};

use cli::{Commands, ReceiveArgs, SendArgs, WispCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WispCli::parse();
    logging::init_logging(
        "wisp=info,wisp_protocol=info",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let config = RendezvousConfig {
        host: cli.rendezvous_host.clone(),
        port: cli.rendezvous_port,
        ..Default::default()
    };

    match cli.command {
        Commands::Send(args) => send(config, args).await,
        Commands::Receive(args) => receive(config, args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs the sending side: payload inspection, password display, route
/// negotiation, and the direct-listener bootstrap.
async fn send(mut config: RendezvousConfig, args: SendArgs) -> Result<()> {
    config.advertise_ip = args.advertise_ip;

    let metadata = tokio::fs::metadata(&args.path)
        .await
        .with_context(|| format!("failed to stat payload: {}", args.path.display()))?;
    ensure!(
        metadata.is_file(),
        "payload must be a regular file: {}",
        args.path.display()
    );
    let payload_size = metadata.len();
    tracing::info!(path = %args.path.display(), payload_size, "payload inspected");

    let (password_tx, password_rx) = oneshot::channel();
    let (listener_tx, listener_rx) = oneshot::channel();
    let (payload_tx, payload_ready_rx) = oneshot::channel();
    let (relay_tx, relay_rx) = oneshot::channel();

    let sender = Sender::new(config);
    let conn = sender
        .connect()
        .await
        .context("failed to reach the rendezvous service")?;

    let driver = tokio::spawn(async move {
        sender
            .negotiate(
                conn,
                SenderChannels {
                    password_tx,
                    listener_tx,
                    payload_ready_rx,
                    relay_tx,
                },
            )
            .await
    });

    // The password goes to stdout the moment the session is bound; the
    // negotiation keeps running while the human relays it.
    let password = match password_rx.await {
        Ok(password) => password,
        Err(_) => {
            // The driver never issued a password; its own error says why.
            let route = driver.await.context("sender driver panicked")??;
            anyhow::bail!("negotiation ended ({route:?}) before a password was issued");
        }
    };
    println!("Transfer password: {password}");
    println!("On the receiving machine, run:  wisp receive {password}");

    // The payload is a file already on disk; it is "prepared" as soon as we
    // have its size.
    let _ = payload_tx.send(payload_size);

    // Listener bootstrap: accept the peer's one direct connection, if the
    // direct route is taken.
    let accept_task = tokio::spawn(async move {
        let Ok(direct) = listener_rx.await else {
            return;
        };
        tracing::info!(
            port = direct.options.port,
            expected_peer = %direct.options.expected_peer_ip,
            "direct-transfer listener ready"
        );
        match direct.listener.accept().await {
            Ok((_stream, addr)) if addr.ip() == direct.options.expected_peer_ip => {
                tracing::info!(%addr, "direct connection accepted; transfer engine takes over");
            }
            Ok((_stream, addr)) => {
                tracing::warn!(%addr, "unexpected peer on the transfer listener");
            }
            Err(e) => tracing::warn!(error = %e, "transfer listener accept failed"),
        }
    });

    let route = driver.await.context("sender driver panicked")??;
    match route {
        SenderRoute::Direct { .. } => {
            accept_task
                .await
                .context("listener bootstrap task panicked")?;
            println!("Direct route negotiated; payload streams over the peer connection.");
        }
        SenderRoute::Relay => {
            // No direct connection is coming; stop waiting for one.
            accept_task.abort();
            let _conduit = relay_rx
                .await
                .context("relay conduit was not handed off")?;
            println!("Relay route negotiated; payload streams through the rendezvous service.");
        }
    }

    Ok(())
}

/// Runs the receiving side: password entry and route negotiation.
async fn receive(mut config: RendezvousConfig, args: ReceiveArgs) -> Result<()> {
    config.advertise_ip = args.advertise_ip;

    let password = match args.password {
        Some(raw) => Password::new(raw),
        None => prompt_password()?,
    };

    let receiver = Receiver::new(config);
    let conn = receiver
        .connect()
        .await
        .context("failed to reach the rendezvous service")?;

    let outcome = receiver
        .negotiate(conn, password)
        .await
        .context("rendezvous negotiation failed")?;

    println!("Negotiated transfer of {} bytes.", outcome.payload_size);
    match outcome.route {
        ReceiverRoute::Direct { stream, .. } => {
            let peer = stream
                .peer_addr()
                .context("direct connection lost its peer address")?;
            println!("Direct route negotiated; receiving from {peer}.");
        }
        ReceiverRoute::Relay { .. } => {
            println!("Relay route negotiated; receiving through the rendezvous service.");
        }
    }

    Ok(())
}

/// Reads the password from the terminal when it was not passed as an
/// argument.
fn prompt_password() -> Result<Password> {
    use std::io::{BufRead, Write};

    print!("Transfer password: ");
    std::io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(Password::new(line.trim().to_string()))
}

/// Prints version information to stdout.
fn print_version() {
    println!("wisp     {}", env!("CARGO_PKG_VERSION"));
    println!("protocol {}", wisp_protocol::config::PROTOCOL_VERSION);
}
