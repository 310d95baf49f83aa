//! # CLI Interface
//!
//! Defines the command-line argument structure for the `wisp` binary using
//! `clap` derive. Three subcommands: `send`, `receive`, and `version`.

use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use wisp_protocol::config::{DEFAULT_RENDEZVOUS_HOST, DEFAULT_RENDEZVOUS_PORT};

/// WISP — password-authenticated peer-to-peer transfer.
///
/// Two machines, one short password, no prior setup. The sender prints a
/// password; the receiver types it in; the peers negotiate an end-to-end
/// encrypted route — direct TCP when reachable, relayed through the
/// rendezvous service when not.
#[derive(Parser, Debug)]
#[command(
    name = "wisp",
    about = "Password-authenticated peer-to-peer transfer",
    version,
    propagate_version = true
)]
pub struct WispCli {
    /// Rendezvous service host.
    #[arg(
        long,
        env = "WISP_RENDEZVOUS_HOST",
        default_value = DEFAULT_RENDEZVOUS_HOST,
        global = true
    )]
    pub rendezvous_host: String,

    /// Rendezvous service port.
    #[arg(
        long,
        env = "WISP_RENDEZVOUS_PORT",
        default_value_t = DEFAULT_RENDEZVOUS_PORT,
        global = true
    )]
    pub rendezvous_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "WISP_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the WISP binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a file: prints the password, then negotiates the transfer route.
    Send(SendArgs),
    /// Receive a file: joins the session named by the password.
    Receive(ReceiveArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `send` subcommand.
#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Path to the file to send.
    pub path: PathBuf,

    /// IP address to advertise for the direct-transfer endpoint.
    ///
    /// Defaults to the local address of the rendezvous connection, which is
    /// wrong behind NAT — set this when the host knows its reachable address.
    #[arg(long, env = "WISP_ADVERTISE_IP")]
    pub advertise_ip: Option<IpAddr>,
}

/// Arguments for the `receive` subcommand.
#[derive(Parser, Debug)]
pub struct ReceiveArgs {
    /// The transfer password, as read off the sending machine.
    /// Prompted for interactively when omitted.
    pub password: Option<String>,

    /// IP address to advertise as the expected origin of the direct
    /// connection. Same NAT caveat as on the sending side.
    #[arg(long, env = "WISP_ADVERTISE_IP")]
    pub advertise_ip: Option<IpAddr>,
}
