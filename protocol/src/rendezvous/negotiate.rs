//! # Connectivity Negotiation Primitives
//!
//! The pieces the session drivers use to decide direct-vs-relay: binding
//! the direct-transfer listener on the sender side, probing the advertised
//! endpoint on the receiver side.
//!
//! The listener is bound *here*, before the sender's handshake message is
//! ever sent, and handed onward already listening. Advertising a port first
//! and binding it later invites two races at once — another process
//! grabbing the port, and the peer dialing before the socket exists — and
//! the protocol tolerates neither.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use super::error::SessionError;

/// Direct-transfer listener configuration, produced by the sender-side
/// negotiation and consumed by the bulk-transfer server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerOptions {
    /// The ephemeral port the listener is bound to.
    pub port: u16,
    /// The peer address the listener should expect its one inbound
    /// connection from. Anything else knocking is not our transfer.
    pub expected_peer_ip: IpAddr,
}

/// An already-bound direct-transfer listener plus its advertisement data.
///
/// Handed through the listener-bootstrap channel as one unit so the
/// component that accepts the connection can never observe a port that is
/// not yet (or no longer) bound.
#[derive(Debug)]
pub struct DirectListener {
    pub options: ServerOptions,
    pub listener: TcpListener,
}

/// Binds the direct-transfer listener on an ephemeral port.
///
/// # Errors
///
/// [`SessionError::Resource`] if no port can be obtained. Fatal to the
/// session: by the time this runs the payload is ready and the handshake is
/// imminent, and a sender that cannot say where it listens has nothing
/// truthful to advertise.
pub async fn bind_direct_listener(
    expected_peer_ip: IpAddr,
) -> Result<DirectListener, SessionError> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(|e| SessionError::Resource(format!("failed to bind transfer listener: {e}")))?;

    let port = listener
        .local_addr()
        .map_err(|e| SessionError::Resource(format!("failed to read listener address: {e}")))?
        .port();

    tracing::debug!(port, %expected_peer_ip, "direct-transfer listener bound");

    Ok(DirectListener {
        options: ServerOptions {
            port,
            expected_peer_ip,
        },
        listener,
    })
}

/// Probes the sender's advertised endpoint for direct reachability.
///
/// Failure is not an error — it is the answer "relay". Refusals and
/// timeouts are treated identically; a NAT that silently drops SYNs and a
/// host that actively refuses both mean the direct path is not happening.
pub async fn dial_direct(ip: IpAddr, port: u16, deadline: Duration) -> Option<TcpStream> {
    let addr = SocketAddr::new(ip, port);
    match tokio::time::timeout(deadline, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            tracing::debug!(%addr, "direct connection established");
            Some(stream)
        }
        Ok(Err(e)) => {
            tracing::debug!(%addr, error = %e, "direct connection refused");
            None
        }
        Err(_) => {
            tracing::debug!(%addr, "direct connection attempt timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn bound_listener_reports_a_real_port() {
        let direct = bind_direct_listener("10.0.0.9".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(direct.options.port, 0);
        assert_eq!(
            direct.options.expected_peer_ip,
            "10.0.0.9".parse::<IpAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn dial_reaches_a_live_listener() {
        let direct = bind_direct_listener(Ipv4Addr::LOCALHOST.into())
            .await
            .unwrap();
        let port = direct.options.port;

        let (dialed, accepted) = tokio::join!(
            dial_direct(Ipv4Addr::LOCALHOST.into(), port, PROBE),
            direct.listener.accept(),
        );

        assert!(dialed.is_some());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn dial_reports_unreachable_endpoints_as_none() {
        // Bind then immediately drop to get a port that is free again.
        let direct = bind_direct_listener(Ipv4Addr::LOCALHOST.into())
            .await
            .unwrap();
        let port = direct.options.port;
        drop(direct);

        assert!(dial_direct(Ipv4Addr::LOCALHOST.into(), port, PROBE)
            .await
            .is_none());
    }
}
