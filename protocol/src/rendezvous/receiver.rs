//! # Receiver-Side Session Driver
//!
//! The mirror of the sender flow. The receiving peer arrives with the
//! password a human typed in, joins the session named by its numeric
//! prefix, runs the same key exchange from the other side, and then makes
//! the one decision the sender cannot: whether the advertised direct
//! endpoint is actually reachable from here.
//!
//! The receiver never generates anything a user must see and owns no
//! listener, so it needs no cross-task gates — its outcome is the negotiated
//! route itself, returned to the caller.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task;

use crate::config::RendezvousConfig;
use crate::crypto::{KeyExchange, PakeError, Password, SessionCipher};
use crate::transport::{PeerRole, RelayConduit, SignalingConnection};
use crate::wire::{SignalingMessage, SignalingType, TransferMessage, TransferType};

use super::error::SessionError;
use super::negotiate::dial_direct;

/// Where the payload will flow, as decided by the connectivity probe.
#[derive(Debug)]
pub enum ReceiverRoute<S> {
    /// The sender's endpoint was reachable; the bulk transfer arrives over
    /// this fresh TCP connection, sealed with this cipher.
    Direct {
        stream: TcpStream,
        cipher: SessionCipher,
    },
    /// The endpoint was not reachable; the rendezvous connection, already
    /// repurposed, carries the transfer.
    Relay { conduit: RelayConduit<S> },
}

/// The result of a completed receiver-side negotiation.
#[derive(Debug)]
pub struct ReceiverOutcome<S> {
    /// Total payload size promised by the sender's handshake.
    pub payload_size: u64,
    /// The negotiated transfer route.
    pub route: ReceiverRoute<S>,
}

/// A receiving peer.
pub struct Receiver {
    config: RendezvousConfig,
}

impl Receiver {
    pub fn new(config: RendezvousConfig) -> Self {
        Self { config }
    }

    /// Dials the rendezvous service with the receiver role.
    pub async fn connect(&self) -> Result<SignalingConnection<TcpStream>, SessionError> {
        SignalingConnection::connect(&self.config, PeerRole::Receiver).await
    }

    /// Runs the full receiver-side session over an established connection.
    ///
    /// `password` is the secret as transcribed by the user; its numeric
    /// prefix names the session to join. Every failure — a password with no
    /// parseable prefix, a protocol desync, a decrypt failure from a
    /// mistyped suffix — is terminal, and retrying means a fresh session.
    pub async fn negotiate<S>(
        &self,
        mut conn: SignalingConnection<S>,
        password: Password,
    ) -> Result<ReceiverOutcome<S>, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let cfg = &self.config;

        // --- Establish: join the session named by the password prefix ------
        let session_id = password.session_id().ok_or(SessionError::MalformedPassword)?;
        conn.send_signaling(&SignalingMessage::Establish {
            session_id,
            digest: password.digest(),
        })
        .await?;
        tracing::info!(session_id, "joining rendezvous session");

        // --- Key exchange --------------------------------------------------
        // Start the curve math on a blocking thread while waiting for the
        // sender's round material (the sender is grinding the same math and
        // may have minutes of head start or none at all).
        let exchange_task = task::spawn_blocking(move || KeyExchange::initiate(&password));

        let msg = conn
            .recv_signaling(
                &[SignalingType::PeerPake],
                cfg.peer_wait_timeout,
                "sender key material",
            )
            .await?;
        let peer_bytes = match msg {
            SignalingMessage::PeerPake { bytes } => bytes,
            _ => unreachable!("recv_signaling enforces the expected type"),
        };

        let mut exchange = exchange_task
            .await
            .map_err(|e| SessionError::Resource(format!("key-exchange task failed: {e}")))?;

        conn.send_signaling(&SignalingMessage::Pake {
            bytes: exchange.outbound_bytes().to_vec(),
        })
        .await?;

        let exchange = task::spawn_blocking(move || -> Result<KeyExchange, PakeError> {
            exchange.absorb(&peer_bytes)?;
            Ok(exchange)
        })
        .await
        .map_err(|e| SessionError::Resource(format!("key-exchange task failed: {e}")))??;

        let session_key = exchange.session_key()?;

        // --- Salt: adopt the sender's channel parameters -------------------
        let msg = conn
            .recv_signaling(&[SignalingType::Salt], cfg.read_timeout, "channel salt")
            .await?;
        let salt = match msg {
            SignalingMessage::Salt { salt } => salt,
            _ => unreachable!("recv_signaling enforces the expected type"),
        };
        let cipher = SessionCipher::with_salt(&session_key, &salt)?;
        tracing::info!(session_id, "encrypted channel established");

        // --- Transfer handshake --------------------------------------------
        let advertise_ip = cfg
            .advertise_ip
            .or_else(|| conn.local_ip())
            .ok_or_else(|| SessionError::Resource("no advertisable local address".into()))?;

        conn.send_encrypted(&TransferMessage::ReceiverHandshake { ip: advertise_ip }, &cipher)
            .await?;

        // The sender answers only once its payload is prepared and its
        // listener is bound; this wait spans that, hence the long timeout.
        let msg = conn
            .recv_encrypted(
                &cipher,
                &[TransferType::SenderHandshake],
                cfg.peer_wait_timeout,
                "sender handshake",
            )
            .await?;
        let (sender_ip, port, payload_size) = match msg {
            TransferMessage::SenderHandshake {
                ip,
                port,
                payload_size,
            } => (ip, port, payload_size),
            _ => unreachable!("recv_encrypted enforces the expected type"),
        };
        tracing::debug!(%sender_ip, port, payload_size, "transfer handshake received");

        // --- Connectivity probe and route decision -------------------------
        match dial_direct(sender_ip, port, cfg.dial_timeout).await {
            Some(stream) => {
                conn.send_encrypted(&TransferMessage::DirectCommunication, &cipher)
                    .await?;
                conn.recv_encrypted(
                    &cipher,
                    &[TransferType::DirectAck],
                    cfg.read_timeout,
                    "direct acknowledgement",
                )
                .await?;
                // Best-effort: the sender may already have hung up its side.
                if let Err(e) = conn.close().await {
                    tracing::debug!(error = %e, "rendezvous connection close");
                }
                tracing::info!(session_id, "direct route negotiated");
                Ok(ReceiverOutcome {
                    payload_size,
                    route: ReceiverRoute::Direct { stream, cipher },
                })
            }
            None => {
                conn.send_encrypted(&TransferMessage::RelayCommunication, &cipher)
                    .await?;
                conn.recv_encrypted(
                    &cipher,
                    &[TransferType::RelayAck],
                    cfg.read_timeout,
                    "relay acknowledgement",
                )
                .await?;
                tracing::info!(session_id, "relay route negotiated");
                Ok(ReceiverOutcome {
                    payload_size,
                    route: ReceiverRoute::Relay {
                        conduit: conn.into_relay(cipher, cfg.read_timeout),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use std::time::Duration;
    use tokio::io::DuplexStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{accept_async, client_async, WebSocketStream};

    fn test_config() -> RendezvousConfig {
        RendezvousConfig {
            read_timeout: Duration::from_millis(500),
            peer_wait_timeout: Duration::from_millis(500),
            ..Default::default()
        }
    }

    async fn ws_pair() -> (
        SignalingConnection<DuplexStream>,
        WebSocketStream<DuplexStream>,
    ) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (client, server) = tokio::join!(
            client_async("ws://rendezvous.test/establish-receiver", client_io),
            accept_async(server_io),
        );
        (
            SignalingConnection::from_stream(client.unwrap().0, None),
            server.unwrap(),
        )
    }

    #[tokio::test]
    async fn password_without_session_prefix_is_rejected() {
        let (conn, _server) = ws_pair().await;

        let err = Receiver::new(test_config())
            .negotiate(conn, Password::new("apple-river-lagoon"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MalformedPassword));
    }

    #[tokio::test]
    async fn first_inbound_message_must_be_peer_pake() {
        let (conn, mut server) = ws_pair().await;

        // A confused rendezvous sends the salt before any key material.
        let salt = serde_json::to_string(&SignalingMessage::Salt { salt: vec![0; 16] }).unwrap();
        server.send(Message::Text(salt)).await.unwrap();

        let err = Receiver::new(test_config())
            .negotiate(conn, Password::new("7-apple-river"))
            .await
            .unwrap_err();

        match err {
            SessionError::WrongSignalingType { expected, actual } => {
                assert_eq!(expected, vec![SignalingType::PeerPake]);
                assert_eq!(actual, SignalingType::Salt);
            }
            other => panic!("expected WrongSignalingType, got {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_sender_key_material_is_fatal() {
        let (conn, mut server) = ws_pair().await;

        let junk = serde_json::to_string(&SignalingMessage::PeerPake {
            bytes: vec![0xFF; 3],
        })
        .unwrap();
        server.send(Message::Text(junk)).await.unwrap();

        let err = Receiver::new(test_config())
            .negotiate(conn, Password::new("7-apple-river"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Handshake(_)));
    }
}
