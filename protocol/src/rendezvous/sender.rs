//! # Sender-Side Session Driver
//!
//! Drives a sending peer through the whole rendezvous: bind, password
//! generation, key exchange, salt, transfer handshake, route decision. The
//! flow is strictly sequential on the wire — every step blocks on exactly
//! the message the protocol says comes next — while the local concerns with
//! their own timing (password display, payload preparation, listener
//! bootstrap, relay consumption) are decoupled through one-shot channels.
//!
//! ```text
//!   rendezvous ──Bind──► driver ──password──► display layer
//!                        driver ◄──payload size── payload preparation
//!                        driver ──DirectListener──► listener bootstrap
//!                        driver ──RelayConduit──► bulk transfer (relay path)
//! ```
//!
//! Each channel is a one-shot: a gate that fires once, not shared state.
//! On the direct path the relay channel is *dropped*, and the closed channel
//! is itself the signal that no conduit is coming.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task;

use crate::config::RendezvousConfig;
use crate::crypto::{KeyExchange, PakeError, Password, SessionCipher};
use crate::transport::{PeerRole, RelayConduit, SignalingConnection};
use crate::wire::{SignalingMessage, SignalingType, TransferMessage, TransferType};

use super::error::SessionError;
use super::negotiate::{bind_direct_listener, DirectListener};

/// The one-shot gates connecting the driver to its collaborators.
pub struct SenderChannels<S> {
    /// Delivers the generated password to the display layer the moment it
    /// exists — long before the key exchange completes.
    pub password_tx: oneshot::Sender<Password>,
    /// Delivers the bound direct-transfer listener to whatever will accept
    /// the peer's connection.
    pub listener_tx: oneshot::Sender<DirectListener>,
    /// Fires when the payload is fully prepared, carrying its byte size.
    /// The transfer handshake is not sent until then.
    pub payload_ready_rx: oneshot::Receiver<u64>,
    /// Delivers the repurposed rendezvous connection if the relay route is
    /// chosen. Dropped — closing the channel — if the direct route wins.
    pub relay_tx: oneshot::Sender<RelayConduit<S>>,
}

/// How the negotiation ended on the sender side.
#[derive(Debug)]
pub enum SenderRoute {
    /// The receiver reached the advertised endpoint. The bulk transfer runs
    /// over the accepted TCP connection, sealed with this cipher.
    Direct { cipher: SessionCipher },
    /// Direct connectivity failed; the relay conduit was handed through
    /// [`SenderChannels::relay_tx`].
    Relay,
}

/// A sending peer.
pub struct Sender {
    config: RendezvousConfig,
}

impl Sender {
    pub fn new(config: RendezvousConfig) -> Self {
        Self { config }
    }

    /// Dials the rendezvous service with the sender role.
    pub async fn connect(&self) -> Result<SignalingConnection<TcpStream>, SessionError> {
        SignalingConnection::connect(&self.config, PeerRole::Sender).await
    }

    /// Runs the full sender-side session over an established connection.
    ///
    /// Consumes the connection: on the relay path it is handed onward as a
    /// [`RelayConduit`], on the direct path it is closed. Any protocol
    /// violation, timeout, or crypto failure aborts the session — the
    /// caller gets the error, never a half-negotiated channel.
    pub async fn negotiate<S>(
        &self,
        mut conn: SignalingConnection<S>,
        channels: SenderChannels<S>,
    ) -> Result<SenderRoute, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let SenderChannels {
            password_tx,
            listener_tx,
            payload_ready_rx,
            relay_tx,
        } = channels;
        let cfg = &self.config;

        // --- Bind: the rendezvous assigns the session id -------------------
        let msg = conn
            .recv_signaling(&[SignalingType::Bind], cfg.read_timeout, "session bind")
            .await?;
        let session_id = match msg {
            SignalingMessage::Bind { session_id } => session_id,
            _ => unreachable!("recv_signaling enforces the expected type"),
        };
        tracing::info!(session_id, "rendezvous session bound");

        // --- Establish: register the password digest -----------------------
        let password = Password::generate(session_id);
        conn.send_signaling(&SignalingMessage::Establish {
            session_id,
            digest: password.digest(),
        })
        .await?;

        // The display layer gets the password immediately; the other human
        // may take minutes to type it in. A dropped display is not fatal.
        let _ = password_tx.send(password.clone());

        // --- Key exchange, overlapped with waiting for the peer ------------
        // The curve math is CPU-bound for seconds; it runs on a blocking
        // thread while this task sits in the (long) wait for `Ready`.
        let exchange_task = task::spawn_blocking(move || KeyExchange::initiate(&password));

        conn.recv_signaling(&[SignalingType::Ready], cfg.peer_wait_timeout, "peer arrival")
            .await?;

        let mut exchange = exchange_task
            .await
            .map_err(|e| SessionError::Resource(format!("key-exchange task failed: {e}")))?;

        conn.send_signaling(&SignalingMessage::Pake {
            bytes: exchange.outbound_bytes().to_vec(),
        })
        .await?;

        let msg = conn
            .recv_signaling(
                &[SignalingType::PeerPake],
                cfg.read_timeout,
                "peer key material",
            )
            .await?;
        let peer_bytes = match msg {
            SignalingMessage::PeerPake { bytes } => bytes,
            _ => unreachable!("recv_signaling enforces the expected type"),
        };

        let exchange = task::spawn_blocking(move || -> Result<KeyExchange, PakeError> {
            exchange.absorb(&peer_bytes)?;
            Ok(exchange)
        })
        .await
        .map_err(|e| SessionError::Resource(format!("key-exchange task failed: {e}")))??;

        let session_key = exchange.session_key()?;

        // --- Salt: the last plaintext message of the session ---------------
        let cipher = SessionCipher::new(&session_key);
        conn.send_signaling(&SignalingMessage::Salt {
            salt: cipher.salt().to_vec(),
        })
        .await?;
        tracing::info!(session_id, "encrypted channel established");

        // --- Transfer handshake --------------------------------------------
        let msg = conn
            .recv_encrypted(
                &cipher,
                &[TransferType::ReceiverHandshake],
                cfg.read_timeout,
                "receiver handshake",
            )
            .await?;
        let receiver_ip = match msg {
            TransferMessage::ReceiverHandshake { ip } => ip,
            _ => unreachable!("recv_encrypted enforces the expected type"),
        };

        // Payload-ready gate: the handshake promises a byte size, so nothing
        // is sent until payload preparation reports one.
        let payload_size = payload_ready_rx
            .await
            .map_err(|_| SessionError::Resource("payload preparation abandoned".into()))?;

        // Bind before advertising; hand the live listener onward.
        let direct = bind_direct_listener(receiver_ip).await?;
        let port = direct.options.port;

        let advertise_ip = cfg
            .advertise_ip
            .or_else(|| conn.local_ip())
            .ok_or_else(|| SessionError::Resource("no advertisable local address".into()))?;

        listener_tx
            .send(direct)
            .map_err(|_| SessionError::Resource("listener bootstrapper abandoned".into()))?;

        conn.send_encrypted(
            &TransferMessage::SenderHandshake {
                ip: advertise_ip,
                port,
                payload_size,
            },
            &cipher,
        )
        .await?;
        tracing::debug!(%advertise_ip, port, payload_size, "transfer handshake sent");

        // --- Route decision ------------------------------------------------
        let decision = conn
            .recv_encrypted(
                &cipher,
                &[
                    TransferType::DirectCommunication,
                    TransferType::RelayCommunication,
                ],
                cfg.read_timeout,
                "route decision",
            )
            .await?;

        match decision {
            TransferMessage::DirectCommunication => {
                conn.send_encrypted(&TransferMessage::DirectAck, &cipher).await?;
                // Dropping the sender closes the relay channel — that *is*
                // the "no conduit is coming" signal to the bulk transfer.
                drop(relay_tx);
                // Best-effort: the peer may already have hung up its side.
                if let Err(e) = conn.close().await {
                    tracing::debug!(error = %e, "rendezvous connection close");
                }
                tracing::info!(session_id, "direct route negotiated");
                Ok(SenderRoute::Direct { cipher })
            }
            TransferMessage::RelayCommunication => {
                conn.send_encrypted(&TransferMessage::RelayAck, &cipher).await?;
                let conduit = conn.into_relay(cipher, cfg.read_timeout);
                relay_tx
                    .send(conduit)
                    .map_err(|_| SessionError::Resource("relay consumer abandoned".into()))?;
                tracing::info!(session_id, "relay route negotiated");
                Ok(SenderRoute::Relay)
            }
            _ => unreachable!("recv_encrypted enforces the expected set"),
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
            client_async("ws://rendezvous.test/establish-sender", client_io),
            accept_async(server_io),
        );
        (
            SignalingConnection::from_stream(client.unwrap().0, None),
            server.unwrap(),
        )
    }

    fn channels() -> (
        SenderChannels<DuplexStream>,
        oneshot::Receiver<Password>,
        oneshot::Receiver<DirectListener>,
        oneshot::Sender<u64>,
        oneshot::Receiver<RelayConduit<DuplexStream>>,
    ) {
        let (password_tx, password_rx) = oneshot::channel();
        let (listener_tx, listener_rx) = oneshot::channel();
        let (payload_tx, payload_ready_rx) = oneshot::channel();
        let (relay_tx, relay_rx) = oneshot::channel();
        (
            SenderChannels {
                password_tx,
                listener_tx,
                payload_ready_rx,
                relay_tx,
            },
            password_rx,
            listener_rx,
            payload_tx,
            relay_rx,
        )
    }

    #[tokio::test]
    async fn first_message_must_be_bind() {
        let (conn, mut server) = ws_pair().await;
        let (channels, _password_rx, _listener_rx, _payload_tx, _relay_rx) = channels();

        // A rendezvous that skips Bind and goes straight to Ready.
        let ready = serde_json::to_string(&SignalingMessage::Ready).unwrap();
        server.send(Message::Text(ready)).await.unwrap();

        let err = Sender::new(test_config())
            .negotiate(conn, channels)
            .await
            .unwrap_err();

        match err {
            SessionError::WrongSignalingType { expected, actual } => {
                assert_eq!(expected, vec![SignalingType::Bind]);
                assert_eq!(actual, SignalingType::Ready);
            }
            other => panic!("expected WrongSignalingType, got {other}"),
        }
    }

    #[tokio::test]
    async fn password_reaches_the_display_before_the_peer_arrives() {
        let (conn, mut server) = ws_pair().await;
        let (channels, password_rx, _listener_rx, _payload_tx, _relay_rx) = channels();

        let bind = serde_json::to_string(&SignalingMessage::Bind { session_id: 42 }).unwrap();
        server.send(Message::Text(bind)).await.unwrap();

        let driver = tokio::spawn(async move {
            Sender::new(test_config()).negotiate(conn, channels).await
        });

        // No `Ready` is ever sent, yet the password must arrive.
        let password = password_rx.await.expect("password delivered");
        assert_eq!(password.session_id(), Some(42));

        // The driver then dies waiting for the peer — on the timeout, not
        // on anything password-related.
        let err = driver.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Timeout {
                waiting_for: "peer arrival"
            }
        ));
    }

    #[tokio::test]
    async fn establish_echoes_the_bound_session_id() {
        let (conn, mut server) = ws_pair().await;
        let (channels, _password_rx, _listener_rx, _payload_tx, _relay_rx) = channels();

        let bind = serde_json::to_string(&SignalingMessage::Bind { session_id: 7 }).unwrap();
        server.send(Message::Text(bind)).await.unwrap();

        let driver = tokio::spawn(async move {
            Sender::new(test_config()).negotiate(conn, channels).await
        });

        let frame = futures::StreamExt::next(&mut server).await.unwrap().unwrap();
        let msg: SignalingMessage = match frame {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        };
        match msg {
            SignalingMessage::Establish { session_id, digest } => {
                assert_eq!(session_id, 7);
                assert_eq!(digest.len(), 64);
            }
            other => panic!("expected Establish, got {other:?}"),
        }

        let _ = driver.await;
    }
}
