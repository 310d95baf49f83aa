//! # The Rendezvous Transport
//!
//! One persistent websocket to the introducer service carries the entire
//! session: first the plaintext signaling envelopes (text frames), then —
//! once both sides hold the session cipher — opaque ciphertext (binary
//! frames). [`SignalingConnection`] enforces the discipline the protocol
//! depends on:
//!
//! - every read is bounded by a caller-supplied timeout, and expiry is as
//!   fatal as any other protocol error;
//! - every read names the message types that are legal at this step, and
//!   anything else aborts the session with the full expected/actual detail;
//! - the text/binary frame split mirrors the plaintext/ciphertext split, so
//!   a frame of the wrong kind is rejected before a byte of it is parsed.
//!
//! When the peers settle on the relay path, [`into_relay`] consumes the
//! connection and returns a [`RelayConduit`] — the same socket, demoted to
//! an encrypted duplex pipe. The signaling methods are gone from the type;
//! ownership has transferred and there is no way to sneak another signaling
//! message onto a repurposed transport.
//!
//! The connection is generic over its underlying IO so the whole protocol
//! can be exercised in-process over [`tokio::io::duplex`] pairs.
//!
//! [`into_relay`]: SignalingConnection::into_relay

use std::net::IpAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{client_async, WebSocketStream};

use crate::config::{RendezvousConfig, RECEIVER_ENDPOINT, SENDER_ENDPOINT};
use crate::crypto::SessionCipher;
use crate::rendezvous::error::SessionError;
use crate::wire::{SignalingMessage, SignalingType, TransferMessage, TransferType};

/// Which side of the transfer a peer is playing. Decides the rendezvous
/// endpoint it dials; everything after the salt exchange is symmetric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerRole {
    Sender,
    Receiver,
}

impl PeerRole {
    fn endpoint(self) -> &'static str {
        match self {
            PeerRole::Sender => SENDER_ENDPOINT,
            PeerRole::Receiver => RECEIVER_ENDPOINT,
        }
    }
}

/// A live websocket session with the rendezvous service.
pub struct SignalingConnection<S> {
    ws: WebSocketStream<S>,
    local_ip: Option<IpAddr>,
}

impl SignalingConnection<TcpStream> {
    /// Dials the rendezvous service for the given role.
    ///
    /// The TCP connection is made first so the local address — the one the
    /// peer will be told to expect direct traffic from — can be captured
    /// before the websocket handshake consumes the stream.
    pub async fn connect(
        config: &RendezvousConfig,
        role: PeerRole,
    ) -> Result<Self, SessionError> {
        let url = config.url(role.endpoint());

        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(WsError::from)?;
        let local_ip = stream.local_addr().ok().map(|addr| addr.ip());

        let (ws, _response) = client_async(url.as_str(), stream).await?;
        tracing::debug!(%url, ?role, "rendezvous connection established");

        Ok(Self { ws, local_ip })
    }
}

impl<S> SignalingConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-established websocket. This is how tests (and any
    /// embedder that manages its own sockets) drive the protocol.
    pub fn from_stream(ws: WebSocketStream<S>, local_ip: Option<IpAddr>) -> Self {
        Self { ws, local_ip }
    }

    /// The local IP of the underlying socket, if known. Used as the default
    /// advertised address for the direct-transfer endpoint.
    pub fn local_ip(&self) -> Option<IpAddr> {
        self.local_ip
    }

    /// Sends one plaintext signaling envelope as a text frame.
    pub async fn send_signaling(&mut self, msg: &SignalingMessage) -> Result<(), SessionError> {
        let text = serde_json::to_string(msg)?;
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Receives the next signaling envelope, requiring its type to be in
    /// `expected`.
    ///
    /// `waiting_for` is a human label for the step, used in timeout errors
    /// and logs. Any of: timeout, closed connection, binary frame, parse
    /// failure, or an unexpected message type is fatal.
    pub async fn recv_signaling(
        &mut self,
        expected: &[SignalingType],
        deadline: Duration,
        waiting_for: &'static str,
    ) -> Result<SignalingMessage, SessionError> {
        let frame = self.next_frame(deadline, waiting_for).await?;
        let text = match frame {
            Message::Text(text) => text,
            _ => return Err(SessionError::UnexpectedFrame { expected: "text" }),
        };

        let msg: SignalingMessage = serde_json::from_str(&text)?;
        if !expected.contains(&msg.message_type()) {
            return Err(SessionError::WrongSignalingType {
                expected: expected.to_vec(),
                actual: msg.message_type(),
            });
        }

        tracing::trace!(message_type = %msg.message_type(), "signaling message received");
        Ok(msg)
    }

    /// Seals one transfer envelope with the session cipher and sends it as
    /// a binary frame.
    pub async fn send_encrypted(
        &mut self,
        msg: &TransferMessage,
        cipher: &SessionCipher,
    ) -> Result<(), SessionError> {
        let plain = serde_json::to_vec(msg)?;
        let sealed = cipher.encrypt(&plain)?;
        self.ws.send(Message::Binary(sealed)).await?;
        Ok(())
    }

    /// Receives, decrypts, and type-checks the next transfer envelope.
    ///
    /// A text frame here means the peer is still speaking plaintext after
    /// the salt exchange — a protocol violation, not a parsing problem.
    pub async fn recv_encrypted(
        &mut self,
        cipher: &SessionCipher,
        expected: &[TransferType],
        deadline: Duration,
        waiting_for: &'static str,
    ) -> Result<TransferMessage, SessionError> {
        let frame = self.next_frame(deadline, waiting_for).await?;
        let sealed = match frame {
            Message::Binary(sealed) => sealed,
            _ => return Err(SessionError::UnexpectedFrame { expected: "binary" }),
        };

        let plain = cipher.decrypt(&sealed)?;
        let msg: TransferMessage = serde_json::from_slice(&plain)?;
        if !expected.contains(&msg.message_type()) {
            return Err(SessionError::WrongTransferType {
                expected: expected.to_vec(),
                actual: msg.message_type(),
            });
        }

        tracing::trace!(message_type = %msg.message_type(), "transfer message received");
        Ok(msg)
    }

    /// Repurposes the connection as a relay conduit for the bulk transfer.
    ///
    /// Consumes the signaling surface entirely; from here on the socket is
    /// an encrypted byte pipe owned by whoever holds the conduit.
    pub fn into_relay(self, cipher: SessionCipher, read_timeout: Duration) -> RelayConduit<S> {
        RelayConduit {
            ws: self.ws,
            cipher,
            read_timeout,
        }
    }

    /// Closes the websocket gracefully. Used on the direct path, where the
    /// rendezvous connection has nothing left to carry.
    pub async fn close(mut self) -> Result<(), SessionError> {
        self.ws.close(None).await?;
        Ok(())
    }

    /// Next data frame, skipping keepalive noise; bounded by `deadline`.
    async fn next_frame(
        &mut self,
        deadline: Duration,
        waiting_for: &'static str,
    ) -> Result<Message, SessionError> {
        let read = async {
            loop {
                match self.ws.next().await {
                    None => return Err(SessionError::ConnectionClosed),
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) => return Err(SessionError::ConnectionClosed),
                    Some(Ok(frame)) => return Ok(frame),
                }
            }
        };

        tokio::time::timeout(deadline, read)
            .await
            .map_err(|_| SessionError::Timeout { waiting_for })?
    }
}

/// The signaling transport after relay handoff: an encrypted, bidirectional
/// byte pipe riding the original rendezvous websocket.
///
/// Owns the session cipher; every frame in either direction is sealed. The
/// bulk-transfer component can push raw payload chunks with
/// [`send_frame`](Self::send_frame) or typed transfer messages with
/// [`send_message`](Self::send_message).
pub struct RelayConduit<S> {
    ws: WebSocketStream<S>,
    cipher: SessionCipher,
    read_timeout: Duration,
}

impl<S> RelayConduit<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Seals and sends one frame of payload bytes.
    pub async fn send_frame(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let sealed = self.cipher.encrypt(payload)?;
        self.ws.send(Message::Binary(sealed)).await?;
        Ok(())
    }

    /// Receives and opens one frame of payload bytes.
    pub async fn recv_frame(&mut self) -> Result<Vec<u8>, SessionError> {
        let read = async {
            loop {
                match self.ws.next().await {
                    None => return Err(SessionError::ConnectionClosed),
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) => return Err(SessionError::ConnectionClosed),
                    Some(Ok(Message::Binary(sealed))) => return Ok(sealed),
                    Some(Ok(_)) => {
                        return Err(SessionError::UnexpectedFrame { expected: "binary" })
                    }
                }
            }
        };

        let sealed = tokio::time::timeout(self.read_timeout, read)
            .await
            .map_err(|_| SessionError::Timeout {
                waiting_for: "relayed frame",
            })??;

        Ok(self.cipher.decrypt(&sealed)?)
    }

    /// Sends one typed transfer message through the conduit.
    pub async fn send_message(&mut self, msg: &TransferMessage) -> Result<(), SessionError> {
        let plain = serde_json::to_vec(msg)?;
        self.send_frame(&plain).await
    }

    /// Receives one typed transfer message through the conduit.
    pub async fn recv_message(&mut self) -> Result<TransferMessage, SessionError> {
        let plain = self.recv_frame().await?;
        Ok(serde_json::from_slice(&plain)?)
    }

    /// Closes the conduit gracefully.
    pub async fn close(mut self) -> Result<(), SessionError> {
        self.ws.close(None).await?;
        Ok(())
    }
}

// The conduit wraps live key material; there is nothing useful to print.
impl<S> std::fmt::Debug for RelayConduit<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RelayConduit(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::pake::SessionKey;
    use tokio::io::DuplexStream;
    use tokio_tungstenite::accept_async;

    const STEP: Duration = Duration::from_secs(1);

    /// A connected (client connection, raw server websocket) pair over an
    /// in-memory duplex pipe.
    async fn ws_pair() -> (
        SignalingConnection<DuplexStream>,
        WebSocketStream<DuplexStream>,
    ) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (client, server) = tokio::join!(
            client_async("ws://rendezvous.test/establish-sender", client_io),
            accept_async(server_io),
        );
        let (ws, _response) = client.expect("client handshake");
        let conn = SignalingConnection::from_stream(ws, None);
        (conn, server.expect("server handshake"))
    }

    fn test_cipher() -> SessionCipher {
        SessionCipher::new(&SessionKey::from_bytes(vec![9u8; 32]))
    }

    #[tokio::test]
    async fn signaling_messages_travel_as_text_frames() {
        let (mut conn, mut server) = ws_pair().await;

        conn.send_signaling(&SignalingMessage::Establish {
            session_id: 7,
            digest: "cafe".into(),
        })
        .await
        .unwrap();

        match server.next().await.unwrap().unwrap() {
            Message::Text(text) => {
                let msg: SignalingMessage = serde_json::from_str(&text).unwrap();
                assert_eq!(
                    msg,
                    SignalingMessage::Establish {
                        session_id: 7,
                        digest: "cafe".into()
                    }
                );
            }
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn recv_signaling_accepts_the_expected_type() {
        let (mut conn, mut server) = ws_pair().await;

        let bind = serde_json::to_string(&SignalingMessage::Bind { session_id: 42 }).unwrap();
        server.send(Message::Text(bind)).await.unwrap();

        let msg = conn
            .recv_signaling(&[SignalingType::Bind], STEP, "session bind")
            .await
            .unwrap();
        assert_eq!(msg, SignalingMessage::Bind { session_id: 42 });
    }

    #[tokio::test]
    async fn recv_signaling_rejects_unexpected_types_with_detail() {
        let (mut conn, mut server) = ws_pair().await;

        let ready = serde_json::to_string(&SignalingMessage::Ready).unwrap();
        server.send(Message::Text(ready)).await.unwrap();

        let err = conn
            .recv_signaling(&[SignalingType::Bind], STEP, "session bind")
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
    async fn recv_signaling_rejects_binary_frames() {
        let (mut conn, mut server) = ws_pair().await;

        server.send(Message::Binary(vec![1, 2, 3])).await.unwrap();

        let err = conn
            .recv_signaling(&[SignalingType::Ready], STEP, "peer arrival")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnexpectedFrame { expected: "text" }
        ));
    }

    #[tokio::test]
    async fn recv_signaling_times_out() {
        let (mut conn, _server) = ws_pair().await;

        let err = conn
            .recv_signaling(
                &[SignalingType::Ready],
                Duration::from_millis(50),
                "peer arrival",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Timeout {
                waiting_for: "peer arrival"
            }
        ));
    }

    #[tokio::test]
    async fn clean_close_maps_to_connection_closed() {
        let (mut conn, mut server) = ws_pair().await;

        server.close(None).await.unwrap();

        let err = conn
            .recv_signaling(&[SignalingType::Ready], STEP, "peer arrival")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ConnectionClosed));
    }

    #[tokio::test]
    async fn encrypted_messages_travel_as_sealed_binary_frames() {
        let (mut conn, mut server) = ws_pair().await;
        let cipher = test_cipher();

        conn.send_encrypted(&TransferMessage::DirectCommunication, &cipher)
            .await
            .unwrap();

        match server.next().await.unwrap().unwrap() {
            Message::Binary(sealed) => {
                // Opaque on the wire...
                assert!(serde_json::from_slice::<TransferMessage>(&sealed).is_err());
                // ...and exactly the message once opened.
                let plain = cipher.decrypt(&sealed).unwrap();
                let msg: TransferMessage = serde_json::from_slice(&plain).unwrap();
                assert_eq!(msg, TransferMessage::DirectCommunication);
            }
            other => panic!("expected a binary frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn recv_encrypted_round_trip_and_type_check() {
        let (mut conn, mut server) = ws_pair().await;
        let cipher = test_cipher();

        let plain =
            serde_json::to_vec(&TransferMessage::RelayCommunication).unwrap();
        let sealed = cipher.encrypt(&plain).unwrap();
        server.send(Message::Binary(sealed)).await.unwrap();

        let err = conn
            .recv_encrypted(
                &cipher,
                &[TransferType::DirectCommunication],
                STEP,
                "route decision",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::WrongTransferType { .. }));
    }

    #[tokio::test]
    async fn recv_encrypted_rejects_text_frames() {
        let (mut conn, mut server) = ws_pair().await;

        server
            .send(Message::Text("still plaintext".into()))
            .await
            .unwrap();

        let err = conn
            .recv_encrypted(
                &test_cipher(),
                &[TransferType::ReceiverHandshake],
                STEP,
                "receiver handshake",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnexpectedFrame { expected: "binary" }
        ));
    }

    #[tokio::test]
    async fn relay_conduit_round_trips_frames_and_messages() {
        let (conn, mut server) = ws_pair().await;
        let cipher = test_cipher();
        let mut conduit = conn.into_relay(cipher.clone(), STEP);

        conduit.send_frame(b"chunk-0").await.unwrap();
        match server.next().await.unwrap().unwrap() {
            Message::Binary(sealed) => {
                assert_eq!(cipher.decrypt(&sealed).unwrap(), b"chunk-0");
            }
            other => panic!("expected a binary frame, got {other:?}"),
        }

        let plain = serde_json::to_vec(&TransferMessage::RelayAck).unwrap();
        let sealed = cipher.encrypt(&plain).unwrap();
        server.send(Message::Binary(sealed)).await.unwrap();
        assert_eq!(
            conduit.recv_message().await.unwrap(),
            TransferMessage::RelayAck
        );
    }
}
