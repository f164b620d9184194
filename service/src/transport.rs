//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Byte transport abstraction: one contract, three wires.
//!
//! Telnet-over-TCP uses the same [`Transport::Tcp`] variant as plain TCP —
//! Telnet semantics live entirely in the session's use of
//! [`telehub_telnetcodec`], not in the transport. WebSocket is
//! message-oriented underneath; incoming frames are flattened into the same
//! `read_some` byte contract the TCP variant exposes.

use crate::error::{Result, ServiceError};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// A WebSocket transport plus the heartbeat bookkeeping it owns: interval and
/// timeout live in [`crate::config::ServerConfig`], but the last-ping/pong
/// clock is the transport's own state, not the session loop's.
pub struct WebSocketTransport {
    stream: WebSocketStream<TcpStream>,
    last_pong: Instant,
    ping_outstanding: bool,
}

/// A byte pipe to one connected client, uniform across wire protocols.
pub enum Transport {
    /// Raw TCP, used for both the `tcp` and `telnet` transport kinds.
    Tcp(TcpStream),
    /// WebSocket, used for both the `websocket` and `ws_telnet` transport kinds.
    WebSocket(Box<WebSocketTransport>),
}

impl Transport {
    /// Wraps an accepted WebSocket stream, ready for [`Transport::heartbeat`].
    pub fn websocket(stream: WebSocketStream<TcpStream>) -> Self {
        Transport::WebSocket(Box::new(WebSocketTransport {
            stream,
            last_pong: Instant::now(),
            ping_outstanding: false,
        }))
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        match self {
            Transport::Tcp(stream) => Ok(stream.peer_addr()?),
            Transport::WebSocket(ws) => Ok(ws.stream.get_ref().peer_addr()?),
        }
    }

    /// Read up to `max` bytes. Returns an empty vector on orderly EOF.
    pub async fn read_some(&mut self, max: usize) -> Result<Vec<u8>> {
        match self {
            Transport::Tcp(stream) => {
                let mut buf = vec![0u8; max];
                let n = stream.read(&mut buf).await?;
                buf.truncate(n);
                Ok(buf)
            }
            Transport::WebSocket(ws) => loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                    Some(Ok(Message::Binary(bytes))) => return Ok(bytes.to_vec()),
                    Some(Ok(Message::Pong(_))) => {
                        ws.last_pong = Instant::now();
                        ws.ping_outstanding = false;
                        continue;
                    }
                    Some(Ok(Message::Ping(_))) => continue,
                    Some(Ok(Message::Close(_))) => return Ok(Vec::new()),
                    Some(Ok(Message::Frame(_))) => continue,
                    Some(Err(err)) => {
                        return Err(ServiceError::TransportFault(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            err,
                        )));
                    }
                    None => return Ok(Vec::new()),
                }
            },
        }
    }

    /// Write `bytes` to the client. For WebSocket this packages the whole
    /// slice into a single binary frame.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Transport::Tcp(stream) => {
                stream.write_all(bytes).await?;
                Ok(())
            }
            Transport::WebSocket(ws) => ws
                .stream
                .send(Message::Binary(bytes.to_vec().into()))
                .await
                .map_err(|err| {
                    ServiceError::TransportFault(std::io::Error::new(std::io::ErrorKind::Other, err))
                }),
        }
    }

    /// Idempotent close; safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        match self {
            Transport::Tcp(stream) => {
                let _ = stream.shutdown().await;
                Ok(())
            }
            Transport::WebSocket(ws) => {
                let _ = ws.stream.close(None).await;
                Ok(())
            }
        }
    }

    /// No-op for TCP/Telnet. For WebSocket, sends a ping if the previous one
    /// already got its pong, or fails the transport if `timeout` has elapsed
    /// since a ping went unanswered.
    pub async fn heartbeat(&mut self, timeout: Duration) -> Result<()> {
        let Transport::WebSocket(ws) = self else {
            return Ok(());
        };
        if ws.ping_outstanding && ws.last_pong.elapsed() > timeout {
            return Err(ServiceError::TransportFault(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "missed websocket pong",
            )));
        }
        ws.stream
            .send(Message::Ping(Vec::new().into()))
            .await
            .map_err(|err| ServiceError::TransportFault(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
        ws.ping_outstanding = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn heartbeat_is_a_no_op_for_tcp_transports() {
        let (server, _client) = loopback_pair().await;
        let mut transport = Transport::Tcp(server);
        transport.heartbeat(Duration::from_secs(10)).await.unwrap();
    }

    #[tokio::test]
    async fn tcp_write_then_read_round_trips() {
        let (server, client) = loopback_pair().await;
        let mut server = Transport::Tcp(server);
        let mut client = Transport::Tcp(client);
        server.write_all(b"hello").await.unwrap();
        let received = client.read_some(16).await.unwrap();
        assert_eq!(received, b"hello");
    }
}
