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

//! Single-transport acceptor.
//!
//! One [`Server`] owns one listening socket and one [`Registry`]. The
//! supervisor (`crate::supervisor`) drives one or more of these in parallel.

use crate::config::ServerConfig;
use crate::error::{Result, ServiceError};
use crate::handler::HandlerFactory;
use crate::metrics::{MetricsSnapshot, ServerMetrics};
use crate::registry::Registry;
use crate::session::{self, SessionEvent};
use crate::transport::Transport;
use crate::types::{ServerSnapshot, SessionInfo, SessionState, TransportKind};
use metrics::gauge;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing::{info, instrument, warn};

const BUSY_MESSAGE: &[u8] = b"Server busy. Try again later.\r\n";
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One per configured transport. Bind, accept, and drain one listener.
pub struct Server {
    config: Arc<ServerConfig>,
    handler_factory: HandlerFactory,
    registry: Arc<Registry>,
    shutdown_notify: Arc<Notify>,
    accepting: AtomicBool,
    monitor: Option<mpsc::UnboundedSender<SessionEvent>>,
    metrics: Arc<ServerMetrics>,
    started_at: Instant,
}

impl Server {
    pub fn new(config: ServerConfig, handler_factory: HandlerFactory) -> Self {
        Self {
            config: Arc::new(config),
            handler_factory,
            registry: Arc::new(Registry::new()),
            shutdown_notify: Arc::new(Notify::new()),
            accepting: AtomicBool::new(true),
            monitor: None,
            metrics: Arc::new(ServerMetrics::new()),
            started_at: Instant::now(),
        }
    }

    /// Attach a channel session start/end events are forwarded to (the
    /// monitor bus). Optional: servers run fine without one.
    pub fn with_monitor(mut self, monitor: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.config.bind_address
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.registry.snapshot()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn server_snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            active_sessions: self.registry.len(),
            total_sessions: self.registry.total_started(),
            bind_address: self.config.bind_address,
            uptime: self.started_at.elapsed(),
            started_at: self.started_at,
        }
    }

    /// Binds the listener and runs the accept loop until `shutdown` is
    /// called. Returns once every live session has drained.
    #[instrument(skip(self), fields(addr = %self.config.bind_address, transport = %self.config.transport))]
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(ServiceError::TransportFault)?;
        info!("listening");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_notify.notified() => {
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer_addr) = accepted.map_err(ServiceError::TransportFault)?;
                    if !self.accepting.load(Ordering::Acquire) {
                        continue;
                    }
                    self.clone().spawn_session(stream, peer_addr);
                }
            }
        }

        self.drain().await;
        Ok(())
    }

    fn spawn_session(self: Arc<Self>, stream: TcpStream, peer_addr: SocketAddr) {
        tokio::spawn(async move {
            if self.registry.len() >= self.config.max_connections {
                self.metrics.record_error("overcapacity_errors");
                warn!(%peer_addr, "rejecting connection: at capacity");
                let mut stream = stream;
                let _ = stream.write_all(BUSY_MESSAGE).await;
                let _ = stream.shutdown().await;
                return;
            }

            let transport = match self.accept_transport(stream).await {
                Ok(transport) => transport,
                Err(err) => {
                    warn!(%peer_addr, error = %err, "transport setup failed");
                    return;
                }
            };

            let id = self.registry.next_id();
            let cancel = Arc::new(Notify::new());
            let handler = (self.handler_factory)();
            let created_at = Instant::now();
            let info = SessionInfo {
                id,
                transport: self.config.transport,
                state: SessionState::Opening,
                peer_addr,
                created_at,
                created_at_unix_ms: crate::types::now_unix_millis(),
                last_activity: created_at,
                is_newest: true,
                bytes_sent: 0,
                bytes_received: 0,
            };
            self.registry.insert(id, cancel.clone(), info.clone());
            self.metrics.record_session_started();
            gauge!("active_sessions").set(self.registry.len() as f64);
            if let Some(monitor) = &self.monitor {
                let _ = monitor.send(SessionEvent::Started(info));
            }

            let registry = self.registry.clone();
            let config = self.config.clone();
            let transport_kind = self.config.transport;
            let monitor = self.monitor.clone();
            let metrics = self.metrics.clone();

            let result = session::run(
                id,
                peer_addr,
                transport_kind,
                transport,
                config,
                handler,
                cancel,
                registry.clone(),
                move |event| {
                    if let Some(tx) = &monitor {
                        let _ = tx.send(event);
                    }
                },
            )
            .await;

            if let Err(err) = &result {
                metrics.record_error(err.metric_name());
                warn!(session = %id, error = %err, "session ended with error");
            }
            metrics.record_session_ended(created_at.elapsed());
            registry.remove(id);
            gauge!("active_sessions").set(registry.len() as f64);
        });
    }

    async fn accept_transport(&self, stream: TcpStream) -> Result<Transport> {
        match self.config.transport {
            TransportKind::Tcp | TransportKind::Telnet => Ok(Transport::Tcp(stream)),
            TransportKind::WebSocket | TransportKind::WsTelnet => {
                let config = self.config.clone();
                let check_origin = move |request: &Request, response: Response| {
                    let origin = request
                        .headers()
                        .get(http::header::ORIGIN)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("");
                    if config.origin_allowed(origin) {
                        Ok(response)
                    } else {
                        let mut rejection = ErrorResponse::new(Some("origin not allowed".to_string()));
                        *rejection.status_mut() = http::StatusCode::FORBIDDEN;
                        Err(rejection)
                    }
                };
                let ws = tokio_tungstenite::accept_hdr_async(stream, check_origin)
                    .await
                    .map_err(|err| {
                        ServiceError::TransportFault(std::io::Error::new(std::io::ErrorKind::Other, err))
                    })?;
                Ok(Transport::websocket(ws))
            }
        }
    }

    /// Stop accepting and cancel every live session, waiting up to
    /// `shutdown_drain` for them to reach `Closed`. Idempotent.
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        self.shutdown_notify.notify_one();
        self.drain().await;
    }

    async fn drain(&self) {
        self.registry.cancel_all();
        let deadline = Instant::now() + self.config.shutdown_drain;
        while !self.registry.is_empty() && Instant::now() < deadline {
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
        if !self.registry.is_empty() {
            warn!(
                stragglers = self.registry.len(),
                "shutdown drain deadline exceeded, abandoning remaining sessions"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ServerHandler;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl ServerHandler for NoopHandler {}

    fn factory() -> HandlerFactory {
        Arc::new(|| Arc::new(NoopHandler) as Arc<dyn ServerHandler>)
    }

    #[test]
    fn new_server_snapshot_reports_zero_sessions() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = Server::new(config, factory());
        let snapshot = server.server_snapshot();
        assert_eq!(snapshot.active_sessions, 0);
        assert_eq!(snapshot.total_sessions, 0);
    }

    #[test]
    fn new_server_starts_with_an_empty_registry() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = Server::new(config, factory());
        assert_eq!(server.registry().len(), 0);
    }

    #[tokio::test]
    async fn shutdown_on_empty_server_returns_immediately() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
            .with_connection_timeout(Duration::from_secs(1));
        let server = Server::new(config, factory());
        let started = Instant::now();
        server.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
