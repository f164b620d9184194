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

//! Per-server runtime configuration.
//!
//! This is the typed record a [`crate::server::Server`] is built from. The
//! launcher crate is responsible for turning YAML + CLI flags into one of
//! these per configured transport; this type only knows how to validate and
//! default itself.

use crate::types::TransportKind;
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime configuration for a single [`crate::server::Server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    pub bind_address: SocketAddr,
    /// Which wire protocol this server speaks.
    pub transport: TransportKind,
    /// Upper bound on live sessions.
    pub max_connections: usize,
    /// Seconds of inactivity before a session is terminated as idle.
    pub connection_timeout: Duration,
    /// Message written immediately on connect, before negotiation. Empty = none.
    pub welcome_message: String,
    /// Prompt written after each dispatched line.
    pub prompt: String,
    /// WebSocket endpoint path (WebSocket/ws_telnet transports only).
    pub ws_path: String,
    /// Origins allowed to open a WebSocket session; `"*"` matches any.
    pub allow_origins: Vec<String>,
    /// Enable the pluggable TLS hook before handing a stream to the accept loop.
    pub use_ssl: bool,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
    /// WebSocket heartbeat interval.
    pub ping_interval: Duration,
    /// WebSocket heartbeat pong deadline.
    pub ping_timeout: Duration,
    /// Deadline for draining sessions on graceful shutdown.
    pub shutdown_drain: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:0".parse().expect("static address parses"),
            transport: TransportKind::Telnet,
            max_connections: 100,
            connection_timeout: Duration::from_secs(300),
            welcome_message: String::new(),
            prompt: "> ".to_string(),
            ws_path: "/ws".to_string(),
            allow_origins: vec!["*".to_string()],
            use_ssl: false,
            ssl_cert: None,
            ssl_key: None,
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(10),
            shutdown_drain: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }

    pub fn with_allow_origins(mut self, origins: Vec<String>) -> Self {
        self.allow_origins = origins;
        self
    }

    pub fn with_ssl(mut self, cert: impl Into<String>, key: impl Into<String>) -> Self {
        self.use_ssl = true;
        self.ssl_cert = Some(cert.into());
        self.ssl_key = Some(key.into());
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Whether `origin` is allowed to open a WebSocket session.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allow_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.connection_timeout, Duration::from_secs(300));
        assert_eq!(config.ws_path, "/ws");
        assert_eq!(config.allow_origins, vec!["*".to_string()]);
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.ping_timeout, Duration::from_secs(10));
    }

    #[test]
    fn wildcard_origin_allows_anything() {
        let config = ServerConfig::default();
        assert!(config.origin_allowed("https://example.com"));
    }

    #[test]
    fn explicit_allowlist_rejects_unknown_origin() {
        let config =
            ServerConfig::default().with_allow_origins(vec!["https://trusted.example".into()]);
        assert!(config.origin_allowed("https://trusted.example"));
        assert!(!config.origin_allowed("https://evil.example"));
    }
}
