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

//! YAML configuration (6.2) merged with CLI overrides (6.1) into the typed
//! records the rest of the launcher consumes.
//!
//! The merged record is the only value anything downstream ever observes
//! (9, "Configuration merge order"): CLI overrides YAML, YAML overrides the
//! built-in default, resolved field by field right here.

use crate::cli::{Cli, LogLevelArg, ProtocolArg};
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use telehub_service::{ServerConfig, TransportKind};

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_transport() -> String {
    "telnet".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_connection_timeout() -> u64 {
    300
}
fn default_ws_path() -> String {
    "/ws".to_string()
}
fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_ping_interval() -> u64 {
    30
}
fn default_ping_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_monitor_path() -> String {
    "/monitor".to_string()
}

/// One `servers:` entry, or the whole document for the single-server shorthand.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerDocument {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: Option<u16>,
    #[serde(default = "default_transport")]
    pub transport: String,
    pub handler_class: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,
    #[serde(default)]
    pub use_ssl: bool,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(default)]
    pub enable_monitoring: bool,
    #[serde(default = "default_monitor_path")]
    pub monitor_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerDocument {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            transport: default_transport(),
            handler_class: None,
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            welcome_message: String::new(),
            ws_path: default_ws_path(),
            allow_origins: default_allow_origins(),
            use_ssl: false,
            ssl_cert: None,
            ssl_key: None,
            ping_interval: default_ping_interval(),
            ping_timeout: default_ping_timeout(),
            enable_monitoring: false,
            monitor_path: default_monitor_path(),
            log_level: default_log_level(),
        }
    }
}

/// The top-level document: either a single server, or a `servers:` map.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigDocument {
    #[serde(flatten)]
    pub single: ServerDocument,
    pub servers: Option<HashMap<String, ServerDocument>>,
}

/// One fully validated, typed server configuration, ready to build a
/// `telehub_service::Server` from.
#[derive(Debug, Clone)]
pub struct ResolvedServer {
    pub name: String,
    pub handler_class: String,
    pub config: ServerConfig,
    pub enable_monitoring: bool,
    pub monitor_path: String,
    pub log_level: String,
}

/// Loads `path`, merges in CLI overrides, and validates. Returns one entry
/// per `servers:` block, or exactly one for the single-server shorthand.
pub fn load(cli: &Cli) -> Result<Vec<ResolvedServer>, ConfigError> {
    let document = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            serde_yaml::from_str::<ConfigDocument>(&text)?
        }
        None => ConfigDocument::default(),
    };

    // CLI overrides only apply to the single-server shorthand (8): a
    // `servers:` map has no unambiguous target for a bare `--port`.
    let raw = if let Some(servers) = document.servers {
        servers.into_iter().collect::<Vec<_>>()
    } else {
        let mut doc = document.single;
        apply_cli_overrides(&mut doc, cli);
        vec![("default".to_string(), doc)]
    };

    raw.into_iter()
        .map(|(name, doc)| resolve(name, doc))
        .collect()
}

fn apply_cli_overrides(doc: &mut ServerDocument, cli: &Cli) {
    if let Some(host) = &cli.host {
        doc.host = host.clone();
    }
    if let Some(port) = cli.port {
        doc.port = Some(port);
    }
    if let Some(protocol) = cli.protocol {
        doc.transport = match protocol {
            ProtocolArg::Telnet => "telnet",
            ProtocolArg::Tcp => "tcp",
            ProtocolArg::Websocket => "websocket",
            ProtocolArg::WsTelnet => "ws_telnet",
        }
        .to_string();
    }
    if let Some(ws_path) = &cli.ws_path {
        doc.ws_path = ws_path.clone();
    }
    if cli.use_ssl {
        doc.use_ssl = true;
    }
    if let Some(cert) = &cli.ssl_cert {
        doc.ssl_cert = Some(cert.display().to_string());
    }
    if let Some(key) = &cli.ssl_key {
        doc.ssl_key = Some(key.display().to_string());
    }
    if let Some(origins) = &cli.allow_origins {
        doc.allow_origins = origins.clone();
    }
    if let Some(max) = cli.max_connections {
        doc.max_connections = max;
    }
    if let Some(timeout) = cli.connection_timeout {
        doc.connection_timeout = timeout;
    }
    if let Some(level) = cli.log_level {
        doc.log_level = level.as_directive().to_uppercase();
    }
}

fn resolve(name: String, doc: ServerDocument) -> Result<ResolvedServer, ConfigError> {
    let port = doc.port.ok_or(ConfigError::MissingField("port"))?;
    let handler_class = doc
        .handler_class
        .clone()
        .ok_or(ConfigError::MissingField("handler_class"))?;

    if doc.use_ssl && doc.ssl_cert.is_none() {
        return Err(ConfigError::IncompleteTls("ssl_cert"));
    }
    if doc.use_ssl && doc.ssl_key.is_none() {
        return Err(ConfigError::IncompleteTls("ssl_key"));
    }

    let transport = match doc.transport.as_str() {
        "telnet" => TransportKind::Telnet,
        "tcp" => TransportKind::Tcp,
        "websocket" => TransportKind::WebSocket,
        "ws_telnet" => TransportKind::WsTelnet,
        other => return Err(ConfigError::Invalid(format!("unknown transport `{other}`"))),
    };

    let bind_address = format!("{}:{}", doc.host, port)
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid bind address `{}:{}`", doc.host, port)))?;

    let mut config = ServerConfig::new(bind_address)
        .with_transport(transport)
        .with_max_connections(doc.max_connections)
        .with_connection_timeout(Duration::from_secs(doc.connection_timeout))
        .with_welcome_message(doc.welcome_message)
        .with_ws_path(doc.ws_path)
        .with_allow_origins(doc.allow_origins)
        .with_ping_interval(Duration::from_secs(doc.ping_interval))
        .with_ping_timeout(Duration::from_secs(doc.ping_timeout));
    if let (Some(cert), Some(key)) = (doc.ssl_cert, doc.ssl_key) {
        config = config.with_ssl(cert, key);
    }

    Ok(ResolvedServer {
        name,
        handler_class,
        config,
        enable_monitoring: doc.enable_monitoring,
        monitor_path: doc.monitor_path,
        log_level: doc.log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["telehub"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn missing_port_is_a_config_error() {
        let doc = ServerDocument {
            handler_class: Some("echo".to_string()),
            ..ServerDocument::default()
        };
        let err = resolve("default".to_string(), doc).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("port")));
    }

    #[test]
    fn missing_handler_class_is_a_config_error() {
        let doc = ServerDocument {
            port: Some(2323),
            ..ServerDocument::default()
        };
        let err = resolve("default".to_string(), doc).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("handler_class")));
    }

    #[test]
    fn cli_max_connections_overrides_yaml_default() {
        let mut doc = ServerDocument {
            port: Some(2323),
            handler_class: Some("echo".to_string()),
            max_connections: 100,
            ..ServerDocument::default()
        };
        apply_cli_overrides(&mut doc, &cli(&["--max-connections", "5"]));
        assert_eq!(doc.max_connections, 5);
    }

    #[test]
    fn use_ssl_without_cert_is_rejected() {
        let doc = ServerDocument {
            port: Some(2323),
            handler_class: Some("echo".to_string()),
            use_ssl: true,
            ..ServerDocument::default()
        };
        let err = resolve("default".to_string(), doc).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTls("ssl_cert")));
    }

    #[test]
    fn single_server_shorthand_resolves() {
        let doc = ServerDocument {
            port: Some(2323),
            handler_class: Some("echo".to_string()),
            ..ServerDocument::default()
        };
        let resolved = resolve("default".to_string(), doc).unwrap();
        assert_eq!(resolved.config.bind_address.port(), 2323);
        assert_eq!(resolved.handler_class, "echo");
    }

    #[test]
    fn ping_settings_carry_into_the_resolved_server_config() {
        let doc = ServerDocument {
            port: Some(2323),
            handler_class: Some("echo".to_string()),
            ping_interval: 15,
            ping_timeout: 5,
            ..ServerDocument::default()
        };
        let resolved = resolve("default".to_string(), doc).unwrap();
        assert_eq!(resolved.config.ping_interval, std::time::Duration::from_secs(15));
        assert_eq!(resolved.config.ping_timeout, std::time::Duration::from_secs(5));
    }
}
