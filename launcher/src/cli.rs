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

//! Command-line surface (6.1), parsed with `clap`'s derive API.
//!
//! Every flag here is optional: a bare `telehub --config path.yaml` is the
//! common case, with CLI flags layered on top as overrides (9, "Configuration
//! merge order").

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "telehub", about = "Multi-transport interactive server framework")]
pub struct Cli {
    /// Path to a YAML configuration document.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides `host` for the single-server shorthand.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `port` for the single-server shorthand.
    #[arg(long)]
    pub port: Option<u16>,

    /// Overrides `transport`.
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,

    /// Overrides `ws_path`.
    #[arg(long = "ws-path")]
    pub ws_path: Option<String>,

    /// Overrides `use_ssl` (sets it to `true`).
    #[arg(long = "use-ssl")]
    pub use_ssl: bool,

    /// Overrides `ssl_cert`.
    #[arg(long = "ssl-cert")]
    pub ssl_cert: Option<PathBuf>,

    /// Overrides `ssl_key`.
    #[arg(long = "ssl-key")]
    pub ssl_key: Option<PathBuf>,

    /// Overrides `allow_origins`, comma-separated.
    #[arg(long = "allow-origins", value_delimiter = ',')]
    pub allow_origins: Option<Vec<String>>,

    /// Overrides `max_connections`.
    #[arg(long = "max-connections")]
    pub max_connections: Option<usize>,

    /// Overrides `connection_timeout`, in seconds.
    #[arg(long = "connection-timeout")]
    pub connection_timeout: Option<u64>,

    /// Overrides `log_level`; also accepted via `RUST_LOG`.
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProtocolArg {
    Telnet,
    Tcp,
    Websocket,
    WsTelnet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevelArg {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevelArg::Debug => "debug",
            LogLevelArg::Info => "info",
            LogLevelArg::Warning => "warn",
            LogLevelArg::Error => "error",
        }
    }
}

/// Process exit codes (6.1).
pub mod exit_code {
    pub const CLEAN: i32 = 0;
    pub const CONFIG_ERROR: i32 = 1;
    pub const BIND_FAILURE: i32 = 2;
    pub const INTERRUPTED: i32 = 130;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_config_flag_parses() {
        let cli = Cli::parse_from(["telehub", "--config", "server.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("server.yaml")));
        assert!(cli.port.is_none());
    }

    #[test]
    fn overrides_parse_alongside_config() {
        let cli = Cli::parse_from([
            "telehub",
            "--host",
            "127.0.0.1",
            "--port",
            "2323",
            "--protocol",
            "tcp",
            "--max-connections",
            "5",
            "--allow-origins",
            "https://a.example,https://b.example",
        ]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(2323));
        assert_eq!(cli.protocol, Some(ProtocolArg::Tcp));
        assert_eq!(cli.max_connections, Some(5));
        assert_eq!(
            cli.allow_origins,
            Some(vec!["https://a.example".to_string(), "https://b.example".to_string()])
        );
    }
}
