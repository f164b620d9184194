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

//! Wires configuration to running servers (9, "Process-wide monitor singleton").

use crate::bridge;
use crate::cli::Cli;
use crate::config::{self, ResolvedServer};
use crate::error::{ConfigError, LauncherError};
use crate::handlers::default_registry;
use std::sync::Arc;
use telehub_monitor::MonitorBus;
use telehub_service::{HandlerFactory, Server, Supervisor};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the tracing subscriber using `level` if set, falling back to
/// `RUST_LOG`, falling back to `info`.
pub fn install_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Builds every configured server, wires the monitor bus if any server
/// requests it, and runs the supervisor to completion.
pub async fn run(cli: &Cli) -> Result<(), LauncherError> {
    let resolved = config::load(cli)?;
    let registry = default_registry();
    let monitor_bind = resolved
        .iter()
        .find(|server| server.enable_monitoring)
        .map(|server| {
            let mut addr = server.config.bind_address;
            addr.set_port(addr.port() + 1);
            addr
        });

    let bus = monitor_bind.map(|_| Arc::new(MonitorBus::default()));

    let mut servers = Vec::with_capacity(resolved.len());
    for entry in &resolved {
        servers.push(build_server(entry, &registry, bus.as_ref())?);
    }

    if let (Some(addr), Some(bus)) = (monitor_bind, &bus) {
        let bus = bus.clone();
        tokio::spawn(async move {
            if let Err(err) = telehub_monitor::serve(bus, addr).await {
                tracing::error!(error = %err, "monitor endpoint stopped");
            }
        });
        info!(%addr, "monitor endpoint scheduled");
    }

    let supervisor = Supervisor::new(servers);
    supervisor.run_until_shutdown().await?;
    Ok(())
}

fn build_server(
    entry: &ResolvedServer,
    registry: &std::collections::HashMap<String, HandlerFactory>,
    bus: Option<&Arc<MonitorBus>>,
) -> Result<Arc<Server>, LauncherError> {
    let factory = registry
        .get(&entry.handler_class)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownHandler(entry.handler_class.clone()))?;

    let mut server = Server::new(entry.config.clone(), factory);
    if entry.enable_monitoring {
        if let Some(bus) = bus {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            bridge::forward(bus.clone(), rx);
            server = server.with_monitor(tx);
        }
    }
    info!(name = %entry.name, addr = %server.bind_address(), "server configured");
    Ok(Arc::new(server))
}
