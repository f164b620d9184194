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

//! Drives several [`Server`] instances together and answers to process signals.

use crate::error::ServiceError;
use crate::error::Result;
use crate::server::Server;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{error, info};

/// Owns one [`Server`] per configured transport and runs them to completion.
pub struct Supervisor {
    servers: Vec<Arc<Server>>,
}

impl Supervisor {
    pub fn new(servers: Vec<Arc<Server>>) -> Self {
        Self { servers }
    }

    /// Starts every server's accept loop, then waits for either a shutdown
    /// signal or a fatal server error, whichever comes first. On either
    /// condition, every server is asked to drain gracefully before this
    /// returns.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let mut tasks = FuturesUnordered::new();
        for server in &self.servers {
            info!(addr = %server.bind_address(), "starting server");
            let server = server.clone();
            tasks.push(tokio::spawn(async move { server.run().await }));
        }

        let mut fatal: Option<ServiceError> = None;
        tokio::select! {
            _ = wait_for_shutdown_signal() => {
                info!("shutdown signal received");
            }
            outcome = next_fatal(&mut tasks) => {
                if let Some(err) = outcome {
                    error!(error = %err, "server task failed, shutting down the rest");
                    fatal = Some(err);
                }
            }
        }

        join_all(self.servers.iter().map(|server| server.shutdown())).await;

        while let Some(joined) = tasks.next().await {
            if let Some(err) = flatten(joined) {
                fatal.get_or_insert(err);
            }
        }

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Waits until one server task ends in an error, or all tasks have ended
/// (in which case there is nothing left to report here).
async fn next_fatal(
    tasks: &mut FuturesUnordered<tokio::task::JoinHandle<Result<()>>>,
) -> Option<ServiceError> {
    while let Some(joined) = tasks.next().await {
        if let Some(err) = flatten(joined) {
            return Some(err);
        }
    }
    None
}

fn flatten(
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> Option<ServiceError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(join_err) => Some(ServiceError::InvalidState(join_err.to_string())),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
