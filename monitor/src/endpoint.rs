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

//! The monitor's own WebSocket accept loop.
//!
//! Deliberately a small, self-contained acceptor rather than a reuse of
//! `telehub-service::Server` — that type is shaped around Telnet/line
//! sessions with a `ServerHandler`, while a monitor subscriber only ever
//! exchanges JSON commands and events. Still the same transport machinery
//! underneath (`tokio_tungstenite` over `tokio::net::TcpListener`), so the
//! two acceptor loops read the same way side by side.

use crate::bus::MonitorBus;
use crate::event::{BusEvent, SubscriberCommand};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Binds `addr` and serves monitor subscribers until the process exits or
/// the listener errors. Each connection runs on its own task.
pub async fn serve(bus: Arc<MonitorBus>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "monitor endpoint listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let bus = bus.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_subscriber(bus, stream, peer).await {
                warn!(%peer, error = %err, "monitor subscriber connection failed");
            }
        });
    }
}

async fn handle_subscriber(
    bus: Arc<MonitorBus>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();
    let (id, mut events) = bus.subscribe(Vec::new());
    debug!(%peer, "monitor subscriber connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let text = serde_json::to_string(&event).unwrap_or_default();
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_command(&bus, id, &text) {
                            let text = serde_json::to_string(&reply).unwrap_or_default();
                            let _ = sink.send(Message::Text(text.into())).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    bus.unsubscribe(id);
    debug!(%peer, "monitor subscriber disconnected");
    Ok(())
}

fn handle_command(
    bus: &MonitorBus,
    id: crate::bus::SubscriberId,
    text: &str,
) -> Option<BusEvent> {
    let command: SubscriberCommand = serde_json::from_str(text).ok()?;
    bus.apply_command(id, command)
}
