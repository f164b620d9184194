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

//! Converts `telehub_service::SessionEvent` into `telehub_monitor::BusEvent`.
//!
//! Both library crates are deliberately ignorant of each other (see their
//! respective doc comments); this is the one place that bridges them, since
//! only the launcher depends on both.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use telehub_monitor::{BusEvent, ClientInfo, MonitorBus, SessionRef, TrafficData};
use telehub_service::{SessionEvent, SessionInfo};

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn summary(info: &SessionInfo) -> telehub_monitor::SessionSummary {
    telehub_monitor::SessionSummary {
        id: info.id.as_u64(),
        transport: info.transport.to_string(),
        client: ClientInfo {
            remote_addr: info.peer_addr.to_string(),
        },
        is_newest: info.is_newest,
        created_at: info.created_at_unix_ms,
    }
}

/// Spawns a task draining `events` into `bus` until the channel closes
/// (which happens once the owning `Server` is dropped).
pub fn forward(bus: Arc<MonitorBus>, mut events: tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Started(info) => {
                    bus.publish_broadcast(BusEvent::SessionStarted {
                        session: summary(&info),
                    });
                }
                SessionEvent::Ended(id, _reason) => {
                    bus.publish_broadcast(BusEvent::SessionEnded {
                        session: SessionRef { id: id.as_u64() },
                    });
                }
                SessionEvent::ClientInput(id, text) => {
                    bus.publish_to_watchers(
                        id.as_u64(),
                        BusEvent::ClientInput {
                            session_id: id.as_u64(),
                            data: TrafficData {
                                text,
                                ts: now_unix_ms(),
                            },
                        },
                    );
                }
                SessionEvent::ServerMessage(id, text) => {
                    bus.publish_to_watchers(
                        id.as_u64(),
                        BusEvent::ServerMessage {
                            session_id: id.as_u64(),
                            data: TrafficData {
                                text,
                                ts: now_unix_ms(),
                            },
                        },
                    );
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Instant;
    use telehub_service::{SessionId, SessionState, TransportKind};
    use tokio::sync::mpsc;

    fn info(id: u64) -> SessionInfo {
        SessionInfo {
            id: SessionId::new(id),
            transport: TransportKind::Telnet,
            state: SessionState::Running,
            peer_addr: "127.0.0.1:1".parse::<SocketAddr>().unwrap(),
            created_at: Instant::now(),
            created_at_unix_ms: now_unix_ms(),
            last_activity: Instant::now(),
            is_newest: true,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    #[tokio::test]
    async fn session_started_reaches_every_subscriber() {
        let bus = Arc::new(MonitorBus::default());
        let (tx, rx) = mpsc::unbounded_channel();
        forward(bus.clone(), rx);

        let (_, mut sub) = bus.subscribe(Vec::new());
        sub.recv().await.unwrap(); // active_sessions

        tx.send(SessionEvent::Started(info(1))).unwrap();
        let event = sub.recv().await.unwrap();
        assert!(matches!(event, BusEvent::SessionStarted { .. }));
    }

    #[tokio::test]
    async fn client_input_reaches_only_watchers() {
        let bus = Arc::new(MonitorBus::default());
        let (tx, rx) = mpsc::unbounded_channel();
        forward(bus.clone(), rx);

        let (id, mut sub) = bus.subscribe(Vec::new());
        sub.recv().await.unwrap();
        bus.apply_command(id, telehub_monitor::SubscriberCommand::WatchSession { session_id: 7 });

        tx.send(SessionEvent::ClientInput(SessionId::new(7), "hi".to_string()))
            .unwrap();
        let event = sub.recv().await.unwrap();
        match event {
            BusEvent::ClientInput { session_id, data } => {
                assert_eq!(session_id, 7);
                assert_eq!(data.text, "hi");
            }
            other => panic!("expected ClientInput, got {other:?}"),
        }
    }
}
