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

//! The subscriber table and publish path.
//!
//! Each subscriber owns one bounded `tokio::sync::mpsc` channel (default
//! 1024). Publish is always a best-effort `try_send`: a full channel means a
//! slow consumer, so that subscriber is dropped rather than making the
//! publisher (a live session's pipeline) wait.

use crate::event::{BusEvent, SessionSummary, TrafficData, WatchStatus};
use dashmap::DashMap;
use dashmap::DashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::warn;

/// Default bound on a subscriber's event queue, per session (4.H).
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Identifies one subscriber connection. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

struct Subscriber {
    sender: mpsc::Sender<BusEvent>,
    watching: DashSet<u64>,
}

/// Process-wide session activity bus.
pub struct MonitorBus {
    subscribers: DashMap<SubscriberId, Subscriber>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Default for MonitorBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl MonitorBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(0),
            capacity,
        }
    }

    /// Registers a new subscriber and immediately queues it an
    /// `active_sessions` snapshot. Returns the subscriber's id and the
    /// receiving half of its event channel.
    pub fn subscribe(&self, active_sessions: Vec<SessionSummary>) -> (SubscriberId, mpsc::Receiver<BusEvent>) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);
        let _ = tx.try_send(BusEvent::ActiveSessions {
            sessions: active_sessions,
        });
        self.subscribers.insert(
            id,
            Subscriber {
                sender: tx,
                watching: DashSet::new(),
            },
        );
        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(&id);
    }

    /// Applies a subscriber command (`watch_session` / `stop_watching`) and
    /// returns the `watch_response` event to send back to that subscriber.
    pub fn apply_command(
        &self,
        id: SubscriberId,
        command: crate::event::SubscriberCommand,
    ) -> Option<BusEvent> {
        let subscriber = self.subscribers.get(&id)?;
        match command {
            crate::event::SubscriberCommand::WatchSession { session_id } => {
                subscriber.watching.insert(session_id);
                Some(BusEvent::WatchResponse {
                    session_id,
                    status: WatchStatus::Success,
                    error: None,
                })
            }
            crate::event::SubscriberCommand::StopWatching { session_id } => {
                subscriber.watching.remove(&session_id);
                Some(BusEvent::WatchResponse {
                    session_id,
                    status: WatchStatus::Stopped,
                    error: None,
                })
            }
        }
    }

    /// Broadcasts an event (`session_started` / `session_ended`) to every
    /// subscriber.
    pub fn publish_broadcast(&self, event: BusEvent) {
        self.publish_filtered(event, |_| true);
    }

    /// Publishes a per-session traffic event (`client_input` /
    /// `server_message`) only to subscribers watching that session.
    pub fn publish_to_watchers(&self, session_id: u64, event: BusEvent) {
        self.publish_filtered(event, |subscriber| subscriber.watching.contains(&session_id));
    }

    fn publish_filtered(&self, event: BusEvent, mut should_send: impl FnMut(&Subscriber) -> bool) {
        let mut slow_consumers = Vec::new();
        for entry in self.subscribers.iter() {
            if !should_send(entry.value()) {
                continue;
            }
            match entry.value().sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => slow_consumers.push(*entry.key()),
                Err(mpsc::error::TrySendError::Closed(_)) => slow_consumers.push(*entry.key()),
            }
        }
        for id in slow_consumers {
            warn!(subscriber = id.0, "disconnecting slow consumer");
            self.subscribers.remove(&id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Convenience wrapper letting a session's pipeline hold one cheap handle
/// instead of an `Arc<MonitorBus>` plus its own session id everywhere.
#[derive(Clone)]
pub struct SessionPublisher {
    bus: Arc<MonitorBus>,
    session_id: u64,
}

impl SessionPublisher {
    pub fn new(bus: Arc<MonitorBus>, session_id: u64) -> Self {
        Self { bus, session_id }
    }

    pub fn client_input(&self, text: impl Into<String>) {
        self.bus.publish_to_watchers(
            self.session_id,
            BusEvent::ClientInput {
                session_id: self.session_id,
                data: TrafficData {
                    text: text.into(),
                    ts: now_unix_ms(),
                },
            },
        );
    }

    pub fn server_message(&self, text: impl Into<String>) {
        self.bus.publish_to_watchers(
            self.session_id,
            BusEvent::ServerMessage {
                session_id: self.session_id,
                data: TrafficData {
                    text: text.into(),
                    ts: now_unix_ms(),
                },
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u64) -> SessionSummary {
        SessionSummary {
            id,
            transport: "telnet".to_string(),
            client: crate::event::ClientInfo {
                remote_addr: "127.0.0.1:1".to_string(),
            },
            is_newest: true,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn new_subscriber_receives_active_sessions_first() {
        let bus = MonitorBus::default();
        let (_, mut rx) = bus.subscribe(vec![summary(1)]);
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, BusEvent::ActiveSessions { .. }));
    }

    #[tokio::test]
    async fn watchers_receive_traffic_only_for_their_session() {
        let bus = MonitorBus::default();
        let (id, mut rx) = bus.subscribe(vec![]);
        rx.recv().await.unwrap(); // active_sessions

        bus.apply_command(
            id,
            crate::event::SubscriberCommand::WatchSession { session_id: 42 },
        );
        bus.publish_to_watchers(
            42,
            BusEvent::ClientInput {
                session_id: 42,
                data: TrafficData {
                    text: "hello".to_string(),
                    ts: 0,
                },
            },
        );
        bus.publish_to_watchers(
            7,
            BusEvent::ClientInput {
                session_id: 7,
                data: TrafficData {
                    text: "ignored".to_string(),
                    ts: 0,
                },
            },
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            BusEvent::ClientInput {
                session_id: 42,
                data: TrafficData {
                    text: "hello".to_string(),
                    ts: 0,
                },
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber_regardless_of_watch_state() {
        let bus = MonitorBus::default();
        let (_, mut rx_a) = bus.subscribe(vec![]);
        let (_, mut rx_b) = bus.subscribe(vec![]);
        rx_a.recv().await.unwrap();
        rx_b.recv().await.unwrap();

        bus.publish_broadcast(BusEvent::SessionEnded {
            session: crate::event::SessionRef { id: 1 },
        });

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn full_queue_disconnects_the_subscriber() {
        let bus = MonitorBus::new(1);
        let (id, mut rx) = bus.subscribe(vec![]);
        rx.recv().await.unwrap(); // drains the active_sessions slot, queue now empty but capacity 1

        // fill the one slot, then overflow it
        bus.publish_broadcast(BusEvent::SessionEnded {
            session: crate::event::SessionRef { id: 1 },
        });
        bus.publish_broadcast(BusEvent::SessionEnded {
            session: crate::event::SessionRef { id: 2 },
        });

        assert_eq!(bus.subscriber_count(), 0);
        let _ = id;
    }
}
