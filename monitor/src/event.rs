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

//! Wire schema for the monitor bus: events published to subscribers and
//! commands subscribers send back.

use serde::{Deserialize, Serialize};

/// The connecting client's address, nested under `SessionSummary.client` on
/// the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientInfo {
    pub remote_addr: String,
}

/// Serializable snapshot of one session, independent of the session pipeline's
/// own `SessionInfo` so this crate carries no dependency on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: u64,
    pub transport: String,
    pub client: ClientInfo,
    pub is_newest: bool,
    pub created_at: u64,
}

/// Bare session reference, as carried by `session_ended`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRef {
    pub id: u64,
}

/// One line or batch of traffic, timestamped at publish time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficData {
    pub text: String,
    pub ts: u64,
}

/// Outcome of a subscriber command, as carried by `watch_response`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Success,
    Stopped,
}

/// One event published to every subscriber (or to subscribers watching a
/// particular session, for the traffic variants).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusEvent {
    /// Sent once, immediately, to a newly-connected subscriber.
    ActiveSessions { sessions: Vec<SessionSummary> },
    SessionStarted { session: SessionSummary },
    SessionEnded { session: SessionRef },
    /// Delivered only to subscribers currently watching `session_id`.
    ClientInput { session_id: u64, data: TrafficData },
    /// Delivered only to subscribers currently watching `session_id`.
    ServerMessage { session_id: u64, data: TrafficData },
    WatchResponse {
        session_id: u64,
        status: WatchStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// A command sent by a subscriber over its WebSocket connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriberCommand {
    WatchSession { session_id: u64 },
    StopWatching { session_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_event_round_trips_through_json() {
        let event = BusEvent::SessionEnded {
            session: SessionRef { id: 7 },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(serde_json::from_str::<BusEvent>(&json).unwrap(), event);
    }

    #[test]
    fn subscriber_command_tags_are_snake_case() {
        let json = serde_json::to_string(&SubscriberCommand::WatchSession { session_id: 3 }).unwrap();
        assert!(json.contains("\"type\":\"watch_session\""));
        assert!(json.contains("\"session_id\":3"));
    }

    #[test]
    fn watch_response_omits_error_when_absent() {
        let event = BusEvent::WatchResponse {
            session_id: 3,
            status: WatchStatus::Success,
            error: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"status\":\"success\""));
    }

    #[test]
    fn traffic_data_carries_text_and_timestamp() {
        let event = BusEvent::ClientInput {
            session_id: 1,
            data: TrafficData {
                text: "hello".to_string(),
                ts: 1_700_000_000_000,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"text\":\"hello\""));
        assert!(json.contains("\"ts\":1700000000000"));
    }
}
