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

//! Core identifiers and snapshot types shared across the session pipeline.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch, for wire-facing timestamps.
/// `Instant` is monotonic and process-local, so it can't serialize to
/// anything a monitor subscriber could make sense of.
pub fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Unique identifier for a session (monotonically increasing, never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which wire protocol a session was accepted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Raw LF/CRLF-terminated TCP lines, no negotiation.
    Tcp,
    /// TCP carrying RFC 854 Telnet with option negotiation.
    Telnet,
    /// WebSocket text/binary frames, no Telnet layer.
    WebSocket,
    /// WebSocket frames additionally carrying the Telnet codec.
    WsTelnet,
}

impl TransportKind {
    /// Whether sessions on this transport run the Telnet negotiation sequence.
    pub fn negotiates_telnet(self) -> bool {
        matches!(self, TransportKind::Telnet | TransportKind::WsTelnet)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Tcp => write!(f, "tcp"),
            TransportKind::Telnet => write!(f, "telnet"),
            TransportKind::WebSocket => write!(f, "websocket"),
            TransportKind::WsTelnet => write!(f, "ws_telnet"),
        }
    }
}

/// Session lifecycle state (stored as atomic u8 for lock-free reads).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Accepted, welcome not yet written.
    Opening = 0,
    /// Welcome written, initial Telnet negotiation outstanding.
    Negotiating = 1,
    /// Steady-state line dispatch.
    Running = 2,
    /// Terminal trigger seen, flushing and closing.
    Closing = 3,
    /// Transport closed and deregistered.
    Closed = 4,
}

impl SessionState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Opening,
            1 => Self::Negotiating,
            2 => Self::Running,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opening => write!(f, "opening"),
            Self::Negotiating => write!(f, "negotiating"),
            Self::Running => write!(f, "running"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Non-blocking snapshot of one session, safe to clone out of the registry.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub transport: TransportKind,
    pub state: SessionState,
    pub peer_addr: SocketAddr,
    pub created_at: Instant,
    /// Wall-clock equivalent of `created_at`, for the monitor wire schema.
    pub created_at_unix_ms: u64,
    pub last_activity: Instant,
    pub is_newest: bool,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl SessionInfo {
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Non-blocking snapshot of one server's state.
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    pub active_sessions: usize,
    pub total_sessions: u64,
    pub bind_address: SocketAddr,
    pub uptime: Duration,
    pub started_at: Instant,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Server {{ active: {}, total: {}, addr: {}, uptime: {:?} }}",
            self.active_sessions, self.total_sessions, self.bind_address, self.uptime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_orders_and_displays() {
        let a = SessionId::new(1);
        let b = SessionId::new(2);
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(a.to_string(), "conn-1");
    }

    #[test]
    fn session_state_round_trips_through_u8() {
        for state in [
            SessionState::Opening,
            SessionState::Negotiating,
            SessionState::Running,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            assert_eq!(SessionState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn only_closing_and_closed_are_terminal() {
        assert!(!SessionState::Opening.is_terminal());
        assert!(!SessionState::Negotiating.is_terminal());
        assert!(!SessionState::Running.is_terminal());
        assert!(SessionState::Closing.is_terminal());
        assert!(SessionState::Closed.is_terminal());
    }

    #[test]
    fn only_telnet_transports_negotiate() {
        assert!(TransportKind::Telnet.negotiates_telnet());
        assert!(TransportKind::WsTelnet.negotiates_telnet());
        assert!(!TransportKind::Tcp.negotiates_telnet());
        assert!(!TransportKind::WebSocket.negotiates_telnet());
    }
}
