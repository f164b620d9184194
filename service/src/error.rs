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

//! Error types for the session pipeline and server runtime.

use crate::types::SessionId;
use thiserror::Error;

/// Result type for session/server operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur while running a session or server.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Peer EOF or reset; an ordinary end to a session.
    #[error("transport closed")]
    TransportClosed,

    /// Unexpected I/O failure on the underlying transport.
    #[error("transport fault: {0}")]
    TransportFault(#[from] std::io::Error),

    /// Malformed Telnet sequence exceeding sane bounds.
    #[error("protocol error: {0}")]
    ProtocolError(#[from] telehub_telnetcodec::CodecError),

    /// The application callback exceeded its configured deadline.
    #[error("handler callback timed out")]
    HandlerTimeout,

    /// The handler raised or returned an unexpected failure.
    #[error("handler fault: {0}")]
    HandlerFault(String),

    /// A monitor subscriber's bounded queue overflowed.
    #[error("slow consumer")]
    SlowConsumer,

    /// A session was requested while the registry was at `max_connections`.
    #[error("server at capacity ({0})")]
    Overcapacity(usize),

    /// The session referenced by this id is not present in the registry.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The server was asked to start while already running, or stop while not.
    #[error("{0}")]
    InvalidState(String),
}

impl ServiceError {
    /// Whether retrying the operation that produced this error might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::TransportClosed | ServiceError::TransportFault(_)
        )
    }

    /// The `metrics` counter name this error class should increment.
    pub fn metric_name(&self) -> &'static str {
        match self {
            ServiceError::TransportClosed | ServiceError::TransportFault(_) => {
                "connection_errors"
            }
            ServiceError::ProtocolError(_) => "protocol_errors",
            ServiceError::HandlerTimeout => "timeout_errors",
            ServiceError::HandlerFault(_) => "handler_errors",
            ServiceError::SlowConsumer => "monitor_slow_consumer",
            ServiceError::Overcapacity(_) => "overcapacity_errors",
            ServiceError::SessionNotFound(_) => "session_not_found_errors",
            ServiceError::InvalidState(_) => "invalid_state_errors",
        }
    }
}
