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

//! Error types for the Telnet codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding or encoding the Telnet stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Negotiation machinery was handed a non-negotiation frame.
    #[error("negotiation error: {reason}{}", frame_type.as_ref().map(|t| format!(" ({t})")).unwrap_or_default())]
    NegotiationError {
        reason: String,
        frame_type: Option<String>,
    },

    /// A subnegotiation could not be parsed.
    #[error("subnegotiation error{}: {reason}", option.map(|o| format!(" (option {o})")).unwrap_or_default())]
    SubnegotiationError {
        option: Option<u8>,
        reason: SubnegotiationErrorKind,
    },

    /// A subnegotiation exceeded the sane size bound without a closing `IAC SE`.
    #[error("subnegotiation exceeded {limit} bytes without a closing IAC SE")]
    SubnegotiationTooLarge { limit: usize },

    /// An unknown two-byte `IAC` command was encountered.
    #[error("unknown telnet command: 0x{0:02X}")]
    UnknownCommand(u8),
}

/// Specific kinds of subnegotiation failure, with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubnegotiationErrorKind {
    #[error("insufficient data (required: {required}, available: {available})")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid command: 0x{command:02X}")]
    InvalidCommand { command: u8 },

    #[error("invalid utf-8 in terminal-type string")]
    InvalidTerminalType,
}
