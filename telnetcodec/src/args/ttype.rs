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

//! TERMINAL-TYPE (RFC 1091) subnegotiation payload.

use crate::consts;
use crate::result::{CodecError, CodecResult, SubnegotiationErrorKind};
use bytes::{Buf, BufMut};

/// The `IS`/`SEND` qualifier that begins a TERMINAL-TYPE subnegotiation body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalTypeCommand {
    /// Client is reporting its terminal type.
    Is,
    /// Server is asking the client to report its terminal type.
    Send,
}

/// A parsed TERMINAL-TYPE subnegotiation: `IAC SB TERMINAL-TYPE IS <name> IAC SE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalType {
    pub command: TerminalTypeCommand,
    pub name: String,
}

impl TerminalType {
    pub fn is(name: impl Into<String>) -> TerminalType {
        TerminalType {
            command: TerminalTypeCommand::Is,
            name: name.into(),
        }
    }

    pub fn send() -> TerminalType {
        TerminalType {
            command: TerminalTypeCommand::Send,
            name: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        1 + self.name.len()
    }

    pub fn encode<T: BufMut>(&self, dst: &mut T) {
        match self.command {
            TerminalTypeCommand::Is => dst.put_u8(consts::IS),
            TerminalTypeCommand::Send => dst.put_u8(consts::SEND),
        }
        dst.put_slice(self.name.as_bytes());
    }

    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<usize> {
        match self.command {
            TerminalTypeCommand::Is => writer.write_all(&[consts::IS])?,
            TerminalTypeCommand::Send => writer.write_all(&[consts::SEND])?,
        }
        writer.write_all(self.name.as_bytes())?;
        Ok(1 + self.name.len())
    }

    pub fn decode<T: Buf>(src: &mut T) -> CodecResult<TerminalType> {
        if src.remaining() < 1 {
            return Err(CodecError::SubnegotiationError {
                option: Some(consts::option::TERMINAL_TYPE),
                reason: SubnegotiationErrorKind::InsufficientData {
                    required: 1,
                    available: 0,
                },
            });
        }
        let command = match src.get_u8() {
            consts::IS => TerminalTypeCommand::Is,
            consts::SEND => TerminalTypeCommand::Send,
            other => {
                return Err(CodecError::SubnegotiationError {
                    option: Some(consts::option::TERMINAL_TYPE),
                    reason: SubnegotiationErrorKind::InvalidCommand { command: other },
                });
            }
        };
        let mut raw = vec![0u8; src.remaining()];
        src.copy_to_slice(&mut raw);
        let name = String::from_utf8(raw).map_err(|_| CodecError::SubnegotiationError {
            option: Some(consts::option::TERMINAL_TYPE),
            reason: SubnegotiationErrorKind::InvalidTerminalType,
        })?;
        Ok(TerminalType { command, name })
    }
}

impl std::fmt::Display for TerminalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.command {
            TerminalTypeCommand::Is => write!(f, "IS {}", self.name),
            TerminalTypeCommand::Send => write!(f, "SEND"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn round_trips_is_through_encode_decode() {
        let ttype = TerminalType::is("XTERM");
        let mut buf = BytesMut::new();
        ttype.encode(&mut buf);
        let decoded = TerminalType::decode(&mut buf).expect("decode ok");
        assert_eq!(decoded, ttype);
    }

    #[test]
    fn send_has_empty_name() {
        let ttype = TerminalType::send();
        let mut buf = BytesMut::new();
        ttype.encode(&mut buf);
        assert_eq!(&buf[..], &[consts::SEND]);
    }

    #[test]
    fn decode_rejects_empty_buffer() {
        let mut buf = BytesMut::new();
        assert!(TerminalType::decode(&mut buf).is_err());
    }
}
