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

//! NAWS (Negotiate About Window Size, RFC 1073) subnegotiation payload.

use crate::result::{CodecError, CodecResult, SubnegotiationErrorKind};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{Buf, BufMut};

/// Client terminal window size, in character columns and rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    pub cols: u16,
    pub rows: u16,
}

impl WindowSize {
    pub fn new(cols: u16, rows: u16) -> WindowSize {
        WindowSize { cols, rows }
    }

    /// Encoded length: width and height, two bytes each, MSB first.
    pub fn len(&self) -> usize {
        4
    }

    pub fn encode<T: BufMut>(&self, dst: &mut T) {
        dst.put_u16(self.cols);
        dst.put_u16(self.rows);
    }

    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<usize> {
        writer.write_u16::<BigEndian>(self.cols)?;
        writer.write_u16::<BigEndian>(self.rows)?;
        Ok(4)
    }

    pub fn decode<T: Buf>(src: &mut T) -> CodecResult<WindowSize> {
        if src.remaining() < 4 {
            return Err(CodecError::SubnegotiationError {
                option: Some(crate::consts::option::NAWS),
                reason: SubnegotiationErrorKind::InsufficientData {
                    required: 4,
                    available: src.remaining(),
                },
            });
        }
        let cols = src.get_u16();
        let rows = src.get_u16();
        Ok(WindowSize::new(cols, rows))
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize::new(80, 24)
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.cols, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn round_trips_through_encode_decode() {
        let size = WindowSize::new(132, 43);
        let mut buf = BytesMut::new();
        size.encode(&mut buf);
        assert_eq!(buf.len(), 4);
        let decoded = WindowSize::decode(&mut buf).expect("decode ok");
        assert_eq!(decoded, size);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let mut buf = BytesMut::from(&[0x00, 0x50][..]);
        let err = WindowSize::decode(&mut buf).expect_err("should fail");
        assert!(matches!(
            err,
            CodecError::SubnegotiationError {
                reason: SubnegotiationErrorKind::InsufficientData { required: 4, available: 2 },
                ..
            }
        ));
    }

    #[test]
    fn default_is_80x24() {
        assert_eq!(WindowSize::default(), WindowSize::new(80, 24));
    }
}
