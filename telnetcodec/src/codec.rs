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

//! `tokio_util::codec` [`Decoder`]/[`Encoder`] pair for the Telnet wire protocol.
//!
//! The decoder is a straightforward byte-at-a-time state machine: `Data`,
//! `Command`, `SubNeg`, `SubNegIAC` per RFC 854/855, dispatching completed
//! negotiation bytes through the Q-Method table in [`crate::option`].

use crate::args::naws::WindowSize;
use crate::args::ttype::TerminalType;
use crate::args::TelnetArgument;
use crate::consts;
use crate::event::TelnetEvent;
use crate::frame::TelnetFrame;
use crate::option::{TelnetOption, TelnetOptions, TelnetSide};
use crate::result::CodecError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// Subnegotiations longer than this without a closing `IAC SE` are a protocol error.
pub const MAX_SUBNEGOTIATION_LEN: usize = 1024;

/// A stateful RFC 854/855 Telnet codec: byte-level parsing, IAC escaping, and
/// Q-Method option negotiation, all in one `Decoder`/`Encoder` pair.
pub struct TelnetCodec {
    decoder_buffer: BytesMut,
    decoder_state: DecoderState,
    options: TelnetOptions,
    pending_replies: Vec<TelnetFrame>,
}

impl TelnetCodec {
    pub fn new() -> TelnetCodec {
        TelnetCodec::default()
    }

    pub fn is_supported_local(&self, option: TelnetOption) -> bool {
        self.options.is_supported_local(option)
    }

    pub fn is_supported_remote(&self, option: TelnetOption) -> bool {
        self.options.is_supported_remote(option)
    }

    pub fn support_local(&mut self, option: TelnetOption) {
        self.options.support_local(option);
    }

    pub fn support_remote(&mut self, option: TelnetOption) {
        self.options.support_remote(option);
    }

    pub fn is_enabled_local(&self, option: TelnetOption) -> bool {
        self.options.local_enabled(option)
    }

    pub fn is_enabled_remote(&self, option: TelnetOption) -> bool {
        self.options.remote_enabled(option)
    }

    /// Request to enable `option` locally (sends WILL if the Q-Method state calls for it).
    pub fn enable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.request_will(option)
    }

    /// Request to disable `option` locally (sends WONT if the Q-Method state calls for it).
    pub fn disable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.request_wont(option)
    }

    /// Request the peer enable `option` (sends DO if the Q-Method state calls for it).
    pub fn enable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.request_do(option)
    }

    /// Request the peer disable `option` (sends DONT if the Q-Method state calls for it).
    pub fn disable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.request_dont(option)
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        TelnetCodec {
            decoder_buffer: BytesMut::new(),
            decoder_state: DecoderState::Data,
            options: TelnetOptions::default(),
            pending_replies: Vec::new(),
        }
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetEvent;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetEvent>, Self::Error> {
        while src.remaining() > 0 {
            let byte = src.get_u8();
            match (self.decoder_state, byte) {
                (DecoderState::Data, consts::IAC) => {
                    self.decoder_state = DecoderState::Command;
                }
                (DecoderState::Data, _) => {
                    return Ok(Some(TelnetEvent::Data(byte)));
                }
                (DecoderState::Command, consts::IAC) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::Data(consts::IAC)));
                }
                (DecoderState::Command, consts::NOP) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::NoOperation));
                }
                (DecoderState::Command, consts::DM) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::DataMark));
                }
                (DecoderState::Command, consts::BRK) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::Break));
                }
                (DecoderState::Command, consts::IP) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::InterruptProcess));
                }
                (DecoderState::Command, consts::AO) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::AbortOutput));
                }
                (DecoderState::Command, consts::AYT) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::AreYouThere));
                }
                (DecoderState::Command, consts::EC) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::EraseCharacter));
                }
                (DecoderState::Command, consts::EL) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::EraseLine));
                }
                (DecoderState::Command, consts::GA) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::GoAhead));
                }
                (DecoderState::Command, consts::EOR) => {
                    self.decoder_state = DecoderState::Data;
                    return Ok(Some(TelnetEvent::EndOfRecord));
                }
                (DecoderState::Command, consts::DO) => {
                    self.decoder_state = DecoderState::NegotiateDo;
                }
                (DecoderState::Command, consts::DONT) => {
                    self.decoder_state = DecoderState::NegotiateDont;
                }
                (DecoderState::Command, consts::WILL) => {
                    self.decoder_state = DecoderState::NegotiateWill;
                }
                (DecoderState::Command, consts::WONT) => {
                    self.decoder_state = DecoderState::NegotiateWont;
                }
                (DecoderState::Command, consts::SB) => {
                    self.decoder_state = DecoderState::SubNeg;
                }
                (DecoderState::Command, other) => {
                    warn!("received unknown telnet command 0x{:02X}", other);
                    self.decoder_state = DecoderState::Data;
                    return Err(CodecError::UnknownCommand(other));
                }
                (DecoderState::NegotiateDo, _) => {
                    self.decoder_state = DecoderState::Data;
                    if let Some(event) = self.negotiate(TelnetFrame::Do(byte.into()))? {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::NegotiateDont, _) => {
                    self.decoder_state = DecoderState::Data;
                    if let Some(event) = self.negotiate(TelnetFrame::Dont(byte.into()))? {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::NegotiateWill, _) => {
                    self.decoder_state = DecoderState::Data;
                    if let Some(event) = self.negotiate(TelnetFrame::Will(byte.into()))? {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::NegotiateWont, _) => {
                    self.decoder_state = DecoderState::Data;
                    if let Some(event) = self.negotiate(TelnetFrame::Wont(byte.into()))? {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::SubNeg, _) => {
                    self.decoder_state = DecoderState::SubNegArgument(byte);
                }
                (DecoderState::SubNegArgument(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubNegArgumentIAC(option);
                }
                (DecoderState::SubNegArgument(_option), _) => {
                    if self.decoder_buffer.len() >= MAX_SUBNEGOTIATION_LEN {
                        self.decoder_state = DecoderState::Data;
                        self.decoder_buffer.clear();
                        return Err(CodecError::SubnegotiationTooLarge {
                            limit: MAX_SUBNEGOTIATION_LEN,
                        });
                    }
                    self.decoder_buffer.put_u8(byte);
                }
                (DecoderState::SubNegArgumentIAC(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubNegArgument(option);
                    self.decoder_buffer.put_u8(consts::IAC);
                }
                (DecoderState::SubNegArgumentIAC(option), consts::SE) => {
                    self.decoder_state = DecoderState::Data;
                    let telnet_option = TelnetOption::from_u8(option);
                    let mut payload = BytesMut::from(self.decoder_buffer.as_ref());
                    self.decoder_buffer.clear();
                    let argument = self.parse_subnegotiation(telnet_option, &mut payload)?;
                    return Ok(Some(TelnetEvent::Subnegotiate(argument)));
                }
                (DecoderState::SubNegArgumentIAC(_), other) => {
                    self.decoder_state = DecoderState::Data;
                    self.decoder_buffer.clear();
                    warn!(
                        "invalid command during subnegotiation 0x{:02X}, aborting",
                        other
                    );
                    return Err(CodecError::UnknownCommand(other));
                }
            }
        }
        Ok(None)
    }
}

impl TelnetCodec {
    fn negotiate(&mut self, frame: TelnetFrame) -> Result<Option<TelnetEvent>, CodecError> {
        let (option, side) = match frame {
            TelnetFrame::Do(o) | TelnetFrame::Dont(o) => (o, TelnetSide::Local),
            TelnetFrame::Will(o) | TelnetFrame::Wont(o) => (o, TelnetSide::Remote),
            _ => unreachable!("negotiate only called with negotiation frames"),
        };
        let was_enabled = match side {
            TelnetSide::Local => self.options.local_enabled(option),
            TelnetSide::Remote => self.options.remote_enabled(option),
        };
        // The Q-Method table may want to emit a reply frame; stash it on the
        // instance for the caller's transport loop to drain via `take_pending_reply`.
        if let Some(reply) = self.options.handle_received(frame)? {
            self.pending_replies.push(reply);
        }
        let is_enabled = match side {
            TelnetSide::Local => self.options.local_enabled(option),
            TelnetSide::Remote => self.options.remote_enabled(option),
        };
        if is_enabled != was_enabled {
            Ok(Some(TelnetEvent::OptionStatus(option, side, is_enabled)))
        } else {
            Ok(None)
        }
    }

    fn parse_subnegotiation(
        &mut self,
        option: TelnetOption,
        payload: &mut BytesMut,
    ) -> Result<TelnetArgument, CodecError> {
        match option {
            TelnetOption::Naws => Ok(TelnetArgument::WindowSize(WindowSize::decode(payload)?)),
            TelnetOption::TerminalType => {
                Ok(TelnetArgument::TerminalType(TerminalType::decode(payload)?))
            }
            other => Ok(TelnetArgument::Unknown(
                other,
                BytesMut::from(payload.as_ref()),
            )),
        }
    }

    /// Drain negotiation replies queued by the decoder (e.g. `DO`/`WONT` sent
    /// in response to a peer's offer) since the last call.
    pub fn take_pending_replies(&mut self) -> Vec<TelnetFrame> {
        std::mem::take(&mut self.pending_replies)
    }
}

impl Encoder<TelnetFrame> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetFrame::Data(byte) => {
                dst.reserve(2);
                if byte == consts::IAC {
                    dst.put_u8(consts::IAC);
                }
                dst.put_u8(byte);
            }
            TelnetFrame::NoOperation => encode_command(dst, consts::NOP),
            TelnetFrame::DataMark => encode_command(dst, consts::DM),
            TelnetFrame::Break => encode_command(dst, consts::BRK),
            TelnetFrame::InterruptProcess => encode_command(dst, consts::IP),
            TelnetFrame::AbortOutput => encode_command(dst, consts::AO),
            TelnetFrame::AreYouThere => encode_command(dst, consts::AYT),
            TelnetFrame::EraseCharacter => encode_command(dst, consts::EC),
            TelnetFrame::EraseLine => encode_command(dst, consts::EL),
            TelnetFrame::GoAhead => encode_command(dst, consts::GA),
            TelnetFrame::EndOfRecord => encode_command(dst, consts::EOR),
            TelnetFrame::Do(option) => encode_negotiation(dst, consts::DO, option),
            TelnetFrame::Dont(option) => encode_negotiation(dst, consts::DONT, option),
            TelnetFrame::Will(option) => encode_negotiation(dst, consts::WILL, option),
            TelnetFrame::Wont(option) => encode_negotiation(dst, consts::WONT, option),
            TelnetFrame::Subnegotiate(argument) => {
                dst.reserve(5 + argument.len());
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SB);
                dst.put_u8(argument.option().to_u8());
                argument.encode(dst)?;
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SE);
            }
        }
        Ok(())
    }
}

/// Encodes raw outbound application bytes, escaping any literal `IAC`.
///
/// This is the encoder the character handler and dispatcher write through;
/// it never interprets the bytes as commands.
impl Encoder<&[u8]> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        for &byte in item {
            if byte == consts::IAC {
                dst.put_u8(consts::IAC);
            }
            dst.put_u8(byte);
        }
        Ok(())
    }
}

fn encode_command(dst: &mut BytesMut, command: u8) {
    dst.reserve(2);
    dst.put_u8(consts::IAC);
    dst.put_u8(command);
}

fn encode_negotiation(dst: &mut BytesMut, verb: u8, option: TelnetOption) {
    dst.reserve(3);
    dst.put_u8(consts::IAC);
    dst.put_u8(verb);
    dst.put_u8(option.to_u8());
}

#[derive(Clone, Copy, Debug)]
enum DecoderState {
    Data,
    Command,
    NegotiateDo,
    NegotiateDont,
    NegotiateWill,
    NegotiateWont,
    SubNeg,
    SubNegArgument(u8),
    SubNegArgumentIAC(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn collect_all(codec: &mut TelnetCodec, mut src: BytesMut) -> Vec<TelnetEvent> {
        let mut out = Vec::new();
        loop {
            match codec.decode(&mut src).expect("decode should not error") {
                Some(event) => out.push(event),
                None => break,
            }
        }
        out
    }

    fn encode_frame(frame: TelnetFrame) -> BytesMut {
        let mut codec = TelnetCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(frame, &mut dst).expect("encode ok");
        dst
    }

    #[test]
    fn encode_plain_data_byte() {
        assert_eq!(&encode_frame(TelnetFrame::Data(b'A'))[..], &[b'A']);
    }

    #[test]
    fn encode_data_iac_is_escaped() {
        assert_eq!(
            &encode_frame(TelnetFrame::Data(consts::IAC))[..],
            &[consts::IAC, consts::IAC]
        );
    }

    #[test]
    fn encode_will_echo() {
        assert_eq!(
            &encode_frame(TelnetFrame::Will(TelnetOption::Echo))[..],
            &[consts::IAC, consts::WILL, consts::option::ECHO]
        );
    }

    #[test]
    fn decode_plain_bytes() {
        let mut codec = TelnetCodec::new();
        let src = BytesMut::from(&b"Hi"[..]);
        assert_eq!(
            collect_all(&mut codec, src),
            vec![TelnetEvent::Data(b'H'), TelnetEvent::Data(b'i')]
        );
    }

    #[test]
    fn decode_iac_iac_yields_single_literal() {
        let mut codec = TelnetCodec::new();
        let src = BytesMut::from(&[consts::IAC, consts::IAC][..]);
        assert_eq!(collect_all(&mut codec, src), vec![TelnetEvent::Data(consts::IAC)]);
    }

    #[test]
    fn decode_do_sga_emits_option_status_when_accepted() {
        let mut codec = TelnetCodec::new();
        codec.support_local(TelnetOption::SuppressGoAhead);
        let src = BytesMut::from(&[consts::IAC, consts::DO, consts::option::SUPPRESS_GO_AHEAD][..]);
        assert_eq!(
            collect_all(&mut codec, src),
            vec![TelnetEvent::OptionStatus(
                TelnetOption::SuppressGoAhead,
                TelnetSide::Local,
                true
            )]
        );
        assert_eq!(codec.take_pending_replies(), vec![TelnetFrame::Will(TelnetOption::SuppressGoAhead)]);
    }

    #[test]
    fn decode_naws_subnegotiation() {
        let mut codec = TelnetCodec::new();
        let src = BytesMut::from(
            &[
                consts::IAC,
                consts::SB,
                consts::option::NAWS,
                0x00,
                0x50,
                0x00,
                0x18,
                consts::IAC,
                consts::SE,
            ][..],
        );
        assert_eq!(
            collect_all(&mut codec, src),
            vec![TelnetEvent::Subnegotiate(TelnetArgument::WindowSize(
                WindowSize::new(80, 24)
            ))]
        );
    }

    #[test]
    fn oversized_subnegotiation_without_se_is_protocol_error() {
        let mut codec = TelnetCodec::new();
        let mut src = BytesMut::new();
        src.put_u8(consts::IAC);
        src.put_u8(consts::SB);
        src.put_u8(consts::option::NAWS);
        src.extend(std::iter::repeat(b'x').take(MAX_SUBNEGOTIATION_LEN + 1));
        let err = codec.decode(&mut src).expect_err("should be a protocol error");
        assert!(matches!(err, CodecError::SubnegotiationTooLarge { .. }));
    }
}
