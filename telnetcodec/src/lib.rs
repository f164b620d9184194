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

//! RFC 854 Telnet protocol codec for `tokio_util`.
//!
//! This crate implements the byte-stuffing wire format (`IAC` escaping), the
//! RFC 1143 Q-Method option negotiation state machine, and RFC 1073/1091
//! subnegotiation payloads (NAWS, TERMINAL-TYPE) needed to speak Telnet over
//! a [`tokio::net::TcpStream`](https://docs.rs/tokio) with
//! [`tokio_util::codec::Framed`].
//!
//! The negotiation side tracks state per option per direction; see
//! [`option::TelnetOptions`] for the six-state RFC 1143 machine and
//! [`codec::TelnetCodec`] for the `Decoder`/`Encoder` pair that drives it.

pub mod args;
pub mod codec;
pub mod consts;
pub mod event;
pub mod frame;
pub mod option;
pub mod result;

pub use crate::args::naws::WindowSize;
pub use crate::args::ttype::{TerminalType, TerminalTypeCommand};
pub use crate::args::TelnetArgument;
pub use crate::codec::TelnetCodec;
pub use crate::event::TelnetEvent;
pub use crate::frame::TelnetFrame;
pub use crate::option::{QState, TelnetOption, TelnetOptions, TelnetSide};
pub use crate::result::{CodecError, CodecResult, SubnegotiationErrorKind};

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    /// End-to-end: a server enabling ECHO, SUPPRESS-GO-AHEAD, and asking the
    /// client for its TERMINAL-TYPE and window size, all in one negotiation
    /// burst, matches the literal byte sequence a session bring-up would send.
    #[test]
    fn server_negotiation_bringup_sequence() {
        let mut codec = TelnetCodec::new();
        codec.support_local(TelnetOption::Echo);
        codec.support_local(TelnetOption::SuppressGoAhead);
        codec.support_remote(TelnetOption::SuppressGoAhead);
        codec.support_remote(TelnetOption::TerminalType);
        codec.support_remote(TelnetOption::Naws);

        let mut out = BytesMut::new();
        for frame in [
            codec.enable_local(TelnetOption::SuppressGoAhead),
            codec.enable_remote(TelnetOption::SuppressGoAhead),
            codec.enable_local(TelnetOption::Echo),
            codec.enable_remote(TelnetOption::TerminalType),
            codec.enable_remote(TelnetOption::Naws),
        ]
        .into_iter()
        .flatten()
        {
            codec.encode(frame, &mut out).unwrap();
        }

        assert_eq!(
            &out[..],
            &[
                consts::IAC,
                consts::WILL,
                consts::option::SUPPRESS_GO_AHEAD,
                consts::IAC,
                consts::DO,
                consts::option::SUPPRESS_GO_AHEAD,
                consts::IAC,
                consts::WILL,
                consts::option::ECHO,
                consts::IAC,
                consts::DO,
                consts::option::TERMINAL_TYPE,
                consts::IAC,
                consts::DO,
                consts::option::NAWS,
            ][..]
        );
    }

    /// A client accepting every offer produces `OptionStatus` events and the
    /// codec reports each option enabled on the side that was requested.
    #[test]
    fn client_accepts_all_offers() {
        let mut codec = TelnetCodec::new();
        codec.support_remote(TelnetOption::Echo);
        codec.support_local(TelnetOption::SuppressGoAhead);
        codec.support_remote(TelnetOption::SuppressGoAhead);

        let mut input = BytesMut::new();
        input.extend_from_slice(&[consts::IAC, consts::WILL, consts::option::ECHO]);
        input.extend_from_slice(&[
            consts::IAC,
            consts::DO,
            consts::option::SUPPRESS_GO_AHEAD,
        ]);
        input.extend_from_slice(&[
            consts::IAC,
            consts::WILL,
            consts::option::SUPPRESS_GO_AHEAD,
        ]);

        let mut events = Vec::new();
        while let Some(event) = codec.decode(&mut input).unwrap() {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                TelnetEvent::OptionStatus(TelnetOption::Echo, TelnetSide::Remote, true),
                TelnetEvent::OptionStatus(
                    TelnetOption::SuppressGoAhead,
                    TelnetSide::Local,
                    true
                ),
                TelnetEvent::OptionStatus(
                    TelnetOption::SuppressGoAhead,
                    TelnetSide::Remote,
                    true
                ),
            ]
        );
        assert!(codec.is_enabled_remote(TelnetOption::Echo));
        assert!(codec.is_enabled_local(TelnetOption::SuppressGoAhead));
        assert!(codec.is_enabled_remote(TelnetOption::SuppressGoAhead));
    }

    /// A line of application data with an embedded literal `0xFF` round-trips
    /// through encode then decode unchanged.
    #[test]
    fn data_round_trips_through_encode_decode() {
        let mut codec = TelnetCodec::new();
        let input: &[u8] = b"hi\xffthere";

        let mut wire = BytesMut::new();
        Encoder::<&[u8]>::encode(&mut codec, input, &mut wire).unwrap();

        let mut decoded = Vec::new();
        while let Some(event) = codec.decode(&mut wire).unwrap() {
            match event {
                TelnetEvent::Data(byte) => decoded.push(byte),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(decoded, input);
    }
}
