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

//! Telnet option identity and the Q-Method (RFC 1143) negotiation state machine.
//!
//! RFC 1143 exists to stop two peers from looping forever re-offering the same
//! option. Each side of each option tracks one of six states; a request is only
//! ever sent from `No` or `Yes` — never while a request is already outstanding.

use crate::consts;
use crate::frame::TelnetFrame;
use crate::result::{CodecError, CodecResult};

/// The five options this codec negotiates, per the wire format this crate targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    /// ECHO (1) — server performs echo, suppressing client-side echo.
    Echo,
    /// SUPPRESS-GO-AHEAD (3) — disables half-duplex GA signaling.
    SuppressGoAhead,
    /// TERMINAL-TYPE (24) — client reports its terminal type string.
    TerminalType,
    /// NAWS (31) — Negotiate About Window Size.
    Naws,
    /// LINEMODE (34) — client-side line editing; presence only, semantics unspecified.
    Linemode,
    /// Any option code outside the five above.
    Unknown(u8),
}

impl TelnetOption {
    /// Decode a raw option byte.
    pub fn from_u8(byte: u8) -> TelnetOption {
        match byte {
            consts::option::ECHO => TelnetOption::Echo,
            consts::option::SUPPRESS_GO_AHEAD => TelnetOption::SuppressGoAhead,
            consts::option::TERMINAL_TYPE => TelnetOption::TerminalType,
            consts::option::NAWS => TelnetOption::Naws,
            consts::option::LINEMODE => TelnetOption::Linemode,
            other => TelnetOption::Unknown(other),
        }
    }

    /// Encode back to the raw option byte.
    pub fn to_u8(self) -> u8 {
        match self {
            TelnetOption::Echo => consts::option::ECHO,
            TelnetOption::SuppressGoAhead => consts::option::SUPPRESS_GO_AHEAD,
            TelnetOption::TerminalType => consts::option::TERMINAL_TYPE,
            TelnetOption::Naws => consts::option::NAWS,
            TelnetOption::Linemode => consts::option::LINEMODE,
            TelnetOption::Unknown(byte) => byte,
        }
    }

    fn index(self) -> usize {
        self.to_u8() as usize
    }
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        TelnetOption::from_u8(byte)
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        option.to_u8()
    }
}

impl std::fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetOption::Echo => write!(f, "ECHO"),
            TelnetOption::SuppressGoAhead => write!(f, "SUPPRESS-GO-AHEAD"),
            TelnetOption::TerminalType => write!(f, "TERMINAL-TYPE"),
            TelnetOption::Naws => write!(f, "NAWS"),
            TelnetOption::Linemode => write!(f, "LINEMODE"),
            TelnetOption::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// Which side of the negotiation a [`TelnetOption`] state applies to.
///
/// `Local` is the state of an option *we* perform (WILL/WONT); `Remote` is the
/// state of an option the *peer* performs (DO/DONT). A server that does its own
/// echo enables ECHO on `Local`; it never needs ECHO enabled on `Remote`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelnetSide {
    /// The state of an option we perform.
    Local,
    /// The state of an option the peer performs.
    Remote,
}

/// RFC 1143 Q-Method state for one side of one option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QState {
    /// Disabled, no outstanding request.
    No,
    /// Enabled, no outstanding request.
    Yes,
    /// Disabled; a request to enable is outstanding.
    WantYes,
    /// Enabled; a request to disable is outstanding.
    WantNo,
    /// A request to enable is outstanding, and we already queued a disable behind it.
    WantYesOpposite,
    /// A request to disable is outstanding, and we already queued an enable behind it.
    WantNoOpposite,
}

impl Default for QState {
    fn default() -> Self {
        QState::No
    }
}

/// Whether an option is offered/accepted on a given side at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SupportState {
    Unsupported,
    Supported,
}

impl Default for SupportState {
    fn default() -> Self {
        SupportState::Unsupported
    }
}

const TABLE_SIZE: usize = 256;

/// Per-session negotiation state for every option, indexed by option byte.
///
/// Only options marked supported (via [`TelnetOptions::support_local`] /
/// [`TelnetOptions::support_remote`]) are ever requested; unsupported options
/// that the peer offers are always refused.
pub struct TelnetOptions {
    local_support: [SupportState; TABLE_SIZE],
    remote_support: [SupportState; TABLE_SIZE],
    local_state: [QState; TABLE_SIZE],
    remote_state: [QState; TABLE_SIZE],
}

impl Default for TelnetOptions {
    fn default() -> Self {
        TelnetOptions {
            local_support: [SupportState::Unsupported; TABLE_SIZE],
            remote_support: [SupportState::Unsupported; TABLE_SIZE],
            local_state: [QState::No; TABLE_SIZE],
            remote_state: [QState::No; TABLE_SIZE],
        }
    }
}

impl TelnetOptions {
    pub fn new() -> TelnetOptions {
        TelnetOptions::default()
    }

    /// Mark an option as one we are willing to perform ourselves (WILL/WONT).
    pub fn support_local(&mut self, option: TelnetOption) {
        self.local_support[option.index()] = SupportState::Supported;
    }

    /// Mark an option as one we are willing to ask the peer to perform (DO/DONT).
    pub fn support_remote(&mut self, option: TelnetOption) {
        self.remote_support[option.index()] = SupportState::Supported;
    }

    pub fn is_supported_local(&self, option: TelnetOption) -> bool {
        self.local_support[option.index()] == SupportState::Supported
    }

    pub fn is_supported_remote(&self, option: TelnetOption) -> bool {
        self.remote_support[option.index()] == SupportState::Supported
    }

    pub fn local_qstate(&self, option: TelnetOption) -> QState {
        self.local_state[option.index()]
    }

    pub fn remote_qstate(&self, option: TelnetOption) -> QState {
        self.remote_state[option.index()]
    }

    pub fn local_enabled(&self, option: TelnetOption) -> bool {
        self.local_state[option.index()] == QState::Yes
    }

    pub fn remote_enabled(&self, option: TelnetOption) -> bool {
        self.remote_state[option.index()] == QState::Yes
    }

    /// Request to start performing `option` ourselves (sends WILL if needed).
    pub fn request_will(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.local_state[idx] {
            QState::No => {
                self.local_state[idx] = QState::WantYes;
                Some(TelnetFrame::Will(option))
            }
            QState::WantNo => {
                self.local_state[idx] = QState::WantYesOpposite;
                None
            }
            QState::WantNoOpposite => {
                self.local_state[idx] = QState::WantYes;
                None
            }
            QState::Yes | QState::WantYes | QState::WantYesOpposite => None,
        }
    }

    /// Request to stop performing `option` ourselves (sends WONT if needed).
    pub fn request_wont(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.local_state[idx] {
            QState::Yes => {
                self.local_state[idx] = QState::WantNo;
                Some(TelnetFrame::Wont(option))
            }
            QState::WantYes => {
                self.local_state[idx] = QState::WantNoOpposite;
                None
            }
            QState::WantYesOpposite => {
                self.local_state[idx] = QState::WantNo;
                None
            }
            QState::No | QState::WantNo | QState::WantNoOpposite => None,
        }
    }

    /// Request the peer start performing `option` (sends DO if needed).
    pub fn request_do(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.remote_state[idx] {
            QState::No => {
                self.remote_state[idx] = QState::WantYes;
                Some(TelnetFrame::Do(option))
            }
            QState::WantNo => {
                self.remote_state[idx] = QState::WantYesOpposite;
                None
            }
            QState::WantNoOpposite => {
                self.remote_state[idx] = QState::WantYes;
                None
            }
            QState::Yes | QState::WantYes | QState::WantYesOpposite => None,
        }
    }

    /// Request the peer stop performing `option` (sends DONT if needed).
    pub fn request_dont(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.remote_state[idx] {
            QState::Yes => {
                self.remote_state[idx] = QState::WantNo;
                Some(TelnetFrame::Dont(option))
            }
            QState::WantYes => {
                self.remote_state[idx] = QState::WantNoOpposite;
                None
            }
            QState::WantYesOpposite => {
                self.remote_state[idx] = QState::WantNo;
                None
            }
            QState::No | QState::WantNo | QState::WantNoOpposite => None,
        }
    }

    /// Dispatch a received negotiation frame through the Q-Method table.
    ///
    /// Returns the reply frame to send, if RFC 1143 calls for one. Never
    /// issues a request on a side that already has one outstanding.
    pub fn handle_received(&mut self, frame: TelnetFrame) -> CodecResult<Option<TelnetFrame>> {
        match frame {
            TelnetFrame::Will(option) => Ok(self.recv_will(option)),
            TelnetFrame::Wont(option) => Ok(self.recv_wont(option)),
            TelnetFrame::Do(option) => Ok(self.recv_do(option)),
            TelnetFrame::Dont(option) => Ok(self.recv_dont(option)),
            _ => Err(CodecError::NegotiationError {
                reason: "not a negotiation frame".into(),
                frame_type: Some(format!("{frame:?}")),
            }),
        }
    }

    // Received WILL affects the REMOTE-side state for `option`.
    fn recv_will(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.remote_state[idx] {
            QState::No => {
                if self.is_supported_remote(option) {
                    self.remote_state[idx] = QState::Yes;
                    Some(TelnetFrame::Do(option))
                } else {
                    Some(TelnetFrame::Dont(option))
                }
            }
            QState::Yes => None,
            QState::WantNo => {
                self.remote_state[idx] = QState::WantNoOpposite;
                Some(TelnetFrame::Dont(option))
            }
            QState::WantNoOpposite => {
                self.remote_state[idx] = QState::Yes;
                None
            }
            QState::WantYes => {
                self.remote_state[idx] = QState::Yes;
                None
            }
            QState::WantYesOpposite => {
                self.remote_state[idx] = QState::WantNo;
                Some(TelnetFrame::Dont(option))
            }
        }
    }

    // Received WONT affects the REMOTE-side state for `option`.
    fn recv_wont(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.remote_state[idx] {
            QState::No => None,
            QState::Yes => {
                self.remote_state[idx] = QState::No;
                Some(TelnetFrame::Dont(option))
            }
            QState::WantNo => {
                self.remote_state[idx] = QState::No;
                None
            }
            QState::WantNoOpposite => {
                self.remote_state[idx] = QState::WantYes;
                Some(TelnetFrame::Do(option))
            }
            QState::WantYes => {
                self.remote_state[idx] = QState::No;
                None
            }
            QState::WantYesOpposite => {
                self.remote_state[idx] = QState::No;
                None
            }
        }
    }

    // Received DO affects the LOCAL-side state for `option`.
    fn recv_do(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.local_state[idx] {
            QState::No => {
                if self.is_supported_local(option) {
                    self.local_state[idx] = QState::Yes;
                    Some(TelnetFrame::Will(option))
                } else {
                    Some(TelnetFrame::Wont(option))
                }
            }
            QState::Yes => None,
            QState::WantNo => {
                self.local_state[idx] = QState::WantNoOpposite;
                Some(TelnetFrame::Wont(option))
            }
            QState::WantNoOpposite => {
                self.local_state[idx] = QState::Yes;
                None
            }
            QState::WantYes => {
                self.local_state[idx] = QState::Yes;
                None
            }
            QState::WantYesOpposite => {
                self.local_state[idx] = QState::WantNo;
                Some(TelnetFrame::Wont(option))
            }
        }
    }

    // Received DONT affects the LOCAL-side state for `option`.
    fn recv_dont(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let idx = option.index();
        match self.local_state[idx] {
            QState::No => None,
            QState::Yes => {
                self.local_state[idx] = QState::No;
                Some(TelnetFrame::Wont(option))
            }
            QState::WantNo => {
                self.local_state[idx] = QState::No;
                None
            }
            QState::WantNoOpposite => {
                self.local_state[idx] = QState::WantYes;
                Some(TelnetFrame::Will(option))
            }
            QState::WantYes => {
                self.local_state[idx] = QState::No;
                None
            }
            QState::WantYesOpposite => {
                self.local_state[idx] = QState::No;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_round_trips_through_byte() {
        for opt in [
            TelnetOption::Echo,
            TelnetOption::SuppressGoAhead,
            TelnetOption::TerminalType,
            TelnetOption::Naws,
            TelnetOption::Linemode,
            TelnetOption::Unknown(200),
        ] {
            assert_eq!(TelnetOption::from_u8(opt.to_u8()), opt);
        }
    }

    #[test]
    fn qstate_defaults_to_no() {
        let options = TelnetOptions::new();
        assert_eq!(options.local_qstate(TelnetOption::Echo), QState::No);
        assert_eq!(options.remote_qstate(TelnetOption::Echo), QState::No);
    }

    #[test]
    fn request_will_from_no_sends_will_and_moves_to_wantyes() {
        let mut options = TelnetOptions::new();
        options.support_local(TelnetOption::Echo);
        let frame = options.request_will(TelnetOption::Echo);
        assert_eq!(frame, Some(TelnetFrame::Will(TelnetOption::Echo)));
        assert_eq!(options.local_qstate(TelnetOption::Echo), QState::WantYes);
    }

    #[test]
    fn request_will_while_wantyes_is_a_noop() {
        let mut options = TelnetOptions::new();
        options.support_local(TelnetOption::Echo);
        options.request_will(TelnetOption::Echo);
        let frame = options.request_will(TelnetOption::Echo);
        assert_eq!(frame, None);
    }

    #[test]
    fn full_local_enable_handshake_reaches_yes() {
        let mut options = TelnetOptions::new();
        options.support_local(TelnetOption::Echo);
        options.request_will(TelnetOption::Echo);
        let reply = options.recv_do(TelnetOption::Echo);
        assert_eq!(reply, None);
        assert_eq!(options.local_qstate(TelnetOption::Echo), QState::Yes);
        assert!(options.local_enabled(TelnetOption::Echo));
    }

    #[test]
    fn peer_will_for_unsupported_remote_option_is_refused() {
        let mut options = TelnetOptions::new();
        let reply = options.recv_will(TelnetOption::Linemode);
        assert_eq!(reply, Some(TelnetFrame::Dont(TelnetOption::Linemode)));
        assert_eq!(options.remote_qstate(TelnetOption::Linemode), QState::No);
    }

    #[test]
    fn peer_will_for_supported_remote_option_is_accepted() {
        let mut options = TelnetOptions::new();
        options.support_remote(TelnetOption::SuppressGoAhead);
        let reply = options.recv_will(TelnetOption::SuppressGoAhead);
        assert_eq!(reply, Some(TelnetFrame::Do(TelnetOption::SuppressGoAhead)));
        assert!(options.remote_enabled(TelnetOption::SuppressGoAhead));
    }

    #[test]
    fn collision_enable_local_while_wantno_queues_opposite() {
        let mut options = TelnetOptions::new();
        options.support_local(TelnetOption::Echo);
        options.request_will(TelnetOption::Echo);
        options.recv_do(TelnetOption::Echo); // -> Yes
        options.request_wont(TelnetOption::Echo); // -> WantNo, sends WONT
        let frame = options.request_will(TelnetOption::Echo);
        assert_eq!(frame, None);
        assert_eq!(
            options.local_qstate(TelnetOption::Echo),
            QState::WantNoOpposite
        );
    }

    #[test]
    fn recv_dont_while_wantnoopposite_resends_will() {
        let mut options = TelnetOptions::new();
        options.support_local(TelnetOption::Echo);
        options.request_will(TelnetOption::Echo);
        options.recv_do(TelnetOption::Echo);
        options.request_wont(TelnetOption::Echo);
        options.request_will(TelnetOption::Echo); // -> WantNoOpposite
        let reply = options.recv_dont(TelnetOption::Echo);
        assert_eq!(reply, Some(TelnetFrame::Will(TelnetOption::Echo)));
        assert_eq!(options.local_qstate(TelnetOption::Echo), QState::WantYes);
    }

    #[test]
    fn repeated_recv_wont_on_disabled_option_is_noop() {
        let mut options = TelnetOptions::new();
        assert_eq!(options.recv_wont(TelnetOption::Echo), None);
        assert_eq!(options.recv_wont(TelnetOption::Echo), None);
    }
}
