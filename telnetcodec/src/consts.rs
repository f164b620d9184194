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

//! Raw protocol byte constants (RFC 854 command codes, RFC 855 option codes).

/// Interpret As Command
pub const IAC: u8 = 255;
/// End of subnegotiation parameters
pub const SE: u8 = 240;
/// No operation
pub const NOP: u8 = 241;
/// Data mark
pub const DM: u8 = 242;
/// Break
pub const BRK: u8 = 243;
/// Interrupt process
pub const IP: u8 = 244;
/// Abort output
pub const AO: u8 = 245;
/// Are you there
pub const AYT: u8 = 246;
/// Erase character
pub const EC: u8 = 247;
/// Erase line
pub const EL: u8 = 248;
/// Go ahead
pub const GA: u8 = 249;
/// Begin subnegotiation
pub const SB: u8 = 250;
/// Indicates the desire to begin performing an option
pub const WILL: u8 = 251;
/// Indicates the refusal to perform an option
pub const WONT: u8 = 252;
/// Indicates a request the other party perform an option
pub const DO: u8 = 253;
/// Indicates a demand the other party stop performing an option
pub const DONT: u8 = 254;
/// End of record (RFC 885)
pub const EOR: u8 = 239;

/// Carriage return
pub const CR: u8 = 0x0D;
/// Line feed
pub const LF: u8 = 0x0A;

/// Subnegotiation "IS" qualifier (TERMINAL-TYPE, etc.)
pub const IS: u8 = 0;
/// Subnegotiation "SEND" qualifier (TERMINAL-TYPE, etc.)
pub const SEND: u8 = 1;

/// Option byte codes for the options this codec understands.
pub mod option {
    pub const ECHO: u8 = 1;
    pub const SUPPRESS_GO_AHEAD: u8 = 3;
    pub const TERMINAL_TYPE: u8 = 24;
    pub const NAWS: u8 = 31;
    pub const LINEMODE: u8 = 34;
}
