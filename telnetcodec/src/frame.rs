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

use crate::args::TelnetArgument;
use crate::option::TelnetOption;

/// A single Telnet command, ready to hand to the encoder.
///
/// `TelnetFrame` is the *outbound* vocabulary: things this crate emits. The
/// decoder produces [`crate::event::TelnetEvent`] instead, since some inbound
/// conditions (completed negotiation) have no corresponding frame to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelnetFrame {
    /// A single data byte, escaped if it is `IAC`.
    Data(u8),
    NoOperation,
    DataMark,
    Break,
    InterruptProcess,
    AbortOutput,
    AreYouThere,
    EraseCharacter,
    EraseLine,
    GoAhead,
    EndOfRecord,
    Do(TelnetOption),
    Dont(TelnetOption),
    Will(TelnetOption),
    Wont(TelnetOption),
    Subnegotiate(TelnetArgument),
}
