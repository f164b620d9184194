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
use crate::option::{TelnetOption, TelnetSide};

/// A single decoded unit of the inbound Telnet stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelnetEvent {
    /// A single data byte, with any `IAC IAC` escape already collapsed.
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
    /// An option's negotiated state changed on the named side.
    OptionStatus(TelnetOption, TelnetSide, bool),
    /// A completed `IAC SB ... IAC SE` subnegotiation.
    Subnegotiate(TelnetArgument),
}
