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

use crate::args::naws::WindowSize;
use crate::args::ttype::TerminalType;
use crate::option::TelnetOption;
use crate::result::CodecResult;
use bytes::{BufMut, BytesMut};

pub mod naws;
pub mod ttype;

/// A parsed `IAC SB ... IAC SE` subnegotiation payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelnetArgument {
    /// NAWS window size report.
    WindowSize(WindowSize),
    /// TERMINAL-TYPE IS/SEND exchange.
    TerminalType(TerminalType),
    /// Any option this crate does not interpret; the raw payload is preserved.
    Unknown(TelnetOption, BytesMut),
}

impl TelnetArgument {
    pub fn len(&self) -> usize {
        match self {
            TelnetArgument::WindowSize(inner) => inner.len(),
            TelnetArgument::TerminalType(inner) => inner.len(),
            TelnetArgument::Unknown(_option, payload) => payload.len(),
        }
    }

    pub fn encode<T: BufMut>(&self, dst: &mut T) -> CodecResult<()> {
        match self {
            TelnetArgument::WindowSize(inner) => inner.encode(dst),
            TelnetArgument::TerminalType(inner) => inner.encode(dst),
            TelnetArgument::Unknown(_option, payload) => dst.put_slice(payload),
        }
        Ok(())
    }

    pub fn option(&self) -> TelnetOption {
        match self {
            TelnetArgument::WindowSize(_) => TelnetOption::Naws,
            TelnetArgument::TerminalType(_) => TelnetOption::TerminalType,
            TelnetArgument::Unknown(option, _) => *option,
        }
    }
}

impl std::fmt::Display for TelnetArgument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetArgument::WindowSize(v) => write!(f, "{v}"),
            TelnetArgument::TerminalType(v) => write!(f, "{v}"),
            TelnetArgument::Unknown(o, v) => write!(f, "{o}-{v:?}"),
        }
    }
}
