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

//! Character-at-a-time line editor sitting above the Telnet/byte layer.
//!
//! Accumulates a current line byte-by-byte, applying local echo, backspace,
//! and CR/LF folding, and hands whole lines up to the dispatcher. Decoding to
//! UTF-8 happens only at line-assembly time, so a multi-byte character split
//! across reads never corrupts the buffer.

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;

/// One outcome of feeding a byte to the [`LineEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Bytes that should be echoed back to the client verbatim.
    Echo(Vec<u8>),
    /// A complete line, decoded lossily as UTF-8.
    LineReady(String),
    /// Ctrl-C: terminate the session with reason *client-interrupt*.
    Interrupt,
    /// Ctrl-D on an empty buffer: orderly close.
    OrderlyClose,
}

/// Accumulates one line of client input at a time.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: Vec<u8>,
    echo: bool,
    pending_cr: bool,
}

impl LineEditor {
    pub fn new(echo: bool) -> Self {
        Self {
            buffer: Vec::new(),
            echo,
            pending_cr: false,
        }
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Feed one byte of cleaned (post-Telnet) input, returning zero or more events.
    pub fn push_byte(&mut self, byte: u8) -> Vec<LineEvent> {
        let mut events = Vec::new();

        if self.pending_cr {
            self.pending_cr = false;
            if byte == LF {
                events.push(self.emit_line());
                return events;
            }
            events.push(self.emit_line());
            // fall through: `byte` still needs processing as a fresh character.
        }

        match byte {
            CR => self.pending_cr = true,
            LF => events.push(self.emit_line()),
            BACKSPACE | DELETE => {
                if self.buffer.pop().is_some() && self.echo {
                    events.push(LineEvent::Echo(vec![BACKSPACE, b' ', BACKSPACE]));
                }
            }
            CTRL_C => events.push(LineEvent::Interrupt),
            CTRL_D if self.buffer.is_empty() => events.push(LineEvent::OrderlyClose),
            b if (0x20..0x7F).contains(&b) || b >= 0xA0 => {
                self.buffer.push(b);
                if self.echo {
                    events.push(LineEvent::Echo(vec![b]));
                }
            }
            _ => {}
        }

        events
    }

    fn emit_line(&mut self) -> LineEvent {
        let bytes = std::mem::take(&mut self.buffer);
        LineEvent::LineReady(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(editor: &mut LineEditor, bytes: &[u8]) -> Vec<LineEvent> {
        bytes.iter().flat_map(|&b| editor.push_byte(b)).collect()
    }

    #[test]
    fn crlf_produces_exactly_one_line() {
        let mut editor = LineEditor::new(false);
        let events = feed(&mut editor, b"hello\r\n");
        assert_eq!(events, vec![LineEvent::LineReady("hello".to_string())]);
    }

    #[test]
    fn bare_lf_produces_exactly_one_line() {
        let mut editor = LineEditor::new(false);
        let events = feed(&mut editor, b"hello\n");
        assert_eq!(events, vec![LineEvent::LineReady("hello".to_string())]);
    }

    #[test]
    fn cr_alone_followed_by_non_lf_still_produces_one_line() {
        let mut editor = LineEditor::new(false);
        let events = feed(&mut editor, b"hi\rx");
        assert_eq!(
            events,
            vec![LineEvent::LineReady("hi".to_string())]
        );
        // the 'x' that followed the lone CR starts the next line
        let events = feed(&mut editor, b"\n");
        assert_eq!(events, vec![LineEvent::LineReady("x".to_string())]);
    }

    #[test]
    fn backspace_on_empty_buffer_is_a_noop() {
        let mut editor = LineEditor::new(true);
        assert_eq!(editor.push_byte(BACKSPACE), Vec::new());
    }

    #[test]
    fn backspace_with_echo_removes_last_char_and_echoes() {
        let mut editor = LineEditor::new(true);
        editor.push_byte(b'a');
        editor.push_byte(b'b');
        let events = editor.push_byte(BACKSPACE);
        assert_eq!(
            events,
            vec![LineEvent::Echo(vec![BACKSPACE, b' ', BACKSPACE])]
        );
        let events = feed(&mut editor, b"c\r\n");
        assert_eq!(events.last(), Some(&LineEvent::LineReady("ac".to_string())));
    }

    #[test]
    fn ctrl_c_interrupts_regardless_of_buffer_contents() {
        let mut editor = LineEditor::new(false);
        editor.push_byte(b'a');
        assert_eq!(editor.push_byte(CTRL_C), vec![LineEvent::Interrupt]);
    }

    #[test]
    fn ctrl_d_on_empty_buffer_closes_but_not_otherwise() {
        let mut editor = LineEditor::new(false);
        assert_eq!(editor.push_byte(CTRL_D), vec![LineEvent::OrderlyClose]);

        let mut editor = LineEditor::new(false);
        editor.push_byte(b'a');
        assert_eq!(editor.push_byte(CTRL_D), Vec::new());
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut editor = LineEditor::new(false);
        editor.push_byte(0xA0);
        let events = editor.push_byte(LF);
        assert_eq!(events.len(), 1);
        if let LineEvent::LineReady(line) = &events[0] {
            assert!(line.contains('\u{FFFD}'));
        } else {
            panic!("expected a line");
        }
    }
}
