//! Line framing for the serial link.
//!
//! Bytes arrive one at a time from the UART (or stdin on the host). The
//! assembler folds them into trimmed, upper-cased lines and flags lines that
//! overflowed or carried control bytes so the dispatcher can reject them.

use core::{fmt, str};

use heapless::Vec;
use log::warn;

/// Maximum number of bytes retained on a single line (excluding terminator).
pub const MAX_LINE_LEN: usize = 64;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Framing problem detected while assembling a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Input exceeded [`MAX_LINE_LEN`]; the tail was dropped.
    Overflow,
    /// A byte outside printable ASCII was received and dropped.
    InvalidByte(u8),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Overflow => write!(f, "line longer than {MAX_LINE_LEN} bytes"),
            LineError::InvalidByte(byte) => write!(f, "invalid byte 0x{byte:02x}"),
        }
    }
}

/// Completed line handed to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// Trimmed, upper-cased text (the retained prefix when flagged).
    pub text: &'a str,
    /// First framing problem seen on the line, if any.
    pub error: Option<LineError>,
}

/// Accumulates serial bytes into complete lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8, MAX_LINE_LEN>,
    error: Option<LineError>,
    after_cr: bool,
    consumed: bool,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            error: None,
            after_cr: false,
            consumed: false,
        }
    }

    /// Feeds a single byte. Returns a line when `byte` terminates a non-blank one.
    ///
    /// `\r`, `\n` and `\r\n` each end exactly one line.
    pub fn push(&mut self, byte: u8) -> Option<Line<'_>> {
        if self.consumed {
            self.reset();
        }

        let after_cr = core::mem::replace(&mut self.after_cr, byte == b'\r');
        match byte {
            b'\n' if after_cr => None,
            b'\r' | b'\n' => self.finish(),
            BACKSPACE | DELETE => {
                self.buffer.pop();
                None
            }
            b'\t' | b' '..=b'~' => {
                if self.buffer.push(byte).is_err() && self.error.is_none() {
                    warn!("serial line exceeds {} bytes; truncating", MAX_LINE_LEN);
                    self.error = Some(LineError::Overflow);
                }
                None
            }
            other => {
                if self.error.is_none() {
                    self.error = Some(LineError::InvalidByte(other));
                }
                None
            }
        }
    }

    /// Bytes buffered for the line in progress.
    pub fn pending(&self) -> &[u8] {
        if self.consumed {
            &[]
        } else {
            self.buffer.as_slice()
        }
    }

    /// Discards any partially assembled line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.error = None;
        self.consumed = false;
    }

    fn finish(&mut self) -> Option<Line<'_>> {
        self.buffer.make_ascii_uppercase();
        let blank = self.buffer.iter().all(u8::is_ascii_whitespace);
        if blank && self.error.is_none() {
            self.buffer.clear();
            return None;
        }

        self.consumed = true;
        // Only printable ASCII is ever buffered.
        let text = str::from_utf8(&self.buffer).unwrap_or_default().trim();
        Some(Line {
            text,
            error: self.error,
        })
    }
}
