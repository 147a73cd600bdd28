//! Keypad input accumulation.
//!
//! The parser consumes one key at a time. `A`/`B` select a mode and reset the
//! buffer, digits accumulate (keeping only the newest four), and `#` submits
//! the buffer for validation. Every other key is ignored.

use core::fmt;

use heapless::Vec;

use crate::command::{Command, InputMode, PAYLOAD_DIGITS, ValidationError};

/// Key that submits the pending digits.
pub const TERMINATOR: char = '#';

/// Classification of a raw keypad character.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Mode(InputMode),
    Digit(char),
    Terminator,
    Other(char),
}

impl Key {
    #[must_use]
    pub const fn classify(raw: char) -> Self {
        if let Some(mode) = InputMode::from_key(raw) {
            Self::Mode(mode)
        } else if raw == TERMINATOR {
            Self::Terminator
        } else if raw.is_ascii_digit() {
            Self::Digit(raw)
        } else {
            Self::Other(raw)
        }
    }
}

/// Mode tag plus up to four pending digits, owned by the keypad parser.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InputBuffer {
    mode: Option<InputMode>,
    digits: Vec<u8, PAYLOAD_DIGITS>,
}

impl InputBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: None,
            digits: Vec::new(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Option<InputMode> {
        self.mode
    }

    /// Pending digits, oldest first.
    #[must_use]
    pub fn digits(&self) -> &str {
        // Only ASCII digits are ever pushed.
        core::str::from_utf8(&self.digits).unwrap_or_default()
    }

    /// Clears the digits and tags the buffer with `mode`.
    pub fn select(&mut self, mode: InputMode) {
        self.digits.clear();
        self.mode = Some(mode);
    }

    /// Drops both the mode tag and the digits.
    pub fn clear(&mut self) {
        self.digits.clear();
        self.mode = None;
    }

    /// Appends `digit`, shifting out the oldest one when the buffer is full.
    pub fn push_digit(&mut self, digit: char) -> DigitOutcome {
        let Ok(byte) = u8::try_from(digit) else {
            return DigitOutcome::Appended;
        };
        if self.digits.is_full() {
            self.digits.remove(0);
            // Cannot fail: one slot was just freed.
            let _ = self.digits.push(byte);
            DigitOutcome::Shifted
        } else {
            let _ = self.digits.push(byte);
            DigitOutcome::Appended
        }
    }
}

/// Effect of pushing a digit into a full or partially filled buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigitOutcome {
    Appended,
    Shifted,
}

/// Result of feeding one key into the parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeypadEvent {
    /// A mode key reset the buffer.
    ModeSelected(InputMode),
    /// A digit was buffered.
    Digit(DigitOutcome),
    /// A digit arrived before any mode key and was discarded.
    NoModeSelected,
    /// The terminator produced a valid command; the buffer is now empty.
    Submitted(Command),
    /// The terminator found an invalid entry; the buffer is now empty.
    Rejected {
        mode: Option<InputMode>,
        error: ValidationError,
    },
    /// Key without a meaning in the grammar.
    Ignored(char),
}

impl fmt::Display for KeypadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeSelected(mode) => write!(f, "mode {} selected", mode.label()),
            Self::Digit(DigitOutcome::Appended) => f.write_str("digit buffered"),
            Self::Digit(DigitOutcome::Shifted) => f.write_str("digit buffered, oldest dropped"),
            Self::NoModeSelected => f.write_str("no mode selected, press A or B"),
            Self::Submitted(command) => write!(f, "submitted {command}"),
            Self::Rejected {
                mode: Some(mode),
                error,
            } => write!(f, "rejected {}: {error}; use {}", mode.label(), mode.format_hint()),
            Self::Rejected { mode: None, error } => write!(f, "rejected: {error}"),
            Self::Ignored(key) => write!(f, "ignored key {key}"),
        }
    }
}

/// Keypad grammar state machine.
#[derive(Clone, Debug, Default)]
pub struct InputParser {
    buffer: InputBuffer,
}

impl InputParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: InputBuffer::new(),
        }
    }

    #[must_use]
    pub const fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    /// Applies one keypad character.
    pub fn feed(&mut self, raw: char) -> KeypadEvent {
        match Key::classify(raw) {
            Key::Mode(mode) => {
                self.buffer.select(mode);
                KeypadEvent::ModeSelected(mode)
            }
            Key::Terminator => self.submit(),
            Key::Digit(digit) => {
                if self.buffer.mode().is_none() {
                    KeypadEvent::NoModeSelected
                } else {
                    KeypadEvent::Digit(self.buffer.push_digit(digit))
                }
            }
            Key::Other(other) => KeypadEvent::Ignored(other),
        }
    }

    fn submit(&mut self) -> KeypadEvent {
        let mode = self.buffer.mode();
        let result = match mode {
            Some(mode) => Command::parse(mode, self.buffer.digits()),
            None => Err(ValidationError::NoModeSelected),
        };
        self.buffer.clear();
        match result {
            Ok(command) => KeypadEvent::Submitted(command),
            Err(error) => KeypadEvent::Rejected { mode, error },
        }
    }
}
