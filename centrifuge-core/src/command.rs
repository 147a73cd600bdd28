//! Typed commands produced by the keypad parser.
//!
//! A command payload is always four digits split into two fields. The two
//! modes deliberately keep separate bounds for the first field: a countdown
//! accepts `MM < 60`, a clock adjustment accepts `HH < 24`. Both second fields
//! must be below 60.

use core::fmt;
use core::time::Duration;

use winnow::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

/// Number of digits carried by every command payload.
pub const PAYLOAD_DIGITS: usize = 4;

const MINUTE_LIMIT: u8 = 60;
const SECOND_LIMIT: u8 = 60;
const HOUR_LIMIT: u8 = 24;

/// Keypad mode selected by the `A`/`B` keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputMode {
    /// `A`: program the motor countdown (`MMSS`).
    Duration,
    /// `B`: set the wall clock (`HHMM`).
    Clock,
}

impl InputMode {
    /// Maps a keypad character onto a mode.
    #[must_use]
    pub const fn from_key(key: char) -> Option<Self> {
        match key {
            'A' => Some(Self::Duration),
            'B' => Some(Self::Clock),
            _ => None,
        }
    }

    /// Operator-facing name of the setting the mode edits.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Duration => "motor timer",
            Self::Clock => "clock",
        }
    }

    /// Payload layout expected by the mode.
    #[must_use]
    pub const fn format_hint(self) -> &'static str {
        match self {
            Self::Duration => "MMSS (MM=00-59, SS=00-59)",
            Self::Clock => "HHMM (HH=00-23, MM=00-59)",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Field named by a validation failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Hours,
    Minutes,
    Seconds,
}

impl Field {
    const fn label(self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }
}

/// Reasons a keypad entry cannot become a [`Command`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationError {
    /// A terminator arrived before any mode key.
    NoModeSelected,
    /// The payload is not exactly four decimal digits.
    Malformed { digits: u8 },
    /// A field is outside its mode-specific range.
    OutOfRange { field: Field, value: u8, limit: u8 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModeSelected => f.write_str("no mode selected, press A or B first"),
            Self::Malformed { digits } => {
                write!(f, "expected {PAYLOAD_DIGITS} digits, got {digits}")
            }
            Self::OutOfRange {
                field,
                value,
                limit,
            } => write!(f, "{} {value} must be below {limit}", field.label()),
        }
    }
}

/// Countdown length entered in `A` mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CountdownDuration {
    minutes: u8,
    seconds: u8,
}

impl CountdownDuration {
    /// Validates and builds a countdown length.
    pub const fn new(minutes: u8, seconds: u8) -> Result<Self, ValidationError> {
        if minutes >= MINUTE_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: Field::Minutes,
                value: minutes,
                limit: MINUTE_LIMIT,
            });
        }
        if seconds >= SECOND_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: Field::Seconds,
                value: seconds,
                limit: SECOND_LIMIT,
            });
        }
        Ok(Self { minutes, seconds })
    }

    /// Whole countdown length in seconds.
    #[must_use]
    pub const fn total_seconds(self) -> u32 {
        self.minutes as u32 * 60 + self.seconds as u32
    }

    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.total_seconds() as u64)
    }
}

impl fmt::Display for CountdownDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Wall-clock hour and minute entered in `B` mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeOfDay {
    hours: u8,
    minutes: u8,
}

impl TimeOfDay {
    /// Validates and builds a time of day.
    pub const fn new(hours: u8, minutes: u8) -> Result<Self, ValidationError> {
        if hours >= HOUR_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: Field::Hours,
                value: hours,
                limit: HOUR_LIMIT,
            });
        }
        if minutes >= MINUTE_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: Field::Minutes,
                value: minutes,
                limit: MINUTE_LIMIT,
            });
        }
        Ok(Self { hours, minutes })
    }

    #[must_use]
    pub const fn hours(self) -> u8 {
        self.hours
    }

    #[must_use]
    pub const fn minutes(self) -> u8 {
        self.minutes
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

/// Validated keypad command, moved by value through its channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    SetDuration(CountdownDuration),
    SetClock(TimeOfDay),
}

impl Command {
    /// Parses a four-digit payload according to the active mode.
    pub fn parse(mode: InputMode, payload: &str) -> Result<Self, ValidationError> {
        let (first, second) = split_payload(payload)?;
        match mode {
            InputMode::Duration => CountdownDuration::new(first, second).map(Self::SetDuration),
            InputMode::Clock => TimeOfDay::new(first, second).map(Self::SetClock),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetDuration(duration) => write!(f, "set-duration {duration}"),
            Self::SetClock(time) => write!(f, "set-clock {time}"),
        }
    }
}

fn two_digit_field(input: &mut &str) -> ModalResult<u8> {
    take_while(2, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<u8>)
        .parse_next(input)
}

fn split_payload(payload: &str) -> Result<(u8, u8), ValidationError> {
    (two_digit_field, two_digit_field)
        .parse(payload)
        .map_err(|_| ValidationError::Malformed {
            digits: u8::try_from(payload.chars().filter(char::is_ascii_digit).count())
                .unwrap_or(u8::MAX),
        })
}
