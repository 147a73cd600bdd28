//! Presentation values for the countdown and clock displays.

use core::fmt::Write;

use heapless::String;

use crate::clock::DateTime;

/// Length of an `MM:SS` readout.
pub const COUNTDOWN_TEXT_LEN: usize = 5;
/// Length of an `HH:MM:SS` readout.
pub const CLOCK_TEXT_LEN: usize = 8;

const MAX_MINUTES: u32 = 99;

/// Remaining countdown time as shown on the 4-digit segment display.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CountdownReadout {
    pub minutes: u8,
    pub seconds: u8,
}

impl CountdownReadout {
    /// `00:00`, shown whenever no countdown is active.
    pub const IDLE: Self = Self {
        minutes: 0,
        seconds: 0,
    };

    /// Splits `remaining` seconds, saturating at `99:59`.
    #[must_use]
    pub fn from_remaining(remaining: u32) -> Self {
        let minutes = remaining / 60;
        if minutes > MAX_MINUTES {
            return Self {
                minutes: 99,
                seconds: 59,
            };
        }
        Self {
            minutes: u8::try_from(minutes).unwrap_or(99),
            seconds: u8::try_from(remaining % 60).unwrap_or(59),
        }
    }

    /// Digits for a colon-lit 4-digit display: `MM * 100 + SS`.
    #[must_use]
    pub fn segment_value(self) -> u16 {
        u16::from(self.minutes) * 100 + u16::from(self.seconds)
    }

    #[must_use]
    pub fn text(self) -> String<COUNTDOWN_TEXT_LEN> {
        let mut out = String::new();
        let _ = write!(out, "{:02}:{:02}", self.minutes, self.seconds);
        out
    }
}

/// Renders the clock as zero-padded `HH:MM:SS`.
#[must_use]
pub fn format_clock(now: &DateTime) -> String<CLOCK_TEXT_LEN> {
    let mut out = String::new();
    let _ = write!(out, "{:02}:{:02}:{:02}", now.hour, now.minute, now.second);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readout_splits_minutes_and_seconds() {
        let readout = CountdownReadout::from_remaining(63);
        assert_eq!(readout.text().as_str(), "01:03");
        assert_eq!(readout.segment_value(), 103);
        assert_eq!(CountdownReadout::IDLE.text().as_str(), "00:00");
    }

    #[test]
    fn readout_saturates() {
        let readout = CountdownReadout::from_remaining(200 * 60);
        assert_eq!(readout.text().as_str(), "99:59");
    }

    #[test]
    fn clock_is_zero_padded() {
        let now = DateTime {
            hour: 7,
            minute: 5,
            second: 9,
            ..DateTime::BOOT
        };
        assert_eq!(format_clock(&now).as_str(), "07:05:09");
    }
}
