//! Synchronous adapter traits for the controller's external collaborators.
//!
//! The firmware implements these over STM32 peripherals; tests and the
//! emulator implement them over plain memory.

use crate::buttons::IndicatorPattern;
use crate::clock::DateTime;
use crate::config::SPEED_INPUTS;
use crate::display::CountdownReadout;
use crate::motor::{Direction, SpeedSelection};

/// Character-matrix keypad.
pub trait Keypad {
    /// Returns the newly pressed key, if any, without blocking.
    fn read_key(&mut self) -> Option<char>;
}

/// Wall-clock source that can be rebased.
pub trait RealTimeClock {
    type Error;

    fn now(&mut self) -> Result<DateTime, Self::Error>;

    fn adjust(&mut self, time: DateTime) -> Result<(), Self::Error>;
}

/// 4-digit 7-segment display showing the countdown.
pub trait SegmentDisplay {
    type Error;

    fn init(&mut self) -> Result<(), Self::Error>;

    fn show_countdown(&mut self, readout: CountdownReadout) -> Result<(), Self::Error>;
}

/// Text display showing the clock.
pub trait TextDisplay {
    type Error;

    fn init(&mut self) -> Result<(), Self::Error>;

    fn show_text(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Stepper driver advanced one full step at a time.
pub trait Stepper {
    fn set_speed(&mut self, speed: SpeedSelection);

    fn step(&mut self, direction: Direction);
}

pub trait Buzzer {
    fn set_sounding(&mut self, sounding: bool);
}

/// Speed indicator LEDs.
pub trait IndicatorBank {
    fn apply(&mut self, pattern: IndicatorPattern);
}

/// The four speed-select buttons, sampled together.
pub trait SpeedInputs {
    /// Pressed level of every button, indexed by ordinal.
    fn sample(&mut self) -> [bool; SPEED_INPUTS];
}

/// Level of a start or stop line.
pub trait InputLine {
    fn is_asserted(&self) -> bool;
}

impl<T: InputLine + ?Sized> InputLine for &T {
    fn is_asserted(&self) -> bool {
        (**self).is_asserted()
    }
}
