//! Stepper, buzzer, indicator and speed-button adapters.

use centrifuge_core::buttons::IndicatorPattern;
use centrifuge_core::config::SPEED_INPUTS;
use centrifuge_core::hal::{Buzzer, IndicatorBank, SpeedInputs, Stepper};
use centrifuge_core::motor::{Direction, SpeedSelection};
use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, block_for};

/// Minimum STEP high time accepted by common step/dir drivers.
const STEP_PULSE: Duration = Duration::from_micros(2);

pub struct GpioStepper {
    step: Output<'static>,
    dir: Output<'static>,
    speed: SpeedSelection,
}

impl GpioStepper {
    pub fn new(step: Output<'static>, dir: Output<'static>) -> Self {
        Self {
            step,
            dir,
            speed: SpeedSelection::DEFAULT,
        }
    }
}

impl Stepper for GpioStepper {
    fn set_speed(&mut self, speed: SpeedSelection) {
        if speed != self.speed {
            defmt::debug!("stepper: {} -> {} rpm", self.speed.rpm(), speed.rpm());
        }
        self.speed = speed;
    }

    fn step(&mut self, direction: Direction) {
        match direction {
            Direction::Clockwise => self.dir.set_high(),
            Direction::CounterClockwise => self.dir.set_low(),
        }
        self.step.set_high();
        block_for(STEP_PULSE);
        self.step.set_low();
    }
}

pub struct GpioBuzzer(Output<'static>);

impl GpioBuzzer {
    pub fn new(pin: Output<'static>) -> Self {
        Self(pin)
    }
}

impl Buzzer for GpioBuzzer {
    fn set_sounding(&mut self, sounding: bool) {
        if sounding {
            self.0.set_high();
        } else {
            self.0.set_low();
        }
    }
}

pub struct LedBank([Output<'static>; SPEED_INPUTS]);

impl LedBank {
    pub fn new(leds: [Output<'static>; SPEED_INPUTS]) -> Self {
        Self(leds)
    }
}

impl IndicatorBank for LedBank {
    fn apply(&mut self, pattern: IndicatorPattern) {
        for (led, on) in self.0.iter_mut().zip(pattern.levels()) {
            if on {
                led.set_high();
            } else {
                led.set_low();
            }
        }
    }
}

/// Active-low momentary buttons with pull-ups.
pub struct SpeedButtons([Input<'static>; SPEED_INPUTS]);

impl SpeedButtons {
    pub fn new(buttons: [Input<'static>; SPEED_INPUTS]) -> Self {
        Self(buttons)
    }
}

impl SpeedInputs for SpeedButtons {
    fn sample(&mut self) -> [bool; SPEED_INPUTS] {
        core::array::from_fn(|index| self.0[index].is_low())
    }
}
