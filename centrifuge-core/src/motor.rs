//! Motor run flag and speed selection.

use core::fmt;
use core::time::Duration;

use portable_atomic::{AtomicBool, Ordering};

use crate::config::{DEFAULT_SPEED_RPM, SPEED_INPUTS, SPEED_TABLE, STEPS_PER_REVOLUTION};
use crate::countdown::CountdownState;

/// Shared `running` flag read by the drive loop every cycle.
#[derive(Debug, Default)]
pub struct MotorState {
    running: AtomicBool,
}

/// A start gesture arrived with no active countdown.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StartRejected;

impl fmt::Display for StartRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("configure the timer first")
    }
}

impl MotorState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Sets `running` only while `countdown` is active.
    ///
    /// The countdown is re-read after the store so an expiry that lands
    /// between the check and the store cannot leave the motor running.
    pub fn try_start(&self, countdown: &CountdownState) -> Result<(), StartRejected> {
        if !countdown.is_active() {
            return Err(StartRejected);
        }
        self.running.store(true, Ordering::SeqCst);
        if countdown.is_active() {
            Ok(())
        } else {
            self.running.store(false, Ordering::SeqCst);
            Err(StartRejected)
        }
    }

    /// Stop gesture.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Expiry path; returns whether the motor had been running.
    pub fn force_stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }
}

/// Rotation direction of a single step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// Fixed rotation direction of the centrifuge rotor.
pub const DRIVE_DIRECTION: Direction = Direction::Clockwise;

/// Step rate in revolutions per minute; never zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpeedSelection {
    rpm: u16,
}

impl SpeedSelection {
    /// Speed driven before any button press.
    pub const DEFAULT: Self = Self {
        rpm: DEFAULT_SPEED_RPM,
    };

    #[must_use]
    pub const fn new(rpm: u16) -> Option<Self> {
        if rpm == 0 {
            None
        } else {
            Some(Self { rpm })
        }
    }

    /// Speed assigned to the button at `index`.
    #[must_use]
    pub const fn for_input(index: usize) -> Option<Self> {
        if index < SPEED_INPUTS {
            Self::new(SPEED_TABLE[index])
        } else {
            None
        }
    }

    #[must_use]
    pub const fn rpm(self) -> u16 {
        self.rpm
    }

    /// Delay between two full steps at this speed.
    #[must_use]
    pub const fn step_interval(self) -> Duration {
        let steps_per_minute = STEPS_PER_REVOLUTION as u64 * self.rpm as u64;
        Duration::from_micros(60_000_000 / steps_per_minute)
    }
}

impl Default for SpeedSelection {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SpeedSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rpm", self.rpm)
    }
}
