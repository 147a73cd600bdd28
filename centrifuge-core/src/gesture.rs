//! Start/stop gesture state machine.
//!
//! The handler has two logical states, `Idle` and `Running`, stored in
//! [`MotorState`]. A notification is first checked against the current state
//! (no-ops skip the debounce), then resolved after the debounce wait with the
//! line level re-read by the caller.

use core::fmt;

use crate::countdown::CountdownState;
use crate::motor::{MotorState, StartRejected};

/// Edge notification delivered from interrupt context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerEvent {
    Start,
    Stop,
}

impl PowerEvent {
    const fn wants_running(self) -> bool {
        matches!(self, Self::Start)
    }
}

impl fmt::Display for PowerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// What a resolved gesture did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GestureOutcome {
    Started,
    Stopped,
    /// Start while no countdown is active.
    TimerNotConfigured,
    /// The line was released again before the debounce elapsed.
    Stale(PowerEvent),
    /// The motor was already in the requested state.
    AlreadyInState(PowerEvent),
}

impl fmt::Display for GestureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("motor started"),
            Self::Stopped => f.write_str("motor stopped"),
            Self::TimerNotConfigured => write!(f, "{StartRejected}"),
            Self::Stale(event) => write!(f, "stale {event} gesture ignored"),
            Self::AlreadyInState(event) => write!(f, "{event} ignored, already in state"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PowerGestureHandler<'a> {
    countdown: &'a CountdownState,
    motor: &'a MotorState,
}

impl<'a> PowerGestureHandler<'a> {
    #[must_use]
    pub const fn new(countdown: &'a CountdownState, motor: &'a MotorState) -> Self {
        Self { countdown, motor }
    }

    /// `false` when the motor already sits in the state `event` asks for.
    #[must_use]
    pub fn needs_debounce(&self, event: PowerEvent) -> bool {
        self.motor.is_running() != event.wants_running()
    }

    /// Applies `event` after the debounce wait, given the re-read line level.
    pub fn resolve(&self, event: PowerEvent, line_asserted: bool) -> GestureOutcome {
        if !self.needs_debounce(event) {
            return GestureOutcome::AlreadyInState(event);
        }
        if !line_asserted {
            return GestureOutcome::Stale(event);
        }
        match event {
            PowerEvent::Start => match self.motor.try_start(self.countdown) {
                Ok(()) => GestureOutcome::Started,
                Err(StartRejected) => GestureOutcome::TimerNotConfigured,
            },
            PowerEvent::Stop => {
                self.motor.stop();
                GestureOutcome::Stopped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_without_countdown_is_rejected() {
        let countdown = CountdownState::new();
        let motor = MotorState::new();
        let handler = PowerGestureHandler::new(&countdown, &motor);
        assert!(handler.needs_debounce(PowerEvent::Start));
        assert_eq!(
            handler.resolve(PowerEvent::Start, true),
            GestureOutcome::TimerNotConfigured
        );
        assert!(!motor.is_running());
    }

    #[test]
    fn released_line_makes_gesture_stale() {
        let countdown = CountdownState::new();
        let motor = MotorState::new();
        countdown.arm(100);
        let handler = PowerGestureHandler::new(&countdown, &motor);
        assert_eq!(
            handler.resolve(PowerEvent::Start, false),
            GestureOutcome::Stale(PowerEvent::Start)
        );
        assert!(!motor.is_running());
    }

    #[test]
    fn start_then_stop_round_trip() {
        let countdown = CountdownState::new();
        let motor = MotorState::new();
        countdown.arm(100);
        let handler = PowerGestureHandler::new(&countdown, &motor);
        assert_eq!(handler.resolve(PowerEvent::Start, true), GestureOutcome::Started);
        assert!(!handler.needs_debounce(PowerEvent::Start));
        assert_eq!(
            handler.resolve(PowerEvent::Start, true),
            GestureOutcome::AlreadyInState(PowerEvent::Start)
        );
        assert_eq!(handler.resolve(PowerEvent::Stop, true), GestureOutcome::Stopped);
        assert!(!motor.is_running());
    }
}
