//! Telemetry event catalog and history ring shared by firmware and host targets.
//!
//! Every diagnostic the controller reports is a [`TelemetryEventKind`]. Records
//! are advisory: they are logged and kept in a bounded ring for inspection,
//! and no control decision ever reads them back.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::command::{Command, InputMode, TimeOfDay, ValidationError};
use crate::countdown::{ArmError, Armed, ExpiryOutcome};
use crate::gesture::{GestureOutcome, PowerEvent};
use crate::keypad::KeypadEvent;
use crate::motor::SpeedSelection;

/// Sequential identifier assigned to each record.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Display that failed to initialise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisplayId {
    Countdown,
    Clock,
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Countdown => f.write_str("countdown"),
            Self::Clock => f.write_str("clock"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    ModeSelected(InputMode),
    DigitWithoutMode,
    InputRejected {
        mode: Option<InputMode>,
        error: ValidationError,
    },
    CommandQueued(Command),
    CountdownArmed {
        total_seconds: u32,
        end_unix: u64,
    },
    ArmFailed(ArmError),
    CountdownExpired,
    BuzzerToggled {
        sounding: bool,
    },
    CountdownFinished(ExpiryOutcome),
    ClockAdjusted(TimeOfDay),
    ClockUnavailable,
    MotorStarted,
    MotorStopped,
    StartRejected,
    StaleGesture(PowerEvent),
    SpeedSelected {
        input: u8,
        speed: SpeedSelection,
    },
    SpeedApplied(SpeedSelection),
    DisplayUnavailable(DisplayId),
}

impl TelemetryEventKind {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::DigitWithoutMode
            | Self::InputRejected { .. }
            | Self::StartRejected
            | Self::StaleGesture(_) => Severity::Warn,
            Self::ArmFailed(_) | Self::ClockUnavailable | Self::DisplayUnavailable(_) => {
                Severity::Error
            }
            _ => Severity::Info,
        }
    }

    /// Keypad parser events worth reporting; plain digit echoes are not.
    #[must_use]
    pub const fn from_keypad(event: &KeypadEvent) -> Option<Self> {
        match *event {
            KeypadEvent::ModeSelected(mode) => Some(Self::ModeSelected(mode)),
            KeypadEvent::NoModeSelected => Some(Self::DigitWithoutMode),
            KeypadEvent::Rejected { mode, error } => Some(Self::InputRejected { mode, error }),
            KeypadEvent::Submitted(_) | KeypadEvent::Digit(_) | KeypadEvent::Ignored(_) => None,
        }
    }

    /// Gesture outcomes worth reporting; repeated notifications are not.
    #[must_use]
    pub const fn from_gesture(outcome: GestureOutcome) -> Option<Self> {
        match outcome {
            GestureOutcome::Started => Some(Self::MotorStarted),
            GestureOutcome::Stopped => Some(Self::MotorStopped),
            GestureOutcome::TimerNotConfigured => Some(Self::StartRejected),
            GestureOutcome::Stale(event) => Some(Self::StaleGesture(event)),
            GestureOutcome::AlreadyInState(_) => None,
        }
    }

    #[must_use]
    pub const fn armed(armed: &Armed) -> Self {
        Self::CountdownArmed {
            total_seconds: armed.total_seconds,
            end_unix: armed.end_unix,
        }
    }
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeSelected(mode) => write!(f, "mode-selected {mode}"),
            Self::DigitWithoutMode => f.write_str("no mode selected, press A or B"),
            Self::InputRejected {
                mode: Some(mode),
                error,
            } => write!(
                f,
                "input-rejected {mode}: {error}; expected {}",
                mode.format_hint()
            ),
            Self::InputRejected { mode: None, error } => write!(f, "input-rejected: {error}"),
            Self::CommandQueued(command) => write!(f, "command-queued {command}"),
            Self::CountdownArmed {
                total_seconds,
                end_unix,
            } => write!(f, "countdown-armed {total_seconds}s end={end_unix}"),
            Self::ArmFailed(error) => write!(f, "countdown-arm-failed: {error}"),
            Self::CountdownExpired => f.write_str("countdown-expired"),
            Self::BuzzerToggled { sounding: true } => f.write_str("buzzer on"),
            Self::BuzzerToggled { sounding: false } => f.write_str("buzzer off"),
            Self::CountdownFinished(outcome) => write!(
                f,
                "countdown-finished cleared={} motor-was-running={}",
                outcome.cleared, outcome.motor_was_running
            ),
            Self::ClockAdjusted(time) => write!(f, "clock-adjusted {time}"),
            Self::ClockUnavailable => f.write_str("clock-unavailable"),
            Self::MotorStarted => f.write_str("motor-started"),
            Self::MotorStopped => f.write_str("motor-stopped"),
            Self::StartRejected => f.write_str("start-rejected: configure the timer first"),
            Self::StaleGesture(event) => write!(f, "stale-gesture {event}"),
            Self::SpeedSelected { input, speed } => {
                write!(f, "speed-selected button={} {speed}", input + 1)
            }
            Self::SpeedApplied(speed) => write!(f, "speed-applied {speed}"),
            Self::DisplayUnavailable(display) => write!(f, "display-unavailable {display}"),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<TInstant> {
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: TelemetryEventKind,
}

/// Bounded history of the most recent telemetry records.
pub struct TelemetryLog<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord<TInstant>, CAPACITY>,
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize> TelemetryLog<TInstant, CAPACITY>
where
    TInstant: Copy,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Appends a record, evicting the oldest once full.
    pub fn record(&mut self, event: TelemetryEventKind, timestamp: TInstant) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });
        id
    }

    /// Records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord<TInstant>> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// `true` if any retained record matches `predicate`.
    pub fn contains(&self, mut predicate: impl FnMut(&TelemetryEventKind) -> bool) -> bool {
        self.ring
            .oldest_ordered()
            .any(|record| predicate(&record.event))
    }
}

impl<TInstant, const CAPACITY: usize> Default for TelemetryLog<TInstant, CAPACITY>
where
    TInstant: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}
