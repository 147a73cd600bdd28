//! Timing and sizing constants shared by firmware and host targets.
//!
//! The defaults reproduce the controller's field behavior: a 50 ms keypad
//! poll, 50 ms debounce on every physical input, a 500 ms settle window after
//! a speed selection, and one-second display and alarm phases. Tasks receive a
//! [`TimingConfig`] at construction so tests and the emulator can compress the
//! intervals without touching the task logic.

use core::time::Duration;

/// Depth of the duration and clock-set command channels.
pub const COMMAND_QUEUE_DEPTH: usize = 10;
/// Depth of the speed-selection channel.
pub const SPEED_QUEUE_DEPTH: usize = 10;

/// Number of buzzer toggles emitted per countdown expiry (three on/off cycles).
pub const ALARM_TOGGLES: u8 = 6;

/// Full steps per output shaft revolution for the centrifuge stepper.
pub const STEPS_PER_REVOLUTION: u32 = 200;
/// Step rate applied at boot before any speed button is pressed.
pub const DEFAULT_SPEED_RPM: u16 = 60;
/// Speed (rpm) selected by each button, indexed by button ordinal.
pub const SPEED_TABLE: [u16; SPEED_INPUTS] = [10, 35, 60, 120];
/// Number of speed-select buttons and matching indicators.
pub const SPEED_INPUTS: usize = 4;

/// Sleep between keypad polls.
pub const KEYPAD_POLL: Duration = Duration::from_millis(50);
/// Debounce wait before re-reading a start/stop line.
pub const GESTURE_DEBOUNCE: Duration = Duration::from_millis(50);
/// Bounded wait on the start/stop mailbox before looping.
pub const NOTIFY_WAIT: Duration = Duration::from_millis(500);
/// Idle period between speed-button scans.
pub const BUTTON_SCAN_PERIOD: Duration = Duration::from_millis(10);
/// Minimum spacing between two accepted presses of the same speed button.
pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(50);
/// Window after an accepted press during which every speed button is ignored.
pub const BUTTON_SETTLE: Duration = Duration::from_millis(500);
/// Receive timeout used by the drive task when polling the speed channel.
pub const SPEED_POLL: Duration = Duration::from_millis(10);
/// Refresh period of both display tasks.
pub const DISPLAY_PERIOD: Duration = Duration::from_secs(1);
/// Length of each buzzer on/off phase.
pub const ALARM_PHASE: Duration = Duration::from_secs(1);

/// Runtime timing knobs handed to every task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub keypad_poll: Duration,
    pub gesture_debounce: Duration,
    pub notify_wait: Duration,
    pub button_scan_period: Duration,
    pub button_debounce: Duration,
    pub button_settle: Duration,
    pub speed_poll: Duration,
    pub display_period: Duration,
    pub alarm_phase: Duration,
}

impl TimingConfig {
    /// Field defaults.
    pub const DEFAULT: Self = Self {
        keypad_poll: KEYPAD_POLL,
        gesture_debounce: GESTURE_DEBOUNCE,
        notify_wait: NOTIFY_WAIT,
        button_scan_period: BUTTON_SCAN_PERIOD,
        button_debounce: BUTTON_DEBOUNCE,
        button_settle: BUTTON_SETTLE,
        speed_poll: SPEED_POLL,
        display_period: DISPLAY_PERIOD,
        alarm_phase: ALARM_PHASE,
    };

    /// Every interval collapsed to `interval`, handy for host tests.
    #[must_use]
    pub const fn uniform(interval: Duration) -> Self {
        Self {
            keypad_poll: interval,
            gesture_debounce: interval,
            notify_wait: interval,
            button_scan_period: interval,
            button_debounce: interval,
            button_settle: interval,
            speed_poll: interval,
            display_period: interval,
            alarm_phase: interval,
        }
    }

    /// Total time the expiry alarm keeps the buzzer busy.
    #[must_use]
    pub fn alarm_duration(&self) -> Duration {
        self.alarm_phase * u32::from(ALARM_TOGGLES)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
