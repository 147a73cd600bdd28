//! Countdown shared state and the one-shot expiry schedule.
//!
//! [`CountdownState`] is the cross-task view of the countdown: an active flag
//! and the absolute end instant (Unix seconds). Every arm bumps a generation
//! counter packed next to the active bit, so an expiry that raced a re-arm can
//! tell it no longer owns the state.
//!
//! [`Countdown`] pairs that state with a monotonic [`CountdownTimer`]. The
//! owning task drives both: it programs new durations, asks for the current
//! deadline to sleep on, and polls for expiry.

use core::fmt;
use core::ops::Add;
use core::time::Duration;

use portable_atomic::{AtomicU32, AtomicU64, Ordering};

use crate::command::CountdownDuration;
use crate::config::ALARM_TOGGLES;
use crate::hal::RealTimeClock;
use crate::motor::MotorState;

const ACTIVE_BIT: u32 = 1;

const fn pack(generation: u32, active: bool) -> u32 {
    (generation << 1) | if active { ACTIVE_BIT } else { 0 }
}

const fn generation_of(word: u32) -> u32 {
    word >> 1
}

/// Countdown flags shared between the timer owner and its readers.
#[derive(Debug, Default)]
pub struct CountdownState {
    word: AtomicU32,
    end_unix: AtomicU64,
}

impl CountdownState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
            end_unix: AtomicU64::new(0),
        }
    }

    /// Marks the countdown active with a new end instant and returns the
    /// generation that owns it.
    pub fn arm(&self, end_unix: u64) -> u32 {
        self.end_unix.store(end_unix, Ordering::Relaxed);
        let previous = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                Some(pack(generation_of(word).wrapping_add(1), true))
            })
            .unwrap_or_default();
        generation_of(previous).wrapping_add(1) & (u32::MAX >> 1)
    }

    /// Clears the active flag if `generation` still owns the countdown.
    pub fn expire(&self, generation: u32) -> bool {
        self.word
            .compare_exchange(
                pack(generation, true),
                pack(generation, false),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.word.load(Ordering::Acquire) & ACTIVE_BIT != 0
    }

    /// End instant in Unix seconds, present only while active.
    #[must_use]
    pub fn end_unix(&self) -> Option<u64> {
        if self.is_active() {
            Some(self.end_unix.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Whole seconds left before the end instant; zero once inactive or past due.
    #[must_use]
    pub fn remaining_seconds(&self, now_unix: u64) -> u32 {
        self.end_unix().map_or(0, |end| {
            u32::try_from(end.saturating_sub(now_unix)).unwrap_or(u32::MAX)
        })
    }
}

/// Single-shot deadline on a monotonic clock.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CountdownTimer<TInstant> {
    pending: Option<(TInstant, u32)>,
}

impl<TInstant> CountdownTimer<TInstant>
where
    TInstant: Copy + Ord,
{
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Replaces any pending deadline.
    pub fn rearm(&mut self, deadline: TInstant, generation: u32) {
        self.pending = Some((deadline, generation));
    }

    #[must_use]
    pub fn deadline(&self) -> Option<TInstant> {
        self.pending.map(|(deadline, _)| deadline)
    }

    /// Fires at most once per arm, yielding the generation it was armed for.
    pub fn poll(&mut self, now: TInstant) -> Option<u32> {
        match self.pending {
            Some((deadline, generation)) if now >= deadline => {
                self.pending = None;
                Some(generation)
            }
            _ => None,
        }
    }
}

/// Reasons a countdown could not be programmed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArmError {
    /// A one-shot timer cannot be programmed with a zero period.
    ZeroDuration,
    /// The real-time clock could not be read to compute the end instant.
    ClockUnavailable,
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDuration => f.write_str("countdown length must be non-zero"),
            Self::ClockUnavailable => f.write_str("real-time clock unavailable"),
        }
    }
}

/// Successful arm summary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Armed {
    pub generation: u32,
    pub end_unix: u64,
    pub total_seconds: u32,
}

/// Owner-side countdown: shared state plus its monotonic timer.
#[derive(Debug)]
pub struct Countdown<'a, TInstant> {
    state: &'a CountdownState,
    timer: CountdownTimer<TInstant>,
}

impl<'a, TInstant> Countdown<'a, TInstant>
where
    TInstant: Copy + Ord + Add<Duration, Output = TInstant>,
{
    #[must_use]
    pub const fn new(state: &'a CountdownState) -> Self {
        Self {
            state,
            timer: CountdownTimer::new(),
        }
    }

    /// Programs `duration` starting at `now`, replacing any running countdown.
    ///
    /// Everything that can fail is checked before the shared state is touched,
    /// so on failure the previous countdown and its pending expiry stay intact.
    pub fn program<R>(
        &mut self,
        rtc: &mut R,
        duration: CountdownDuration,
        now: TInstant,
    ) -> Result<Armed, ArmError>
    where
        R: RealTimeClock,
    {
        let total_seconds = duration.total_seconds();
        if total_seconds == 0 {
            return Err(ArmError::ZeroDuration);
        }
        let wall = rtc.now().map_err(|_| ArmError::ClockUnavailable)?;
        let end_unix = wall.unix_time() + u64::from(total_seconds);
        let generation = self.state.arm(end_unix);
        self.timer.rearm(now + duration.as_duration(), generation);
        Ok(Armed {
            generation,
            end_unix,
            total_seconds,
        })
    }

    /// Monotonic instant the owner should wake at, if a countdown is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<TInstant> {
        self.timer.deadline()
    }

    /// Returns the expiring generation once the deadline has passed.
    pub fn poll_expiry(&mut self, now: TInstant) -> Option<u32> {
        self.timer.poll(now)
    }
}

/// Buzzer levels played on expiry: on/off for each of three cycles.
#[derive(Clone, Debug)]
pub struct AlarmPattern {
    emitted: u8,
}

impl AlarmPattern {
    #[must_use]
    pub const fn new() -> Self {
        Self { emitted: 0 }
    }
}

impl Default for AlarmPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for AlarmPattern {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.emitted >= ALARM_TOGGLES {
            return None;
        }
        let sounding = self.emitted % 2 == 0;
        self.emitted += 1;
        Some(sounding)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::from(ALARM_TOGGLES.saturating_sub(self.emitted));
        (left, Some(left))
    }
}

impl ExactSizeIterator for AlarmPattern {}

/// Result of completing an expiry after the alarm has played.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExpiryOutcome {
    /// `false` when a newer arm superseded the expiring countdown.
    pub cleared: bool,
    /// Whether the motor was running when the expiry forced it off.
    pub motor_was_running: bool,
}

/// Clears the countdown owned by `generation` and forces the motor off.
///
/// A superseded generation changes nothing: the newer countdown owns both the
/// active flag and the motor run.
pub fn finish_expiry(
    countdown: &CountdownState,
    motor: &MotorState,
    generation: u32,
) -> ExpiryOutcome {
    let cleared = countdown.expire(generation);
    let motor_was_running = cleared && motor.force_stop();
    ExpiryOutcome {
        cleared,
        motor_was_running,
    }
}
