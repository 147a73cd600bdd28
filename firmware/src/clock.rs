//! Software real-time clock and the clock-set consumer.
//!
//! The wall clock is an anchor (Unix seconds at a monotonic instant) behind a
//! critical-section mutex. Until [`SharedClock::start`] runs, every read fails
//! with [`ClockError::NotStarted`], which the tasks treat as the clock adapter
//! being unavailable.

use core::cell::Cell;
use core::fmt;

use centrifuge_core::clock::{DateTime, apply_time_of_day};
use centrifuge_core::command::TimeOfDay;
use centrifuge_core::hal::RealTimeClock;
use centrifuge_core::telemetry::TelemetryEventKind;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;

use crate::channels::{CentrifugeMutex, ClockReceiver};
use crate::telemetry::TelemetryRecorder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClockError {
    NotStarted,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("clock not started")
    }
}

#[derive(Clone, Copy, Debug)]
struct Anchor {
    unix: u64,
    at: Instant,
}

pub struct SharedClock {
    anchor: Mutex<CentrifugeMutex, Cell<Option<Anchor>>>,
}

impl SharedClock {
    pub const fn new() -> Self {
        Self {
            anchor: Mutex::new(Cell::new(None)),
        }
    }

    /// Starts the clock at `time`.
    pub fn start(&self, time: DateTime) {
        self.rebase(time, Instant::now());
    }

    fn rebase(&self, time: DateTime, at: Instant) {
        let anchor = Anchor {
            unix: time.unix_time(),
            at,
        };
        self.anchor.lock(|cell| cell.set(Some(anchor)));
    }

    fn read(&self, now: Instant) -> Result<DateTime, ClockError> {
        let anchor = self
            .anchor
            .lock(Cell::get)
            .ok_or(ClockError::NotStarted)?;
        let elapsed = now.saturating_duration_since(anchor.at).as_secs();
        Ok(DateTime::from_unix(anchor.unix + elapsed))
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RealTimeClock for &SharedClock {
    type Error = ClockError;

    fn now(&mut self) -> Result<DateTime, ClockError> {
        self.read(Instant::now())
    }

    fn adjust(&mut self, time: DateTime) -> Result<(), ClockError> {
        self.read(Instant::now())?;
        self.rebase(time, Instant::now());
        Ok(())
    }
}

/// Applies `SetClock` commands to the wall clock.
pub struct ClockUpdater<'a, R> {
    receiver: ClockReceiver<'a>,
    rtc: R,
    telemetry: &'a TelemetryRecorder,
}

impl<'a, R> ClockUpdater<'a, R>
where
    R: RealTimeClock,
{
    pub fn new(receiver: ClockReceiver<'a>, rtc: R, telemetry: &'a TelemetryRecorder) -> Self {
        Self {
            receiver,
            rtc,
            telemetry,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            let time = self.receiver.receive().await;
            // Reported through telemetry by `apply`.
            self.apply(time).ok();
        }
    }

    /// Writes `time` into the clock, keeping date and seconds.
    pub fn apply(&mut self, time: TimeOfDay) -> Result<DateTime, R::Error> {
        let result = apply_time_of_day(&mut self.rtc, time);
        self.telemetry.record(match result {
            Ok(_) => TelemetryEventKind::ClockAdjusted(time),
            Err(_) => TelemetryEventKind::ClockUnavailable,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ClockQueue;

    #[test]
    fn unstarted_clock_reports_unavailable() {
        let clock = SharedClock::new();
        let mut rtc = &clock;
        assert_eq!(rtc.now(), Err(ClockError::NotStarted));
        assert_eq!(rtc.adjust(DateTime::BOOT), Err(ClockError::NotStarted));
    }

    #[test]
    fn elapsed_monotonic_time_advances_wall_clock() {
        let clock = SharedClock::new();
        let start = Instant::from_secs(10);
        clock.rebase(DateTime::BOOT, start);
        let later = clock
            .read(start + embassy_time::Duration::from_secs(75))
            .unwrap();
        assert_eq!((later.minute, later.second), (1, 15));
    }

    #[test]
    fn updater_preserves_date_and_applies_hour_minute() {
        let clock = SharedClock::new();
        clock.start(DateTime::BOOT);
        let queue = ClockQueue::new();
        let telemetry = TelemetryRecorder::new();
        let mut updater = ClockUpdater::new(queue.receiver(), &clock, &telemetry);

        let time = TimeOfDay::new(14, 45).unwrap();
        let first = updater.apply(time).unwrap();
        let second = updater.apply(time).unwrap();

        assert_eq!((first.year, first.month, first.day), (2024, 1, 1));
        assert_eq!((first.hour, first.minute), (14, 45));
        assert_eq!((second.hour, second.minute), (14, 45));
        assert!(telemetry.contains(|event| *event == TelemetryEventKind::ClockAdjusted(time)));
    }

    #[test]
    fn updater_reports_missing_clock() {
        let clock = SharedClock::new();
        let queue = ClockQueue::new();
        let telemetry = TelemetryRecorder::new();
        let mut updater = ClockUpdater::new(queue.receiver(), &clock, &telemetry);

        assert!(updater.apply(TimeOfDay::new(1, 2).unwrap()).is_err());
        assert_eq!(
            telemetry.latest().map(|record| record.event),
            Some(TelemetryEventKind::ClockUnavailable)
        );
    }
}
