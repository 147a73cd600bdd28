//! Countdown and clock display refresh tasks.
//!
//! Both tasks are read-only with respect to the shared state. A display that
//! fails to initialise parks its own task after reporting; the rest of the
//! controller keeps running. A failed refresh is reported once per outage and
//! retried on the next tick.

use centrifuge_core::countdown::CountdownState;
use centrifuge_core::display::{CountdownReadout, format_clock};
use centrifuge_core::hal::{RealTimeClock, SegmentDisplay, TextDisplay};
use centrifuge_core::telemetry::{DisplayId, TelemetryEventKind};
use embassy_time::{Duration, Ticker};

use crate::telemetry::TelemetryRecorder;

pub struct CountdownDisplayTask<'a, D, R> {
    display: D,
    rtc: R,
    countdown: &'a CountdownState,
    telemetry: &'a TelemetryRecorder,
    period: Duration,
    faulted: bool,
}

impl<'a, D, R> CountdownDisplayTask<'a, D, R>
where
    D: SegmentDisplay,
    R: RealTimeClock,
{
    pub fn new(
        display: D,
        rtc: R,
        countdown: &'a CountdownState,
        telemetry: &'a TelemetryRecorder,
        period: Duration,
    ) -> Self {
        Self {
            display,
            rtc,
            countdown,
            telemetry,
            period,
            faulted: false,
        }
    }

    pub async fn run(mut self) -> ! {
        if self.display.init().is_err() {
            self.telemetry
                .record(TelemetryEventKind::DisplayUnavailable(DisplayId::Countdown));
            core::future::pending::<()>().await;
        }
        let mut ticker = Ticker::every(self.period);
        loop {
            self.refresh_and_report();
            ticker.next().await;
        }
    }

    /// Remaining time, or `00:00` when idle or the clock cannot be read.
    pub fn readout(&mut self) -> CountdownReadout {
        if !self.countdown.is_active() {
            return CountdownReadout::IDLE;
        }
        self.rtc.now().map_or(CountdownReadout::IDLE, |now| {
            CountdownReadout::from_remaining(self.countdown.remaining_seconds(now.unix_time()))
        })
    }

    pub fn refresh(&mut self) -> Result<CountdownReadout, D::Error> {
        let readout = self.readout();
        self.display.show_countdown(readout)?;
        Ok(readout)
    }

    /// Refreshes and records the first failure of each outage.
    pub fn refresh_and_report(&mut self) -> Option<CountdownReadout> {
        let shown = self.refresh().ok();
        if shown.is_none() && !self.faulted {
            self.telemetry
                .record(TelemetryEventKind::DisplayUnavailable(DisplayId::Countdown));
        }
        self.faulted = shown.is_none();
        shown
    }
}

pub struct ClockDisplayTask<'a, D, R> {
    display: D,
    rtc: R,
    telemetry: &'a TelemetryRecorder,
    period: Duration,
    faulted: bool,
}

impl<'a, D, R> ClockDisplayTask<'a, D, R>
where
    D: TextDisplay,
    R: RealTimeClock,
{
    pub fn new(display: D, rtc: R, telemetry: &'a TelemetryRecorder, period: Duration) -> Self {
        Self {
            display,
            rtc,
            telemetry,
            period,
            faulted: false,
        }
    }

    pub async fn run(mut self) -> ! {
        if self.display.init().is_err() {
            self.telemetry
                .record(TelemetryEventKind::DisplayUnavailable(DisplayId::Clock));
            core::future::pending::<()>().await;
        }
        if self.rtc.now().is_err() {
            self.telemetry.record(TelemetryEventKind::ClockUnavailable);
            core::future::pending::<()>().await;
        }
        let mut ticker = Ticker::every(self.period);
        loop {
            self.refresh();
            ticker.next().await;
        }
    }

    /// Renders the current time; returns whether anything was shown.
    pub fn refresh(&mut self) -> bool {
        let Ok(now) = self.rtc.now() else {
            return false;
        };
        let shown = self.display.show_text(format_clock(&now).as_str()).is_ok();
        if !shown && !self.faulted {
            self.telemetry
                .record(TelemetryEventKind::DisplayUnavailable(DisplayId::Clock));
        }
        self.faulted = !shown;
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SharedClock;
    use centrifuge_core::clock::DateTime;

    #[derive(Default)]
    struct Segments {
        shown: Option<CountdownReadout>,
        broken: bool,
    }

    impl SegmentDisplay for &mut Segments {
        type Error = ();

        fn init(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn show_countdown(&mut self, readout: CountdownReadout) -> Result<(), ()> {
            if self.broken {
                return Err(());
            }
            self.shown = Some(readout);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Text(heapless::String<16>);

    impl TextDisplay for &mut Text {
        type Error = ();

        fn init(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn show_text(&mut self, text: &str) -> Result<(), ()> {
            self.0.clear();
            self.0.push_str(text).map_err(|_| ())
        }
    }

    #[test]
    fn idle_countdown_reads_zero() {
        let clock = SharedClock::new();
        clock.start(DateTime::BOOT);
        let countdown = CountdownState::new();
        let telemetry = TelemetryRecorder::new();
        let mut segments = Segments::default();
        let mut task = CountdownDisplayTask::new(
            &mut segments,
            &clock,
            &countdown,
            &telemetry,
            Duration::from_secs(1),
        );

        assert_eq!(task.refresh(), Ok(CountdownReadout::IDLE));
        assert_eq!(segments.shown.map(|r| r.text()).as_deref(), Some("00:00"));
    }

    #[test]
    fn active_countdown_shows_remaining_time() {
        let clock = SharedClock::new();
        clock.start(DateTime::BOOT);
        let countdown = CountdownState::new();
        countdown.arm(DateTime::BOOT.unix_time() + 63);
        let telemetry = TelemetryRecorder::new();
        let mut segments = Segments::default();
        let mut task = CountdownDisplayTask::new(
            &mut segments,
            &clock,
            &countdown,
            &telemetry,
            Duration::from_secs(1),
        );

        let readout = task.readout();
        assert!(readout.segment_value() <= 103 && readout.segment_value() >= 102);
    }

    #[test]
    fn failed_refresh_is_reported_once_per_outage() {
        let clock = SharedClock::new();
        clock.start(DateTime::BOOT);
        let countdown = CountdownState::new();
        let telemetry = TelemetryRecorder::new();
        let mut segments = Segments {
            shown: None,
            broken: true,
        };
        let mut task = CountdownDisplayTask::new(
            &mut segments,
            &clock,
            &countdown,
            &telemetry,
            Duration::from_secs(1),
        );

        assert_eq!(task.refresh_and_report(), None);
        assert_eq!(task.refresh_and_report(), None);

        assert_eq!(telemetry.len(), 1);
        assert_eq!(
            telemetry.latest().map(|record| record.event),
            Some(TelemetryEventKind::DisplayUnavailable(DisplayId::Countdown))
        );
    }

    #[test]
    fn clock_display_renders_padded_time() {
        let clock = SharedClock::new();
        clock.start(DateTime {
            hour: 9,
            minute: 4,
            ..DateTime::BOOT
        });
        let telemetry = TelemetryRecorder::new();
        let mut text = Text::default();
        let mut task =
            ClockDisplayTask::new(&mut text, &clock, &telemetry, Duration::from_secs(1));

        assert!(task.refresh());
        assert!(text.0.starts_with("09:04:0"));
    }
}
