//! Start/stop gesture task.
//!
//! Edge watchers keep a [`LineLevel`] per input current and drop a
//! notification into the [`PowerMailbox`] on every press. The task waits on
//! the mailbox with a bounded timeout, debounces, re-reads the line for the
//! event it received, and only then touches the motor flag.

use centrifuge_core::gesture::{GestureOutcome, PowerEvent, PowerGestureHandler};
use centrifuge_core::hal::InputLine;
use centrifuge_core::telemetry::TelemetryEventKind;
use embassy_time::{Duration, Timer};
use portable_atomic::{AtomicBool, Ordering};

use crate::channels::PowerMailbox;
use crate::telemetry::TelemetryRecorder;

/// Last observed level of an edge-triggered input.
pub struct LineLevel(AtomicBool);

impl LineLevel {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set(&self, asserted: bool) {
        self.0.store(asserted, Ordering::Release);
    }
}

impl Default for LineLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl InputLine for LineLevel {
    fn is_asserted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct PowerTask<'a, S, T> {
    mailbox: &'a PowerMailbox,
    handler: PowerGestureHandler<'a>,
    start_line: S,
    stop_line: T,
    telemetry: &'a TelemetryRecorder,
    notify_wait: Duration,
    debounce: Duration,
}

impl<'a, S, T> PowerTask<'a, S, T>
where
    S: InputLine,
    T: InputLine,
{
    pub fn new(
        mailbox: &'a PowerMailbox,
        handler: PowerGestureHandler<'a>,
        start_line: S,
        stop_line: T,
        telemetry: &'a TelemetryRecorder,
        notify_wait: Duration,
        debounce: Duration,
    ) -> Self {
        Self {
            mailbox,
            handler,
            start_line,
            stop_line,
            telemetry,
            notify_wait,
            debounce,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Waits for one notification; `None` when the bounded wait lapsed.
    pub async fn step(&mut self) -> Option<GestureOutcome> {
        let event = self.mailbox.wait_timeout(self.notify_wait).await?;
        Some(self.handle(event).await)
    }

    pub async fn handle(&mut self, event: PowerEvent) -> GestureOutcome {
        if !self.handler.needs_debounce(event) {
            return GestureOutcome::AlreadyInState(event);
        }
        Timer::after(self.debounce).await;
        let asserted = match event {
            PowerEvent::Start => self.start_line.is_asserted(),
            PowerEvent::Stop => self.stop_line.is_asserted(),
        };
        let outcome = self.handler.resolve(event, asserted);
        if let Some(kind) = TelemetryEventKind::from_gesture(outcome) {
            self.telemetry.record(kind);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use centrifuge_core::countdown::CountdownState;
    use centrifuge_core::motor::MotorState;
    use embassy_futures::block_on;

    struct Fixture {
        mailbox: PowerMailbox,
        countdown: CountdownState,
        motor: MotorState,
        start: LineLevel,
        stop: LineLevel,
        telemetry: TelemetryRecorder,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                mailbox: PowerMailbox::new(),
                countdown: CountdownState::new(),
                motor: MotorState::new(),
                start: LineLevel::new(),
                stop: LineLevel::new(),
                telemetry: TelemetryRecorder::new(),
            }
        }

        fn task(&self) -> PowerTask<'_, &LineLevel, &LineLevel> {
            PowerTask::new(
                &self.mailbox,
                PowerGestureHandler::new(&self.countdown, &self.motor),
                &self.start,
                &self.stop,
                &self.telemetry,
                Duration::from_millis(5),
                Duration::from_millis(1),
            )
        }
    }

    #[test]
    fn start_with_active_countdown_runs_motor() {
        let fixture = Fixture::new();
        fixture.countdown.arm(100);
        fixture.start.set(true);
        fixture.mailbox.notify(PowerEvent::Start);

        let outcome = block_on(fixture.task().step());

        assert_eq!(outcome, Some(GestureOutcome::Started));
        assert!(fixture.motor.is_running());
    }

    #[test]
    fn start_without_countdown_reports_configure_first() {
        let fixture = Fixture::new();
        fixture.start.set(true);
        fixture.mailbox.notify(PowerEvent::Start);

        let outcome = block_on(fixture.task().step());

        assert_eq!(outcome, Some(GestureOutcome::TimerNotConfigured));
        assert!(!fixture.motor.is_running());
        assert!(
            fixture
                .telemetry
                .contains(|event| *event == TelemetryEventKind::StartRejected)
        );
    }

    #[test]
    fn start_then_stop_before_wake_collapses_to_stop() {
        let fixture = Fixture::new();
        fixture.countdown.arm(100);
        fixture.start.set(true);
        fixture.mailbox.notify(PowerEvent::Start);
        fixture.mailbox.notify(PowerEvent::Stop);

        let mut task = fixture.task();
        let outcome = block_on(task.step());
        assert_eq!(outcome, Some(GestureOutcome::AlreadyInState(PowerEvent::Stop)));
        assert_eq!(block_on(task.step()), None);
        assert!(!fixture.motor.is_running());
    }

    #[test]
    fn released_line_is_treated_as_stale() {
        let fixture = Fixture::new();
        fixture.countdown.arm(100);
        fixture.mailbox.notify(PowerEvent::Start);

        let outcome = block_on(fixture.task().step());

        assert_eq!(outcome, Some(GestureOutcome::Stale(PowerEvent::Start)));
        assert!(!fixture.motor.is_running());
    }
}
