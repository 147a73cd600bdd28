//! Duration timer controller and expiry alarm.
//!
//! The controller owns the one-shot countdown. It waits on the duration
//! channel and, while a countdown is pending, on its deadline as well; a new
//! duration arriving first drops the old deadline before it can fire. Expiry
//! hands the generation to [`AlarmSequencer`], which plays the buzzer pattern
//! on its own task and then clears the shared state.

use centrifuge_core::command::CountdownDuration;
use centrifuge_core::countdown::{
    AlarmPattern, ArmError, Armed, Countdown, CountdownState, finish_expiry,
};
use centrifuge_core::hal::{Buzzer, RealTimeClock};
use centrifuge_core::motor::MotorState;
use centrifuge_core::telemetry::TelemetryEventKind;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};

use crate::channels::{AlarmSignal, DurationReceiver};
use crate::telemetry::TelemetryRecorder;
use crate::time::FirmwareInstant;

pub struct CountdownController<'a, R> {
    receiver: DurationReceiver<'a>,
    countdown: Countdown<'a, FirmwareInstant>,
    rtc: R,
    alarm: &'a AlarmSignal,
    telemetry: &'a TelemetryRecorder,
}

impl<'a, R> CountdownController<'a, R>
where
    R: RealTimeClock,
{
    pub fn new(
        receiver: DurationReceiver<'a>,
        state: &'a CountdownState,
        rtc: R,
        alarm: &'a AlarmSignal,
        telemetry: &'a TelemetryRecorder,
    ) -> Self {
        Self {
            receiver,
            countdown: Countdown::new(state),
            rtc,
            alarm,
            telemetry,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Handles the next duration command or the pending deadline.
    pub async fn step(&mut self) {
        let received = match self.countdown.deadline() {
            Some(deadline) => {
                match select(self.receiver.receive(), Timer::at(deadline.into_embassy())).await {
                    Either::First(duration) => Some(duration),
                    Either::Second(()) => None,
                }
            }
            None => Some(self.receiver.receive().await),
        };

        match received {
            // Failures are recorded by `program`; the previous countdown stays armed.
            Some(duration) => {
                self.program(duration).ok();
            }
            None => self.expire(FirmwareInstant::now()),
        }
    }

    /// Arms (or re-arms) the countdown for `duration`.
    pub fn program(&mut self, duration: CountdownDuration) -> Result<Armed, ArmError> {
        let result = self
            .countdown
            .program(&mut self.rtc, duration, FirmwareInstant::now());
        self.telemetry.record(match &result {
            Ok(armed) => TelemetryEventKind::armed(armed),
            Err(error) => TelemetryEventKind::ArmFailed(*error),
        });
        result
    }

    fn expire(&mut self, now: FirmwareInstant) {
        if let Some(generation) = self.countdown.poll_expiry(now) {
            self.telemetry.record(TelemetryEventKind::CountdownExpired);
            self.alarm.signal(generation);
        }
    }

    pub fn deadline(&self) -> Option<FirmwareInstant> {
        self.countdown.deadline()
    }
}

/// Plays the expiry alarm, then clears the countdown and stops the motor.
pub struct AlarmSequencer<'a, B> {
    alarm: &'a AlarmSignal,
    buzzer: B,
    countdown: &'a CountdownState,
    motor: &'a MotorState,
    telemetry: &'a TelemetryRecorder,
    phase: Duration,
}

impl<'a, B> AlarmSequencer<'a, B>
where
    B: Buzzer,
{
    pub fn new(
        alarm: &'a AlarmSignal,
        buzzer: B,
        countdown: &'a CountdownState,
        motor: &'a MotorState,
        telemetry: &'a TelemetryRecorder,
        phase: Duration,
    ) -> Self {
        Self {
            alarm,
            buzzer,
            countdown,
            motor,
            telemetry,
            phase,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            let generation = self.alarm.wait().await;
            self.play(generation).await;
        }
    }

    pub async fn play(&mut self, generation: u32) {
        for sounding in AlarmPattern::new() {
            self.buzzer.set_sounding(sounding);
            self.telemetry
                .record(TelemetryEventKind::BuzzerToggled { sounding });
            Timer::after(self.phase).await;
        }
        let outcome = finish_expiry(self.countdown, self.motor, generation);
        self.telemetry
            .record(TelemetryEventKind::CountdownFinished(outcome));
    }
}
