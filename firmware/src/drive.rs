//! Stepper drive loop.
//!
//! While the motor runs, each cycle takes one step, sleeps the step interval
//! for the current speed and drains at most one pending speed selection
//! without blocking. While stopped, the speed channel is polled with a short
//! timeout so the task still yields.

use centrifuge_core::hal::Stepper;
use centrifuge_core::motor::{DRIVE_DIRECTION, MotorState, SpeedSelection};
use centrifuge_core::telemetry::TelemetryEventKind;
use embassy_time::{Duration, Timer, with_timeout};

use crate::channels::SpeedReceiver;
use crate::telemetry::TelemetryRecorder;
use crate::time::core_duration_to_embassy;

pub struct DriveTask<'a, S> {
    stepper: S,
    motor: &'a MotorState,
    receiver: SpeedReceiver<'a>,
    speed: SpeedSelection,
    telemetry: &'a TelemetryRecorder,
    speed_poll: Duration,
}

impl<'a, S> DriveTask<'a, S>
where
    S: Stepper,
{
    pub fn new(
        mut stepper: S,
        motor: &'a MotorState,
        receiver: SpeedReceiver<'a>,
        telemetry: &'a TelemetryRecorder,
        speed_poll: Duration,
    ) -> Self {
        let speed = SpeedSelection::DEFAULT;
        stepper.set_speed(speed);
        Self {
            stepper,
            motor,
            receiver,
            speed,
            telemetry,
            speed_poll,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.cycle().await;
        }
    }

    /// One drive cycle; returns the selection applied during it, if any.
    pub async fn cycle(&mut self) -> Option<SpeedSelection> {
        let pending = if self.motor.is_running() {
            self.stepper.step(DRIVE_DIRECTION);
            Timer::after(core_duration_to_embassy(self.speed.step_interval())).await;
            self.receiver.try_receive().ok()
        } else {
            with_timeout(self.speed_poll, self.receiver.receive())
                .await
                .ok()
        };
        let next = pending?;
        self.apply(next);
        Some(next)
    }

    fn apply(&mut self, speed: SpeedSelection) {
        self.speed = speed;
        self.stepper.set_speed(speed);
        self.telemetry
            .record(TelemetryEventKind::SpeedApplied(speed));
    }

    pub const fn speed(&self) -> SpeedSelection {
        self.speed
    }
}
