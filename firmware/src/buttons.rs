//! Speed-button scan task.

use centrifuge_core::buttons::{ButtonScanner, SpeedPress};
use centrifuge_core::config::TimingConfig;
use centrifuge_core::hal::{IndicatorBank, SpeedInputs};
use centrifuge_core::telemetry::TelemetryEventKind;
use embassy_time::Timer;

use crate::channels::SpeedSender;
use crate::telemetry::TelemetryRecorder;
use crate::time::{FirmwareInstant, core_duration_to_embassy};

pub struct SpeedButtonTask<'a, I, L> {
    inputs: I,
    indicators: L,
    scanner: ButtonScanner<FirmwareInstant>,
    sender: SpeedSender<'a>,
    telemetry: &'a TelemetryRecorder,
    timing: TimingConfig,
}

impl<'a, I, L> SpeedButtonTask<'a, I, L>
where
    I: SpeedInputs,
    L: IndicatorBank,
{
    pub fn new(
        inputs: I,
        indicators: L,
        sender: SpeedSender<'a>,
        telemetry: &'a TelemetryRecorder,
        timing: TimingConfig,
    ) -> Self {
        Self {
            inputs,
            indicators,
            scanner: ButtonScanner::new(timing.button_debounce),
            sender,
            telemetry,
            timing,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Scans once, then waits out either the settle window or the scan period.
    pub async fn step(&mut self) -> Option<SpeedPress> {
        let press = self.scan_and_publish().await;
        let pause = if press.is_some() {
            self.timing.button_settle
        } else {
            self.timing.button_scan_period
        };
        Timer::after(core_duration_to_embassy(pause)).await;
        press
    }

    async fn scan_and_publish(&mut self) -> Option<SpeedPress> {
        let sample = self.inputs.sample();
        let press = self.scanner.scan(FirmwareInstant::now(), sample)?;
        self.indicators.apply(press.indicators);
        self.telemetry.record(TelemetryEventKind::SpeedSelected {
            input: u8::try_from(press.input).unwrap_or(u8::MAX),
            speed: press.selection,
        });
        self.sender.send(press.selection).await;
        Some(press)
    }
}
