use crate::clock::{ClockUpdater, SharedClock};
use crate::countdown::{AlarmSequencer, CountdownController};
use crate::hw::gpio::GpioBuzzer;

#[embassy_executor::task]
pub async fn run_controller(controller: CountdownController<'static, &'static SharedClock>) -> ! {
    controller.run().await
}

#[embassy_executor::task]
pub async fn run_alarm(sequencer: AlarmSequencer<'static, GpioBuzzer>) -> ! {
    sequencer.run().await
}

#[embassy_executor::task]
pub async fn run_clock_updater(updater: ClockUpdater<'static, &'static SharedClock>) -> ! {
    updater.run().await
}
