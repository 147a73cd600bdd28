use crate::buttons::SpeedButtonTask;
use crate::drive::DriveTask;
use crate::hw::gpio::{GpioStepper, LedBank, SpeedButtons};

#[embassy_executor::task]
pub async fn run_buttons(task: SpeedButtonTask<'static, SpeedButtons, LedBank>) -> ! {
    task.run().await
}

#[embassy_executor::task]
pub async fn run_drive(task: DriveTask<'static, GpioStepper>) -> ! {
    task.run().await
}
