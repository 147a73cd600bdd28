use crate::clock::SharedClock;
use crate::display::{ClockDisplayTask, CountdownDisplayTask};
use crate::hw::displays::{LoggedSegments, LoggedText};

#[embassy_executor::task]
pub async fn run_countdown(
    task: CountdownDisplayTask<'static, LoggedSegments, &'static SharedClock>,
) -> ! {
    task.run().await
}

#[embassy_executor::task]
pub async fn run_clock(task: ClockDisplayTask<'static, LoggedText, &'static SharedClock>) -> ! {
    task.run().await
}
