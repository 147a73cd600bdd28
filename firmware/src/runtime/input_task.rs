use crate::hw::keypad::MatrixKeypad;
use crate::input::KeypadWorker;

#[embassy_executor::task]
pub async fn run(worker: KeypadWorker<'static, MatrixKeypad>) -> ! {
    worker.run().await
}
