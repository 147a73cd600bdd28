use crate::hw::lines::EdgeWatcher;
use crate::power::{LineLevel, PowerTask};

#[embassy_executor::task]
pub async fn run(task: PowerTask<'static, &'static LineLevel, &'static LineLevel>) -> ! {
    task.run().await
}

#[embassy_executor::task(pool_size = 2)]
pub async fn watch(watcher: EdgeWatcher) -> ! {
    watcher.run().await
}
