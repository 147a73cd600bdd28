//! EXTI-driven start/stop line watchers.

use centrifuge_core::gesture::PowerEvent;
use embassy_stm32::exti::ExtiInput;

use crate::channels::PowerMailbox;
use crate::power::LineLevel;

/// Tracks one active-low line and posts `event` on every press.
pub struct EdgeWatcher {
    input: ExtiInput<'static>,
    level: &'static LineLevel,
    mailbox: &'static PowerMailbox,
    event: PowerEvent,
}

impl EdgeWatcher {
    pub fn new(
        input: ExtiInput<'static>,
        level: &'static LineLevel,
        mailbox: &'static PowerMailbox,
        event: PowerEvent,
    ) -> Self {
        level.set(input.is_low());
        Self {
            input,
            level,
            mailbox,
            event,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.input.wait_for_any_edge().await;
            let pressed = self.input.is_low();
            self.level.set(pressed);
            if pressed {
                self.mailbox.notify(self.event);
            }
        }
    }
}
