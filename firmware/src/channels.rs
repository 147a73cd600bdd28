//! Inter-task channels and the start/stop mailbox.
//!
//! Commands and speed selections travel through bounded FIFO channels by
//! value. Start/stop gestures use a single-slot [`PowerMailbox`] instead: a
//! new notification overwrites an unconsumed one, so a burst of edges never
//! queues up behind the handler.

use centrifuge_core::command::{Command, CountdownDuration, TimeOfDay};
use centrifuge_core::config::{COMMAND_QUEUE_DEPTH, SPEED_QUEUE_DEPTH};
use centrifuge_core::gesture::PowerEvent;
use centrifuge_core::motor::SpeedSelection;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, with_timeout};

/// Raw mutex shared by every channel; safe to touch from interrupt context.
pub type CentrifugeMutex = CriticalSectionRawMutex;

pub type DurationQueue = Channel<CentrifugeMutex, CountdownDuration, COMMAND_QUEUE_DEPTH>;
pub type DurationSender<'a> = Sender<'a, CentrifugeMutex, CountdownDuration, COMMAND_QUEUE_DEPTH>;
pub type DurationReceiver<'a> =
    Receiver<'a, CentrifugeMutex, CountdownDuration, COMMAND_QUEUE_DEPTH>;

pub type ClockQueue = Channel<CentrifugeMutex, TimeOfDay, COMMAND_QUEUE_DEPTH>;
pub type ClockSender<'a> = Sender<'a, CentrifugeMutex, TimeOfDay, COMMAND_QUEUE_DEPTH>;
pub type ClockReceiver<'a> = Receiver<'a, CentrifugeMutex, TimeOfDay, COMMAND_QUEUE_DEPTH>;

pub type SpeedQueue = Channel<CentrifugeMutex, SpeedSelection, SPEED_QUEUE_DEPTH>;
pub type SpeedSender<'a> = Sender<'a, CentrifugeMutex, SpeedSelection, SPEED_QUEUE_DEPTH>;
pub type SpeedReceiver<'a> = Receiver<'a, CentrifugeMutex, SpeedSelection, SPEED_QUEUE_DEPTH>;

/// Expiring countdown generation handed from the controller to the alarm task.
pub type AlarmSignal = Signal<CentrifugeMutex, u32>;

/// Latest-wins start/stop notification slot.
pub struct PowerMailbox {
    slot: Signal<CentrifugeMutex, PowerEvent>,
}

impl PowerMailbox {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Non-blocking; replaces any notification not yet consumed.
    pub fn notify(&self, event: PowerEvent) {
        self.slot.signal(event);
    }

    pub fn try_take(&self) -> Option<PowerEvent> {
        self.slot.try_take()
    }

    /// Waits up to `timeout` for a notification.
    pub async fn wait_timeout(&self, timeout: Duration) -> Option<PowerEvent> {
        with_timeout(timeout, self.slot.wait()).await.ok()
    }
}

/// Routes validated keypad commands to their consumer.
pub struct CommandRouter<'a> {
    duration: DurationSender<'a>,
    clock: ClockSender<'a>,
}

impl<'a> CommandRouter<'a> {
    pub fn new(duration: DurationSender<'a>, clock: ClockSender<'a>) -> Self {
        Self { duration, clock }
    }

    /// Sends `command`, waiting while the target channel is full.
    pub async fn dispatch(&self, command: Command) {
        match command {
            Command::SetDuration(duration) => self.duration.send(duration).await,
            Command::SetClock(time) => self.clock.send(time).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn mailbox_keeps_only_latest_notification() {
        let mailbox = PowerMailbox::new();
        mailbox.notify(PowerEvent::Start);
        mailbox.notify(PowerEvent::Stop);
        assert_eq!(mailbox.try_take(), Some(PowerEvent::Stop));
        assert_eq!(mailbox.try_take(), None);
    }

    #[test]
    fn mailbox_wait_times_out_without_event() {
        let mailbox = PowerMailbox::new();
        let event = block_on(mailbox.wait_timeout(Duration::from_millis(5)));
        assert_eq!(event, None);
    }

    #[test]
    fn router_sends_each_command_to_its_channel() {
        let durations = DurationQueue::new();
        let clocks = ClockQueue::new();
        let router = CommandRouter::new(durations.sender(), clocks.sender());
        let duration = CountdownDuration::new(1, 3).unwrap();
        let time = TimeOfDay::new(8, 30).unwrap();

        block_on(async {
            router.dispatch(Command::SetDuration(duration)).await;
            router.dispatch(Command::SetClock(time)).await;
        });

        assert_eq!(durations.try_receive().ok(), Some(duration));
        assert_eq!(clocks.try_receive().ok(), Some(time));
    }
}
