//! Keypad polling task.

use centrifuge_core::hal::Keypad;
use centrifuge_core::keypad::{InputParser, KeypadEvent};
use centrifuge_core::telemetry::TelemetryEventKind;
use embassy_time::{Duration, Timer};

use crate::channels::CommandRouter;
use crate::telemetry::TelemetryRecorder;

pub struct KeypadWorker<'a, K> {
    keypad: K,
    parser: InputParser,
    router: CommandRouter<'a>,
    telemetry: &'a TelemetryRecorder,
    poll: Duration,
}

impl<'a, K> KeypadWorker<'a, K>
where
    K: Keypad,
{
    pub fn new(
        keypad: K,
        router: CommandRouter<'a>,
        telemetry: &'a TelemetryRecorder,
        poll: Duration,
    ) -> Self {
        Self {
            keypad,
            parser: InputParser::new(),
            router,
            telemetry,
            poll,
        }
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.poll_once().await;
            Timer::after(self.poll).await;
        }
    }

    /// Reads at most one key and feeds it to the parser.
    pub async fn poll_once(&mut self) -> Option<KeypadEvent> {
        let key = self.keypad.read_key()?;
        Some(self.handle_key(key).await)
    }

    pub async fn handle_key(&mut self, key: char) -> KeypadEvent {
        let event = self.parser.feed(key);
        if let Some(kind) = TelemetryEventKind::from_keypad(&event) {
            self.telemetry.record(kind);
        }
        if let KeypadEvent::Submitted(command) = event {
            self.router.dispatch(command).await;
            self.telemetry
                .record(TelemetryEventKind::CommandQueued(command));
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{ClockQueue, DurationQueue};
    use centrifuge_core::command::{CountdownDuration, InputMode, TimeOfDay, ValidationError};
    use embassy_futures::block_on;

    struct ScriptedKeypad(std::collections::VecDeque<char>);

    impl ScriptedKeypad {
        fn new(keys: &str) -> Self {
            Self(keys.chars().collect())
        }
    }

    impl Keypad for ScriptedKeypad {
        fn read_key(&mut self) -> Option<char> {
            self.0.pop_front()
        }
    }

    fn drain<K: Keypad>(worker: &mut KeypadWorker<'_, K>) {
        block_on(async { while worker.poll_once().await.is_some() {} });
    }

    #[test]
    fn valid_entries_reach_their_channels() {
        let durations = DurationQueue::new();
        let clocks = ClockQueue::new();
        let telemetry = TelemetryRecorder::new();
        let router = CommandRouter::new(durations.sender(), clocks.sender());
        let mut worker = KeypadWorker::new(
            ScriptedKeypad::new("A0103#B2359#"),
            router,
            &telemetry,
            Duration::from_millis(1),
        );

        drain(&mut worker);

        assert_eq!(
            durations.try_receive().ok(),
            Some(CountdownDuration::new(1, 3).unwrap())
        );
        assert_eq!(
            clocks.try_receive().ok(),
            Some(TimeOfDay::new(23, 59).unwrap())
        );
    }

    #[test]
    fn invalid_entry_sends_nothing_and_reports() {
        let durations = DurationQueue::new();
        let clocks = ClockQueue::new();
        let telemetry = TelemetryRecorder::new();
        let router = CommandRouter::new(durations.sender(), clocks.sender());
        let mut worker = KeypadWorker::new(
            ScriptedKeypad::new("B2400#"),
            router,
            &telemetry,
            Duration::from_millis(1),
        );

        drain(&mut worker);

        assert!(clocks.try_receive().is_err());
        assert!(durations.try_receive().is_err());
        assert!(matches!(
            telemetry.latest().map(|record| record.event),
            Some(TelemetryEventKind::InputRejected {
                mode: Some(InputMode::Clock),
                error: ValidationError::OutOfRange { .. },
            })
        ));
    }

    #[test]
    fn digit_without_mode_is_reported() {
        let durations = DurationQueue::new();
        let clocks = ClockQueue::new();
        let telemetry = TelemetryRecorder::new();
        let router = CommandRouter::new(durations.sender(), clocks.sender());
        let mut worker = KeypadWorker::new(
            ScriptedKeypad::new("5"),
            router,
            &telemetry,
            Duration::from_millis(1),
        );

        drain(&mut worker);

        assert_eq!(
            telemetry.latest().map(|record| record.event),
            Some(TelemetryEventKind::DigitWithoutMode)
        );
    }
}
