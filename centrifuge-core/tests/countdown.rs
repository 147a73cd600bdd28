use core::ops::Add;
use core::time::Duration;

use centrifuge_core::clock::DateTime;
use centrifuge_core::command::CountdownDuration;
use centrifuge_core::countdown::{
    AlarmPattern, ArmError, Countdown, CountdownState, ExpiryOutcome, finish_expiry,
};
use centrifuge_core::gesture::{GestureOutcome, PowerEvent, PowerGestureHandler};
use centrifuge_core::hal::RealTimeClock;
use centrifuge_core::motor::MotorState;

#[test]
fn duration_entry_arms_end_instant_from_wall_clock() {
    let state = CountdownState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);

    let armed = countdown
        .program(&mut rtc, duration(1, 3), MockInstant::secs(0))
        .expect("countdown should arm");

    assert_eq!(armed.total_seconds, 63);
    assert_eq!(armed.end_unix, DateTime::BOOT.unix_time() + 63);
    assert_eq!(state.end_unix(), Some(armed.end_unix));
    assert_eq!(countdown.deadline(), Some(MockInstant::secs(63)));
}

#[test]
fn rearm_before_expiry_fires_once_from_second_arm() {
    let state = CountdownState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);

    countdown
        .program(&mut rtc, duration(0, 10), MockInstant::secs(0))
        .expect("first arm");
    rtc.advance(5);
    let second = countdown
        .program(&mut rtc, duration(0, 10), MockInstant::secs(5))
        .expect("second arm");

    let mut fired = Vec::new();
    for tick in 0..=30 {
        if let Some(generation) = countdown.poll_expiry(MockInstant::secs(tick)) {
            fired.push((tick, generation));
        }
    }
    assert_eq!(fired, vec![(15, second.generation)]);
}

#[test]
fn failed_rearm_keeps_running_countdown_and_its_expiry() {
    let state = CountdownState::new();
    let motor = MotorState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);

    let first = countdown
        .program(&mut rtc, duration(0, 30), MockInstant::secs(0))
        .expect("first arm");
    let handler = PowerGestureHandler::new(&state, &motor);
    assert_eq!(handler.resolve(PowerEvent::Start, true), GestureOutcome::Started);

    let error = countdown
        .program(&mut rtc, duration(0, 0), MockInstant::secs(1))
        .expect_err("zero duration");
    assert_eq!(error, ArmError::ZeroDuration);
    assert!(state.is_active());
    assert_eq!(state.end_unix(), Some(first.end_unix));
    assert_eq!(countdown.deadline(), Some(MockInstant::secs(30)));

    let generation = (0..=60)
        .find_map(|tick| countdown.poll_expiry(MockInstant::secs(tick)))
        .expect("original expiry still fires");
    assert_eq!(generation, first.generation);
    finish_expiry(&state, &motor, generation);
    assert!(!state.is_active());
    assert!(!motor.is_running());
}

#[test]
fn zero_duration_on_idle_countdown_stays_idle() {
    let state = CountdownState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);

    assert_eq!(
        countdown.program(&mut rtc, duration(0, 0), MockInstant::secs(0)),
        Err(ArmError::ZeroDuration)
    );
    assert!(!state.is_active());
    assert_eq!(countdown.deadline(), None);
}

#[test]
fn broken_clock_during_rearm_keeps_previous_countdown() {
    let state = CountdownState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);

    countdown
        .program(&mut rtc, duration(0, 45), MockInstant::secs(0))
        .expect("first arm");
    rtc.broken = true;

    assert_eq!(
        countdown.program(&mut rtc, duration(1, 0), MockInstant::secs(2)),
        Err(ArmError::ClockUnavailable)
    );
    assert!(state.is_active());
    assert_eq!(countdown.deadline(), Some(MockInstant::secs(45)));
}

#[test]
fn unreadable_clock_is_an_arm_failure() {
    let state = CountdownState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);
    rtc.broken = true;

    assert_eq!(
        countdown.program(&mut rtc, duration(1, 0), MockInstant::secs(0)),
        Err(ArmError::ClockUnavailable)
    );
    assert!(!state.is_active());
}

#[test]
fn expiry_stops_running_motor_after_alarm() {
    let state = CountdownState::new();
    let motor = MotorState::new();
    let mut countdown = Countdown::new(&state);
    let mut rtc = MockClock::at(DateTime::BOOT);

    countdown
        .program(&mut rtc, duration(1, 3), MockInstant::secs(0))
        .expect("arm");
    let handler = PowerGestureHandler::new(&state, &motor);
    assert_eq!(handler.resolve(PowerEvent::Start, true), GestureOutcome::Started);

    assert_eq!(countdown.poll_expiry(MockInstant::secs(62)), None);
    let generation = countdown
        .poll_expiry(MockInstant::secs(63))
        .expect("expiry at 63 s");

    let toggles: Vec<bool> = AlarmPattern::new().collect();
    assert_eq!(toggles.len(), 6);
    assert_eq!(toggles.last(), Some(&false));

    assert_eq!(
        finish_expiry(&state, &motor, generation),
        ExpiryOutcome {
            cleared: true,
            motor_was_running: true,
        }
    );
    assert!(!state.is_active());
    assert!(!motor.is_running());
}

#[test]
fn start_without_countdown_reports_configuration_needed() {
    let state = CountdownState::new();
    let motor = MotorState::new();
    let handler = PowerGestureHandler::new(&state, &motor);

    assert_eq!(
        handler.resolve(PowerEvent::Start, true),
        GestureOutcome::TimerNotConfigured
    );
    assert!(!motor.is_running());
}

fn duration(minutes: u8, seconds: u8) -> CountdownDuration {
    CountdownDuration::new(minutes, seconds).expect("valid duration")
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl MockInstant {
    fn secs(value: u64) -> Self {
        Self(value * 1_000_000)
    }
}

impl Add<Duration> for MockInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_micros() as u64)
    }
}

struct MockClock {
    unix: u64,
    broken: bool,
}

impl MockClock {
    fn at(time: DateTime) -> Self {
        Self {
            unix: time.unix_time(),
            broken: false,
        }
    }

    fn advance(&mut self, seconds: u64) {
        self.unix += seconds;
    }
}

impl RealTimeClock for MockClock {
    type Error = ();

    fn now(&mut self) -> Result<DateTime, ()> {
        if self.broken {
            Err(())
        } else {
            Ok(DateTime::from_unix(self.unix))
        }
    }

    fn adjust(&mut self, time: DateTime) -> Result<(), ()> {
        self.unix = time.unix_time();
        Ok(())
    }
}
