//! Console session that drives the controller state machines on virtual time.
//!
//! Every emulated task is serviced once per [`TICK`] while `advance` runs, in
//! the same order the firmware tasks would observe each other: gestures,
//! speed buttons, countdown expiry, alarm, then the drive loop. Nothing
//! happens between `advance` commands, so `start` followed by `stop` lands in
//! the single-slot mailbox and only the latest notification is seen.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::ops::Add;
use std::time::Duration;

use centrifuge_core::buttons::{ButtonScanner, IndicatorPattern};
use centrifuge_core::clock::{DateTime, apply_time_of_day};
use centrifuge_core::command::Command;
use centrifuge_core::config::{SPEED_INPUTS, TimingConfig};
use centrifuge_core::countdown::{AlarmPattern, Countdown, CountdownState, finish_expiry};
use centrifuge_core::display::{CountdownReadout, format_clock};
use centrifuge_core::gesture::{GestureOutcome, PowerEvent, PowerGestureHandler};
use centrifuge_core::hal::RealTimeClock;
use centrifuge_core::keypad::{InputParser, KeypadEvent};
use centrifuge_core::motor::{MotorState, SpeedSelection};
use centrifuge_core::telemetry::{TelemetryEventKind, TelemetryLog, TelemetryRecord};

/// Virtual time step used by `advance`.
const TICK: Duration = Duration::from_millis(10);
/// Longest span a single `advance` accepts.
const MAX_ADVANCE: Duration = Duration::from_secs(3600);
const TRANSCRIPT_CAPACITY: usize = 256;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "keys",
        "keys <sequence>     - type on the keypad, e.g. `keys A0103#`",
    ),
    (
        "start",
        "start               - press and hold the start input",
    ),
    (
        "stop",
        "stop                - press and hold the stop input",
    ),
    (
        "press",
        "press <1-4>         - tap a speed button (10/35/60/120 rpm)",
    ),
    (
        "advance",
        "advance <seconds>   - let virtual time pass",
    ),
    (
        "status",
        "status              - show displays, motor and alarm state",
    ),
    ("log", "log                 - replay the telemetry history"),
    ("help", "help [topic]        - show help for a command"),
];

/// Monotonic instant measured from session start.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct VirtualInstant(Duration);

impl Add<Duration> for VirtualInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl fmt::Display for VirtualInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>9.3}s", self.0.as_secs_f64())
    }
}

/// Software RTC following the session's virtual time.
#[derive(Clone, Copy, Debug)]
struct WallClock {
    base_unix: u64,
    base_at: VirtualInstant,
    now: VirtualInstant,
}

impl WallClock {
    fn new(start: DateTime) -> Self {
        Self {
            base_unix: start.unix_time(),
            base_at: VirtualInstant::default(),
            now: VirtualInstant::default(),
        }
    }

    fn tick(&mut self, now: VirtualInstant) {
        self.now = now;
    }
}

impl RealTimeClock for WallClock {
    type Error = Infallible;

    fn now(&mut self) -> Result<DateTime, Infallible> {
        let elapsed = self.now.0.saturating_sub(self.base_at.0).as_secs();
        Ok(DateTime::from_unix(self.base_unix + elapsed))
    }

    fn adjust(&mut self, time: DateTime) -> Result<(), Infallible> {
        self.base_unix = time.unix_time();
        self.base_at = self.now;
        Ok(())
    }
}

/// Flags the emulated tasks share, mirroring the firmware statics.
#[derive(Debug)]
pub struct SharedState {
    pub countdown: CountdownState,
    pub motor: MotorState,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            countdown: CountdownState::new(),
            motor: MotorState::new(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct AlarmRun {
    generation: u32,
    pattern: AlarmPattern,
    next_at: VirtualInstant,
}

pub struct Session<'a> {
    shared: &'a SharedState,
    timing: TimingConfig,
    now: VirtualInstant,
    clock: WallClock,
    parser: InputParser,
    countdown: Countdown<'a, VirtualInstant>,
    gestures: PowerGestureHandler<'a>,
    mailbox: Option<PowerEvent>,
    debouncing: Option<(PowerEvent, VirtualInstant)>,
    start_line: bool,
    stop_line: bool,
    scanner: ButtonScanner<VirtualInstant>,
    taps: VecDeque<usize>,
    held: Option<usize>,
    next_scan: VirtualInstant,
    speed_queue: VecDeque<SpeedSelection>,
    speed: SpeedSelection,
    indicators: IndicatorPattern,
    step_credit: Duration,
    steps: u64,
    alarm: Option<AlarmRun>,
    buzzer: bool,
    telemetry: TelemetryLog<VirtualInstant, TRANSCRIPT_CAPACITY>,
    output: Vec<String>,
}

impl<'a> Session<'a> {
    pub fn new(shared: &'a SharedState, timing: TimingConfig) -> Self {
        Self {
            shared,
            timing,
            now: VirtualInstant::default(),
            clock: WallClock::new(DateTime::BOOT),
            parser: InputParser::new(),
            countdown: Countdown::new(&shared.countdown),
            gestures: PowerGestureHandler::new(&shared.countdown, &shared.motor),
            mailbox: None,
            debouncing: None,
            start_line: false,
            stop_line: false,
            scanner: ButtonScanner::new(timing.button_debounce),
            taps: VecDeque::new(),
            held: None,
            next_scan: VirtualInstant::default(),
            speed_queue: VecDeque::new(),
            speed: SpeedSelection::DEFAULT,
            indicators: IndicatorPattern::DARK,
            step_credit: Duration::ZERO,
            steps: 0,
            alarm: None,
            buzzer: false,
            telemetry: TelemetryLog::new(),
            output: Vec::new(),
        }
    }

    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Vec::new();
        };
        let args: Vec<&str> = words.collect();

        match verb.to_ascii_lowercase().as_str() {
            "keys" => self.type_keys(&args.concat()),
            "start" => self.notify(PowerEvent::Start),
            "stop" => self.notify(PowerEvent::Stop),
            "press" => self.handle_press(&args),
            "advance" => self.handle_advance(&args),
            "status" => self.status(),
            "log" => self.replay_log(),
            "help" => self.help(args.first().copied()),
            other => self
                .output
                .push(format!("Unknown command `{other}`. Type `help` for a list.")),
        }

        std::mem::take(&mut self.output)
    }

    pub const fn now(&self) -> VirtualInstant {
        self.now
    }

    pub fn telemetry(&self) -> impl Iterator<Item = &TelemetryRecord<VirtualInstant>> {
        self.telemetry.oldest_first()
    }

    fn type_keys(&mut self, keys: &str) {
        if keys.is_empty() {
            self.output.push("keys: nothing to type".to_string());
            return;
        }
        for key in keys.chars() {
            let event = self.parser.feed(key);
            self.output.push(format!("keypad {event}"));
            if let Some(kind) = TelemetryEventKind::from_keypad(&event) {
                self.record(kind);
            }
            if let KeypadEvent::Submitted(command) = event {
                self.record(TelemetryEventKind::CommandQueued(command));
                self.dispatch(command);
            }
        }
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::SetDuration(duration) => {
                let event = match self.countdown.program(&mut self.clock, duration, self.now) {
                    Ok(armed) => TelemetryEventKind::armed(&armed),
                    Err(error) => TelemetryEventKind::ArmFailed(error),
                };
                self.record(event);
            }
            Command::SetClock(time) => {
                let Ok(_) = apply_time_of_day(&mut self.clock, time);
                self.record(TelemetryEventKind::ClockAdjusted(time));
            }
        }
    }

    fn notify(&mut self, event: PowerEvent) {
        self.start_line = event == PowerEvent::Start;
        self.stop_line = event == PowerEvent::Stop;
        if let Some(replaced) = self.mailbox.replace(event) {
            self.output
                .push(format!("{event} input asserted, replaces pending {replaced}"));
        } else {
            self.output.push(format!("{event} input asserted"));
        }
    }

    fn handle_press(&mut self, args: &[&str]) {
        let index = args
            .first()
            .and_then(|arg| arg.parse::<usize>().ok())
            .filter(|button| (1..=SPEED_INPUTS).contains(button));
        match index {
            Some(button) => {
                self.taps.push_back(button - 1);
                self.output
                    .push(format!("speed button {button} tapped, scanned on advance"));
            }
            None => self
                .output
                .push(format!("press: expected a button between 1 and {SPEED_INPUTS}")),
        }
    }

    fn handle_advance(&mut self, args: &[&str]) {
        let span = args
            .first()
            .and_then(|arg| arg.parse::<f64>().ok())
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok());
        let Some(span) = span else {
            self.output
                .push("advance: expected a number of seconds".to_string());
            return;
        };
        if span > MAX_ADVANCE {
            self.output.push(format!(
                "advance: at most {} seconds per step",
                MAX_ADVANCE.as_secs()
            ));
            return;
        }
        self.advance(span);
        self.output.push(format!("now {}", self.now));
    }

    fn advance(&mut self, span: Duration) {
        let target = self.now + span;
        while self.now < target {
            self.tick();
        }
    }

    fn tick(&mut self) {
        self.now = self.now + TICK;
        self.clock.tick(self.now);
        self.service_gestures();
        self.service_buttons();
        self.service_countdown();
        self.service_alarm();
        self.service_drive();
    }

    fn service_gestures(&mut self) {
        if let Some((event, due)) = self.debouncing {
            if self.now >= due {
                self.debouncing = None;
                let asserted = match event {
                    PowerEvent::Start => self.start_line,
                    PowerEvent::Stop => self.stop_line,
                };
                let outcome = self.gestures.resolve(event, asserted);
                self.report_gesture(outcome);
            }
            return;
        }
        let Some(event) = self.mailbox.take() else {
            return;
        };
        if self.gestures.needs_debounce(event) {
            self.debouncing = Some((event, self.now + self.timing.gesture_debounce));
        } else {
            self.report_gesture(GestureOutcome::AlreadyInState(event));
        }
    }

    fn report_gesture(&mut self, outcome: GestureOutcome) {
        self.output.push(format!("[{}] gesture: {outcome}", self.now));
        if let Some(kind) = TelemetryEventKind::from_gesture(outcome) {
            self.record(kind);
        }
    }

    fn service_buttons(&mut self) {
        if self.now < self.next_scan {
            return;
        }
        let sample = if self.held.take().is_some() {
            [false; SPEED_INPUTS]
        } else if let Some(index) = self.taps.pop_front() {
            self.held = Some(index);
            core::array::from_fn(|slot| slot == index)
        } else {
            [false; SPEED_INPUTS]
        };

        let pause = match self.scanner.scan(self.now, sample) {
            Some(press) => {
                self.indicators = press.indicators;
                self.record(TelemetryEventKind::SpeedSelected {
                    input: u8::try_from(press.input).unwrap_or(u8::MAX),
                    speed: press.selection,
                });
                self.speed_queue.push_back(press.selection);
                self.timing.button_settle
            }
            None => self.timing.button_scan_period,
        };
        self.next_scan = self.now + pause;
    }

    fn service_countdown(&mut self) {
        if let Some(generation) = self.countdown.poll_expiry(self.now) {
            self.record(TelemetryEventKind::CountdownExpired);
            self.alarm = Some(AlarmRun {
                generation,
                pattern: AlarmPattern::new(),
                next_at: self.now,
            });
        }
    }

    fn service_alarm(&mut self) {
        let now = self.now;
        let phase = self.timing.alarm_phase;
        let Some(run) = self.alarm.as_mut() else {
            return;
        };
        if now < run.next_at {
            return;
        }
        if let Some(sounding) = run.pattern.next() {
            run.next_at = now + phase;
            self.buzzer = sounding;
            self.record(TelemetryEventKind::BuzzerToggled { sounding });
            return;
        }
        let generation = run.generation;
        self.alarm = None;
        let outcome = finish_expiry(&self.shared.countdown, &self.shared.motor, generation);
        self.record(TelemetryEventKind::CountdownFinished(outcome));
    }

    fn service_drive(&mut self) {
        if self.shared.motor.is_running() {
            self.step_credit += TICK;
            let interval = self.speed.step_interval();
            while self.step_credit >= interval {
                self.step_credit -= interval;
                self.steps += 1;
            }
        } else {
            self.step_credit = Duration::ZERO;
        }
        if let Some(next) = self.speed_queue.pop_front() {
            self.speed = next;
            self.record(TelemetryEventKind::SpeedApplied(next));
        }
    }

    fn record(&mut self, event: TelemetryEventKind) {
        let id = self.telemetry.record(event, self.now);
        self.output.push(format!(
            "[{}] #{id:<4} {:<5} {event}",
            self.now,
            event.severity().label()
        ));
    }

    fn countdown_readout(&mut self) -> CountdownReadout {
        if !self.shared.countdown.is_active() {
            return CountdownReadout::IDLE;
        }
        let Ok(now) = self.clock.now();
        CountdownReadout::from_remaining(self.shared.countdown.remaining_seconds(now.unix_time()))
    }

    fn status(&mut self) {
        let Ok(wall) = self.clock.now();
        let readout = self.countdown_readout();
        let lit: String = (0..SPEED_INPUTS)
            .map(|index| if self.indicators.is_lit(index) { '*' } else { '.' })
            .collect();
        let pending = self
            .mailbox
            .or(self.debouncing.map(|(event, _)| event))
            .map_or_else(|| "none".to_string(), |event| event.to_string());

        self.output.extend([
            format!("clock      {} ({wall})", format_clock(&wall)),
            format!(
                "countdown  {} ({})",
                readout.text(),
                if self.shared.countdown.is_active() {
                    "active"
                } else {
                    "idle"
                }
            ),
            format!(
                "motor      {} at {}, {} steps",
                if self.shared.motor.is_running() {
                    "running"
                } else {
                    "stopped"
                },
                self.speed,
                self.steps
            ),
            format!("indicators {lit}"),
            format!("buzzer     {}", if self.buzzer { "on" } else { "off" }),
            format!("gesture    {pending}"),
            format!(
                "keypad     mode={} digits=`{}`",
                self.parser
                    .buffer()
                    .mode()
                    .map_or("none", |mode| mode.label()),
                self.parser.buffer().digits()
            ),
        ]);
    }

    fn replay_log(&mut self) {
        if self.telemetry.is_empty() {
            self.output.push("no telemetry recorded yet".to_string());
            return;
        }
        let lines: Vec<String> = self
            .telemetry()
            .map(|record| {
                format!(
                    "[{}] #{:<4} {:<5} {}",
                    record.timestamp,
                    record.id,
                    record.event.severity().label(),
                    record.event
                )
            })
            .collect();
        self.output.extend(lines);
    }

    fn help(&mut self, topic: Option<&str>) {
        match topic {
            Some(topic) => match HELP_TOPICS.iter().find(|(name, _)| *name == topic) {
                Some((_, usage)) => self.output.push((*usage).to_string()),
                None => self.output.push(format!(
                    "No help for `{topic}`. Topics: {}",
                    help_topic_list()
                )),
            },
            None => {
                self.output
                    .extend(HELP_TOPICS.iter().map(|(_, usage)| (*usage).to_string()));
            }
        }
    }
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use centrifuge_core::countdown::ExpiryOutcome;

    fn run(session: &mut Session<'_>, commands: &[&str]) -> Vec<String> {
        commands
            .iter()
            .flat_map(|command| session.handle_command(command))
            .collect()
    }

    fn count(session: &Session<'_>, kind: &TelemetryEventKind) -> usize {
        session
            .telemetry()
            .filter(|record| record.event == *kind)
            .count()
    }

    #[test]
    fn timed_run_stops_motor_after_alarm() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        run(&mut session, &["keys A0103#"]);
        assert!(shared.countdown.is_active());
        assert_eq!(
            shared.countdown.end_unix(),
            Some(DateTime::BOOT.unix_time() + 63)
        );

        run(&mut session, &["start", "advance 0.5"]);
        assert!(shared.motor.is_running());

        run(&mut session, &["advance 62"]);
        assert!(shared.motor.is_running());
        assert_eq!(count(&session, &TelemetryEventKind::CountdownExpired), 0);

        run(&mut session, &["advance 1"]);
        assert_eq!(count(&session, &TelemetryEventKind::CountdownExpired), 1);

        run(&mut session, &["advance 7"]);
        assert!(!shared.motor.is_running());
        assert!(!shared.countdown.is_active());
        let toggles = session
            .telemetry()
            .filter(|record| matches!(record.event, TelemetryEventKind::BuzzerToggled { .. }))
            .count();
        assert_eq!(toggles, 6);
        assert_eq!(
            count(
                &session,
                &TelemetryEventKind::CountdownFinished(ExpiryOutcome {
                    cleared: true,
                    motor_was_running: true,
                })
            ),
            1
        );
        assert!(!session.buzzer);
    }

    #[test]
    fn rearm_during_alarm_keeps_new_run_going() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        run(&mut session, &["keys A0002#", "start", "advance 2.5"]);
        assert_eq!(count(&session, &TelemetryEventKind::CountdownExpired), 1);

        run(&mut session, &["keys A0100#", "advance 7"]);

        assert!(shared.motor.is_running());
        assert!(shared.countdown.is_active());
        assert_eq!(
            count(
                &session,
                &TelemetryEventKind::CountdownFinished(ExpiryOutcome {
                    cleared: false,
                    motor_was_running: false,
                })
            ),
            1
        );
        assert_eq!(count(&session, &TelemetryEventKind::MotorStopped), 0);
    }

    #[test]
    fn start_without_countdown_asks_for_configuration() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        let output = run(&mut session, &["start", "advance 0.5"]);

        assert!(!shared.motor.is_running());
        assert_eq!(count(&session, &TelemetryEventKind::StartRejected), 1);
        assert!(
            output
                .iter()
                .any(|line| line.contains("configure the timer first"))
        );
    }

    #[test]
    fn start_then_stop_before_advance_collapses_to_stop() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        run(&mut session, &["keys A0500#", "start", "stop", "advance 1"]);

        assert!(!shared.motor.is_running());
        assert!(shared.countdown.is_active());
        assert_eq!(count(&session, &TelemetryEventKind::MotorStarted), 0);
        assert_eq!(count(&session, &TelemetryEventKind::MotorStopped), 0);
    }

    #[test]
    fn rearm_fires_once_from_second_duration() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        run(&mut session, &["keys A0010#", "advance 5", "keys A0015#"]);
        run(&mut session, &["advance 14.5"]);
        assert_eq!(count(&session, &TelemetryEventKind::CountdownExpired), 0);

        run(&mut session, &["advance 1"]);
        assert_eq!(count(&session, &TelemetryEventKind::CountdownExpired), 1);
    }

    #[test]
    fn speed_taps_apply_in_order_and_light_last_button() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        run(&mut session, &["press 4", "press 1", "press 2", "advance 3"]);

        let applied: Vec<u16> = session
            .telemetry()
            .filter_map(|record| match record.event {
                TelemetryEventKind::SpeedApplied(speed) => Some(speed.rpm()),
                _ => None,
            })
            .collect();
        assert_eq!(applied, [120, 10, 35]);
        assert_eq!(session.indicators, IndicatorPattern::only(1));
        assert_eq!(session.speed.rpm(), 35);
    }

    #[test]
    fn clock_entry_updates_displayed_time() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        let output = run(&mut session, &["keys B2359#", "status"]);

        assert!(output.iter().any(|line| line.starts_with("clock      23:59:00")));
    }

    #[test]
    fn invalid_clock_entry_is_reported_and_discarded() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        let output = run(&mut session, &["keys B2400#", "status"]);

        assert!(output.iter().any(|line| line.contains("input-rejected")));
        assert!(output.iter().any(|line| line.starts_with("clock      00:00:00")));
    }

    #[test]
    fn unknown_command_points_at_help() {
        let shared = SharedState::new();
        let mut session = Session::new(&shared, TimingConfig::DEFAULT);

        let output = session.handle_command("spin");

        assert_eq!(output, ["Unknown command `spin`. Type `help` for a list."]);
    }
}
