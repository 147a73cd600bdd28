use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::Peri;
use embassy_stm32::gpio::{Input, Level, Output, Pin, Pull, Speed};
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use centrifuge_core::clock::DateTime;
use centrifuge_core::config::TimingConfig;
use centrifuge_core::countdown::CountdownState;
use centrifuge_core::gesture::{PowerEvent, PowerGestureHandler};
use centrifuge_core::motor::MotorState;

use crate::buttons::SpeedButtonTask;
use crate::channels::{
    AlarmSignal, ClockQueue, CommandRouter, DurationQueue, PowerMailbox, SpeedQueue,
};
use crate::clock::{ClockUpdater, SharedClock};
use crate::countdown::{AlarmSequencer, CountdownController};
use crate::display::{ClockDisplayTask, CountdownDisplayTask};
use crate::drive::DriveTask;
use crate::hw::displays::{LoggedSegments, LoggedText};
use crate::hw::gpio::{GpioBuzzer, GpioStepper, LedBank, SpeedButtons};
use crate::hw::keypad::MatrixKeypad;
use crate::hw::lines::EdgeWatcher;
use crate::input::KeypadWorker;
use crate::power::{LineLevel, PowerTask};
use crate::telemetry::TelemetryRecorder;
use crate::time::core_duration_to_embassy;

mod countdown_task;
mod display_task;
mod input_task;
mod power_task;
mod speed_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

static DURATION_QUEUE: DurationQueue = Channel::new();
static CLOCK_QUEUE: ClockQueue = Channel::new();
static SPEED_QUEUE: SpeedQueue = Channel::new();
static POWER_MAILBOX: PowerMailbox = PowerMailbox::new();
static ALARM: AlarmSignal = Signal::new();

static COUNTDOWN: CountdownState = CountdownState::new();
static MOTOR: MotorState = MotorState::new();
static CLOCK: SharedClock = SharedClock::new();
static START_LINE: LineLevel = LineLevel::new();
static STOP_LINE: LineLevel = LineLevel::new();
static TELEMETRY: TelemetryRecorder = TelemetryRecorder::new();

fn row(pin: Peri<'static, impl Pin>) -> Output<'static> {
    Output::new(pin, Level::High, Speed::Low)
}

fn pulled_up(pin: Peri<'static, impl Pin>) -> Input<'static> {
    Input::new(pin, Pull::Up)
}

fn low(pin: Peri<'static, impl Pin>) -> Output<'static> {
    Output::new(pin, Level::Low, Speed::Low)
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA2,
        PA3,
        PA4,
        PA5,
        PA6,
        PA7,
        PA8,
        PA9,
        PA10,
        PA15,
        PB0,
        PB1,
        PB2,
        PB3,
        PB4,
        PB5,
        PB6,
        PB7,
        PB8,
        EXTI7,
        EXTI8,
        ..
    } = hal::init(config);
    let timing = TimingConfig::DEFAULT;
    let ticks = core_duration_to_embassy;

    CLOCK.start(DateTime::BOOT);

    let keypad = MatrixKeypad::new(
        [row(PA0), row(PA1), row(PA2), row(PA3)],
        [
            pulled_up(PA4),
            pulled_up(PA5),
            pulled_up(PA6),
            pulled_up(PA7),
        ],
    );
    let keypad_worker = KeypadWorker::new(
        keypad,
        CommandRouter::new(DURATION_QUEUE.sender(), CLOCK_QUEUE.sender()),
        &TELEMETRY,
        ticks(timing.keypad_poll),
    );
    spawner
        .spawn(input_task::run(keypad_worker))
        .expect("failed to spawn keypad task");

    let controller = CountdownController::new(
        DURATION_QUEUE.receiver(),
        &COUNTDOWN,
        &CLOCK,
        &ALARM,
        &TELEMETRY,
    );
    spawner
        .spawn(countdown_task::run_controller(controller))
        .expect("failed to spawn countdown task");

    let alarm = AlarmSequencer::new(
        &ALARM,
        GpioBuzzer::new(low(PB2)),
        &COUNTDOWN,
        &MOTOR,
        &TELEMETRY,
        ticks(timing.alarm_phase),
    );
    spawner
        .spawn(countdown_task::run_alarm(alarm))
        .expect("failed to spawn alarm task");

    let updater = ClockUpdater::new(CLOCK_QUEUE.receiver(), &CLOCK, &TELEMETRY);
    spawner
        .spawn(countdown_task::run_clock_updater(updater))
        .expect("failed to spawn clock updater task");

    let countdown_display = CountdownDisplayTask::new(
        LoggedSegments::default(),
        &CLOCK,
        &COUNTDOWN,
        &TELEMETRY,
        ticks(timing.display_period),
    );
    spawner
        .spawn(display_task::run_countdown(countdown_display))
        .expect("failed to spawn countdown display task");

    let clock_display = ClockDisplayTask::new(
        LoggedText::default(),
        &CLOCK,
        &TELEMETRY,
        ticks(timing.display_period),
    );
    spawner
        .spawn(display_task::run_clock(clock_display))
        .expect("failed to spawn clock display task");

    let start = EdgeWatcher::new(
        ExtiInput::new(PB7, EXTI7, Pull::Up),
        &START_LINE,
        &POWER_MAILBOX,
        PowerEvent::Start,
    );
    let stop = EdgeWatcher::new(
        ExtiInput::new(PB8, EXTI8, Pull::Up),
        &STOP_LINE,
        &POWER_MAILBOX,
        PowerEvent::Stop,
    );
    spawner
        .spawn(power_task::watch(start))
        .expect("failed to spawn start line watcher");
    spawner
        .spawn(power_task::watch(stop))
        .expect("failed to spawn stop line watcher");

    let gestures = PowerTask::new(
        &POWER_MAILBOX,
        PowerGestureHandler::new(&COUNTDOWN, &MOTOR),
        &START_LINE,
        &STOP_LINE,
        &TELEMETRY,
        ticks(timing.notify_wait),
        ticks(timing.gesture_debounce),
    );
    spawner
        .spawn(power_task::run(gestures))
        .expect("failed to spawn power gesture task");

    let buttons = SpeedButtonTask::new(
        SpeedButtons::new([
            pulled_up(PA8),
            pulled_up(PA9),
            pulled_up(PA10),
            pulled_up(PA15),
        ]),
        LedBank::new([low(PB3), low(PB4), low(PB5), low(PB6)]),
        SPEED_QUEUE.sender(),
        &TELEMETRY,
        timing,
    );
    spawner
        .spawn(speed_task::run_buttons(buttons))
        .expect("failed to spawn speed button task");

    let drive = DriveTask::new(
        GpioStepper::new(low(PB0), low(PB1)),
        &MOTOR,
        SPEED_QUEUE.receiver(),
        &TELEMETRY,
        ticks(timing.speed_poll),
    );
    spawner
        .spawn(speed_task::run_drive(drive))
        .expect("failed to spawn drive task");

    core::future::pending::<()>().await;
}
