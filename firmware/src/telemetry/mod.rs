//! Shared telemetry recorder and logging helpers.
//!
//! Every task reports through one [`TelemetryRecorder`]. Records land in a
//! critical-section guarded [`TelemetryLog`] and are mirrored to defmt on the
//! MCU or stdout on the host so bring-up sessions see them immediately.

use core::cell::RefCell;

#[cfg(target_os = "none")]
use centrifuge_core::telemetry::Severity;
use centrifuge_core::telemetry::{EventId, TelemetryEventKind, TelemetryLog, TelemetryRecord};
use embassy_sync::blocking_mutex::Mutex;

use crate::channels::CentrifugeMutex;
use crate::time::FirmwareInstant;

pub type FirmwareRecord = TelemetryRecord<FirmwareInstant>;

pub struct TelemetryRecorder {
    log: Mutex<CentrifugeMutex, RefCell<TelemetryLog<FirmwareInstant>>>,
}

impl TelemetryRecorder {
    pub const fn new() -> Self {
        Self {
            log: Mutex::new(RefCell::new(TelemetryLog::new())),
        }
    }

    /// Records `event` at the current instant and mirrors it to the console.
    pub fn record(&self, event: TelemetryEventKind) -> EventId {
        let timestamp = FirmwareInstant::now();
        let id = self
            .log
            .lock(|log| log.borrow_mut().record(event, timestamp));
        emit_log(id, timestamp, &event);
        id
    }

    pub fn latest(&self) -> Option<FirmwareRecord> {
        self.log.lock(|log| log.borrow().latest().copied())
    }

    pub fn len(&self) -> usize {
        self.log.lock(|log| log.borrow().len())
    }

    /// `true` if a retained record matches `predicate`.
    pub fn contains(&self, predicate: impl FnMut(&TelemetryEventKind) -> bool) -> bool {
        self.log.lock(|log| log.borrow().contains(predicate))
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "none")]
fn emit_log(id: EventId, timestamp: FirmwareInstant, event: &TelemetryEventKind) {
    let micros = timestamp.into_embassy().as_micros();
    let rendered = defmt::Display2Format(event);
    match event.severity() {
        Severity::Info => defmt::info!("telemetry #{} t={}us {}", id, micros, rendered),
        Severity::Warn => defmt::warn!("telemetry #{} t={}us {}", id, micros, rendered),
        Severity::Error => defmt::error!("telemetry #{} t={}us {}", id, micros, rendered),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(id: EventId, timestamp: FirmwareInstant, event: &TelemetryEventKind) {
    let micros = timestamp.into_embassy().as_micros();
    let level = event.severity().label();
    println!("telemetry:{level} #{id} t={micros}us {event}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use centrifuge_core::countdown::ArmError;

    #[test]
    fn records_are_numbered_and_retained() {
        let recorder = TelemetryRecorder::new();
        assert_eq!(recorder.record(TelemetryEventKind::MotorStarted), 0);
        assert_eq!(
            recorder.record(TelemetryEventKind::ArmFailed(ArmError::ZeroDuration)),
            1
        );

        let latest = recorder.latest().expect("latest record");
        assert_eq!(latest.id, 1);
        assert_eq!(
            latest.event,
            TelemetryEventKind::ArmFailed(ArmError::ZeroDuration)
        );
        assert_eq!(recorder.len(), 2);
        assert!(recorder.contains(|event| *event == TelemetryEventKind::MotorStarted));
    }
}
