//! Monotonic time glue between embassy and `centrifuge-core`.

use core::ops::Add;

use embassy_time::{Duration, Instant};

/// Embassy instant that satisfies the core's `Add<core::time::Duration>` bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub const fn into_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl Add<core::time::Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: core::time::Duration) -> Self {
        Self(self.0 + core_duration_to_embassy(rhs))
    }
}

pub fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_core_duration_matches_embassy_math() {
        let start = FirmwareInstant::from(Instant::from_micros(1_000));
        let later = start + core::time::Duration::from_millis(63);
        assert_eq!(later.into_embassy(), Instant::from_micros(64_000));
        assert!(later > start);
    }
}
