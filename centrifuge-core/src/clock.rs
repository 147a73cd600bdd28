//! Calendar math for the wall clock.
//!
//! Dates are proleptic Gregorian and convert to and from Unix seconds using
//! the days-from-civil algorithm, so no calendar tables are needed.

use core::fmt;

use crate::command::TimeOfDay;
use crate::hal::RealTimeClock;

const SECONDS_PER_DAY: u64 = 86_400;

/// Broken-down wall-clock timestamp.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Midnight on 2024-01-01, the software clock's power-on value.
    pub const BOOT: Self = Self {
        year: 2024,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Builds a timestamp from Unix seconds.
    #[must_use]
    pub fn from_unix(seconds: u64) -> Self {
        let days = seconds / SECONDS_PER_DAY;
        let secs_of_day = seconds % SECONDS_PER_DAY;
        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: narrow(secs_of_day / 3_600),
            minute: narrow(secs_of_day % 3_600 / 60),
            second: narrow(secs_of_day % 60),
        }
    }

    /// Seconds since 1970-01-01T00:00:00.
    #[must_use]
    pub fn unix_time(&self) -> u64 {
        let days = days_from_civil(self.year, self.month, self.day);
        days * SECONDS_PER_DAY
            + u64::from(self.hour) * 3_600
            + u64::from(self.minute) * 60
            + u64::from(self.second)
    }

    /// Same date and seconds with the hour and minute replaced.
    #[must_use]
    pub const fn with_time_of_day(self, time: TimeOfDay) -> Self {
        Self {
            hour: time.hours(),
            minute: time.minutes(),
            ..self
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Reads the clock, replaces hour and minute, and writes the result back.
pub fn apply_time_of_day<R>(rtc: &mut R, time: TimeOfDay) -> Result<DateTime, R::Error>
where
    R: RealTimeClock,
{
    let updated = rtc.now()?.with_time_of_day(time);
    rtc.adjust(updated)?;
    Ok(updated)
}

fn narrow(value: u64) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

fn days_from_civil(year: u16, month: u8, day: u8) -> u64 {
    let year = i64::from(year) - i64::from(month <= 2);
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month = i64::from(month);
    let shifted_month = if month > 2 { month - 3 } else { month + 9 };
    let day_of_year = (153 * shifted_month + 2) / 5 + i64::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    let days = era * 146_097 + day_of_era - 719_468;
    u64::try_from(days).unwrap_or(0)
}

fn civil_from_days(days: u64) -> (u16, u8, u8) {
    let z = i64::try_from(days).unwrap_or(i64::MAX - 719_468) + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (
        u16::try_from(year).unwrap_or(u16::MAX),
        u8::try_from(month).unwrap_or(1),
        u8::try_from(day).unwrap_or(1),
    )
}
