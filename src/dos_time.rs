//! MS-DOS packed date/time conversions
//!
//! Layout of the 32-bit value, low half first:
//!
//! - bits 0-4: seconds / 2
//! - bits 5-10: minutes
//! - bits 11-15: hours
//! - bits 16-20: day of month
//! - bits 21-24: month
//! - bits 25-31: years since 1980
//!
//! Timestamps are host-local wall-clock times (`NaiveDateTime`).

use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone,
    Timelike,
};
use std::time::SystemTime;
use tracing::warn;

const DOS_EPOCH_YEAR: i32 = 1980;
const DOS_MAX_YEAR: i32 = DOS_EPOCH_YEAR + 127;

/// How the one-hour daylight-saving adjustment is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DaylightSaving {
    /// Subtract an hour before packing a DST timestamp and add it back on
    /// extraction. Matches archives produced by older builds of this codec.
    #[default]
    Compensate,
    /// Store and restore wall-clock times unchanged
    Ignore,
}

impl DaylightSaving {
    /// Timestamp to pack into a header being written
    pub fn adjust_for_write(self, t: NaiveDateTime) -> NaiveDateTime {
        match self {
            DaylightSaving::Compensate if is_daylight_saving(t) => t - TimeDelta::hours(1),
            _ => t,
        }
    }

    /// Timestamp to apply to a file being extracted.
    ///
    /// The check uses the decoded timestamp's own DST state, not the one the
    /// original time had when it was packed.
    pub fn adjust_for_extract(self, t: NaiveDateTime) -> NaiveDateTime {
        match self {
            DaylightSaving::Compensate if is_daylight_saving(t) => t + TimeDelta::hours(1),
            _ => t,
        }
    }
}

/// Pack a timestamp. Years outside 1980..=2107 are clamped to the representable range.
pub fn to_packed(t: NaiveDateTime) -> u32 {
    let (year, month, day, hour, minute, second) = if t.year() < DOS_EPOCH_YEAR {
        (DOS_EPOCH_YEAR, 1, 1, 0, 0, 0)
    } else if t.year() > DOS_MAX_YEAR {
        (DOS_MAX_YEAR, 12, 31, 23, 59, 58)
    } else {
        (t.year(), t.month(), t.day(), t.hour(), t.minute(), t.second())
    };

    let time = (hour << 11) | (minute << 5) | (second >> 1);
    let date = (((year - DOS_EPOCH_YEAR) as u32) << 9) | (month << 5) | day;

    (date << 16) | time
}

/// Decode a packed value, or `None` if it does not name a real calendar date/time
pub fn try_from_packed(packed: u32) -> Option<NaiveDateTime> {
    let time = packed & 0xFFFF;
    let date = packed >> 16;

    let second = (time & 0x1F) * 2;
    let minute = (time >> 5) & 0x3F;
    let hour = time >> 11;

    let day = date & 0x1F;
    let month = (date >> 5) & 0x0F;
    let year = DOS_EPOCH_YEAR + (date >> 9) as i32;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Decode a packed value, falling back to the current local time for invalid dates
pub fn from_packed(packed: u32) -> NaiveDateTime {
    try_from_packed(packed).unwrap_or_else(|| {
        warn!("invalid packed date/time 0x{packed:08x}, using now");
        Local::now().naive_local()
    })
}

/// Whether the host time zone observes daylight saving at local time `t`.
///
/// A time is in DST when its UTC offset is larger than the smaller of the
/// offsets in force on 1 January and 1 July of the same year. Local times that
/// do not exist (inside a spring-forward gap) report `false`.
pub fn is_daylight_saving(t: NaiveDateTime) -> bool {
    let Some(offset) = local_offset(t) else {
        return false;
    };

    let midyear = |month| {
        NaiveDate::from_ymd_opt(t.year(), month, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .and_then(local_offset)
    };

    match (midyear(1), midyear(7)) {
        (Some(january), Some(july)) if january != july => offset > january.min(july),
        _ => false,
    }
}

fn local_offset(t: NaiveDateTime) -> Option<i32> {
    Local
        .from_local_datetime(&t)
        .earliest()
        .map(|dt| dt.offset().local_minus_utc())
}

/// Convert a file-system timestamp to host-local wall-clock time
pub fn from_system_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

/// Convert host-local wall-clock time to a file-system timestamp.
///
/// Ambiguous times take the earlier instant. Times inside a spring-forward
/// gap are read with the offset in force just before the gap, so 02:30 on a
/// night that skips 02:00-03:00 becomes 03:30 daylight time.
pub fn to_system_time(t: NaiveDateTime) -> Option<SystemTime> {
    let resolved = match Local.from_local_datetime(&t) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = Local
                .from_local_datetime(&(t - TimeDelta::hours(3)))
                .earliest()?;
            let utc = t - TimeDelta::seconds(i64::from(before.offset().local_minus_utc()));
            Local.from_utc_datetime(&utc)
        }
    };
    Some(SystemTime::from(resolved))
}
