//! Unix-second timestamps used by every record.

use chrono::Utc;

pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

/// Current time as unix seconds.
#[must_use]
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Days since the unix epoch for a timestamp.
#[must_use]
pub const fn day_index(timestamp: i64) -> i64 {
    timestamp.div_euclid(DAY)
}

/// `YYYY-MM-DD` of a day index, in UTC.
#[must_use]
pub fn day_label(day: i64) -> String {
    chrono::DateTime::from_timestamp(day * DAY, 0)
        .map_or_else(|| day.to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}
