//! Calendar-aware date-time sampling and unit arithmetic.
//!
//! [`sample_between`] draws each calendar field top-down (year, month, day,
//! hour, minute, second). A field's bounds are narrowed to the range
//! boundary only while every higher field still sits on that boundary, so
//! the result always lies in `[min, max]` and days respect month length and
//! leap years.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};
use rand::{Rng, RngCore};

use crate::errors::GenerationError;
use crate::pattern::{DATE_DASH_PATTERN, DATETIME_PATTERN, DateTimePattern, ISO_PATTERN};

/// Unit used by `datetime` offsets and `datetime_seq` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl FromStr for TimeUnit {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "millisecond" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "second" | "seconds" => Ok(TimeUnit::Second),
            "minute" | "minutes" => Ok(TimeUnit::Minute),
            "hour" | "hours" => Ok(TimeUnit::Hour),
            "day" | "days" => Ok(TimeUnit::Day),
            "month" | "months" => Ok(TimeUnit::Month),
            "year" | "years" => Ok(TimeUnit::Year),
            other => Err(GenerationError::argument(
                "datetime",
                format!("unknown time unit '{other}'"),
            )),
        }
    }
}

impl TimeUnit {
    /// Move `value` by `amount` units; `None` on overflow.
    ///
    /// Sub-day units step on the absolute timeline. Day, month and year
    /// steps move the local wall-clock time; a result inside a DST gap is
    /// pushed forward by the gap length and an ambiguous one takes the
    /// earlier offset.
    pub fn shift<Tz: TimeZone>(self, value: DateTime<Tz>, amount: i64) -> Option<DateTime<Tz>> {
        match self {
            TimeUnit::Millisecond => {
                value.checked_add_signed(TimeDelta::try_milliseconds(amount)?)
            }
            TimeUnit::Second => value.checked_add_signed(TimeDelta::try_seconds(amount)?),
            TimeUnit::Minute => value.checked_add_signed(TimeDelta::try_minutes(amount)?),
            TimeUnit::Hour => value.checked_add_signed(TimeDelta::try_hours(amount)?),
            TimeUnit::Day => {
                let days = Days::new(amount.unsigned_abs());
                let local = value.naive_local();
                let shifted = if amount >= 0 {
                    local.checked_add_days(days)
                } else {
                    local.checked_sub_days(days)
                }?;
                resolve_local(&value, shifted)
            }
            TimeUnit::Month => shift_months(value, amount),
            TimeUnit::Year => shift_months(value, amount.checked_mul(12)?),
        }
    }
}

fn shift_months<Tz: TimeZone>(value: DateTime<Tz>, amount: i64) -> Option<DateTime<Tz>> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    let local = value.naive_local();
    let shifted = if amount >= 0 {
        local.checked_add_months(months)
    } else {
        local.checked_sub_months(months)
    }?;
    resolve_local(&value, shifted)
}

/// Place a local time in `origin`'s zone. Times skipped by a DST gap are
/// read with `origin`'s offset, which lands them after the gap.
fn resolve_local<Tz: TimeZone>(
    origin: &DateTime<Tz>,
    local: NaiveDateTime,
) -> Option<DateTime<Tz>> {
    let zone = origin.timezone();
    if let Some(resolved) = zone.from_local_datetime(&local).earliest() {
        return Some(resolved);
    }
    let offset = TimeDelta::try_seconds(i64::from(origin.offset().fix().local_minus_utc()))?;
    let utc = local.checked_sub_signed(offset)?;
    Some(zone.from_utc_datetime(&utc))
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Sample a date-time in `[min, max]` field by field. Sub-second precision
/// is always zero.
pub fn sample_between(
    rng: &mut dyn RngCore,
    min: NaiveDateTime,
    max: NaiveDateTime,
) -> Result<NaiveDateTime, GenerationError> {
    if min > max {
        return Err(GenerationError::argument("date", "min must be <= max"));
    }

    let year = rng.random_range(min.year()..=max.year());
    let mut on_min = year == min.year();
    let mut on_max = year == max.year();

    let month = sample_field(rng, on_min, on_max, min.month(), max.month(), 1, 12);
    on_min &= month == min.month();
    on_max &= month == max.month();

    let last_day = days_in_month(year, month);
    let day = sample_field(rng, on_min, on_max, min.day(), max.day(), 1, last_day);
    on_min &= day == min.day();
    on_max &= day == max.day();

    let hour = sample_field(rng, on_min, on_max, min.hour(), max.hour(), 0, 23);
    on_min &= hour == min.hour();
    on_max &= hour == max.hour();

    let minute = sample_field(rng, on_min, on_max, min.minute(), max.minute(), 0, 59);
    on_min &= minute == min.minute();
    on_max &= minute == max.minute();

    let second = sample_field(rng, on_min, on_max, min.second(), max.second(), 0, 59);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            GenerationError::argument(
                "date",
                format!("sampled invalid date {year}-{month}-{day} {hour}:{minute}:{second}"),
            )
        })
}

fn sample_field(
    rng: &mut dyn RngCore,
    on_min: bool,
    on_max: bool,
    boundary_min: u32,
    boundary_max: u32,
    natural_min: u32,
    natural_max: u32,
) -> u32 {
    let low = if on_min { boundary_min } else { natural_min };
    let high = if on_max { boundary_max } else { natural_max };
    rng.random_range(low..=high.max(low))
}

/// Built-in range for a pattern family, used when no bounds are given.
pub fn default_range(pattern: &DateTimePattern) -> Option<(&'static str, &'static str)> {
    match pattern.source() {
        ISO_PATTERN => Some(("1970-01-01T00:00:00.000Z", "2018-12-31T23:59:59.000Z")),
        DATE_DASH_PATTERN => Some(("2018-05-01", "2018-12-31")),
        DATETIME_PATTERN => Some(("1970-01-01 00:00:00", "2018-12-31 23:59:59")),
        _ => None,
    }
}

/// Resolve `[min, max]` from zero, one or two textual bounds. A single bound
/// is the lower one and the upper one is the current UTC time; more than two
/// bounds fall back to the family defaults.
pub fn resolve_range(
    pattern: &DateTimePattern,
    bounds: &[&str],
) -> Result<(NaiveDateTime, NaiveDateTime), GenerationError> {
    match bounds {
        [min] => Ok((pattern.parse(min)?, now_utc_seconds())),
        [min, max] => Ok((pattern.parse(min)?, pattern.parse(max)?)),
        _ => {
            let (min, max) = default_range(pattern).ok_or_else(|| {
                GenerationError::argument(
                    "date",
                    format!("no default range for pattern '{}'", pattern.source()),
                )
            })?;
            Ok((pattern.parse(min)?, pattern.parse(max)?))
        }
    }
}

fn now_utc_seconds() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Sample within the resolved range and format with `pattern`.
pub fn random_date_time(
    rng: &mut dyn RngCore,
    pattern: &DateTimePattern,
    bounds: &[&str],
) -> Result<String, GenerationError> {
    let (min, max) = resolve_range(pattern, bounds)?;
    let sampled = sample_between(rng, min, max)?;
    pattern.render(&Utc.from_utc_datetime(&sampled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_length_follows_leap_rules() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
    }

    #[test]
    fn month_shift_clamps_to_month_end() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).single().expect("date");
        let shifted = TimeUnit::Month.shift(start, 1).expect("shift");
        assert_eq!(shifted.to_rfc3339(), "2024-02-29T10:00:00+00:00");
    }

    #[test]
    fn day_shift_into_dst_gap_moves_past_it() {
        let zone: chrono_tz::Tz = "Europe/Paris".parse().expect("zone");
        let start = zone
            .with_ymd_and_hms(2024, 3, 30, 2, 30, 0)
            .single()
            .expect("date");
        let shifted = TimeUnit::Day.shift(start, 1).expect("shift");
        assert_eq!(shifted.to_rfc3339(), "2024-03-31T03:30:00+02:00");
    }

    #[test]
    fn day_shift_into_dst_fold_takes_earlier_offset() {
        let zone: chrono_tz::Tz = "Europe/Paris".parse().expect("zone");
        let start = zone
            .with_ymd_and_hms(2024, 10, 26, 2, 30, 0)
            .single()
            .expect("date");
        let shifted = TimeUnit::Day.shift(start, 1).expect("shift");
        assert_eq!(shifted.to_rfc3339(), "2024-10-27T02:30:00+02:00");
    }

    #[test]
    fn parses_unit_names() {
        assert_eq!("day".parse::<TimeUnit>().ok(), Some(TimeUnit::Day));
        assert_eq!("Years".parse::<TimeUnit>().ok(), Some(TimeUnit::Year));
        assert!("fortnight".parse::<TimeUnit>().is_err());
    }
}
