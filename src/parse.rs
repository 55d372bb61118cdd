//! Boundary parsing for dates and times of day.
//!
//! Everything here rejects malformed input with [`ScheduleError::Validation`]
//! so the resolver only ever sees well-formed values.

use crate::error::{ScheduleError, ScheduleResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub fn parse_date(input: &str) -> ScheduleResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::validation(format!("invalid date '{input}' (YYYY-MM-DD)")))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(input: &str) -> ScheduleResult<NaiveTime> {
    let trimmed = input.trim();
    let mut fields = trimmed.split(':');
    let (Some(hour), Some(minute)) = (fields.next(), fields.next()) else {
        return Err(ScheduleError::validation(format!(
            "invalid time of day '{input}' (HH:MM or HH:MM:SS)"
        )));
    };
    let second = fields.next().unwrap_or("0");
    if fields.next().is_some() {
        return Err(ScheduleError::validation(format!(
            "invalid time of day '{input}' (HH:MM or HH:MM:SS)"
        )));
    }

    let parse_field = |value: &str, label: &str| -> ScheduleResult<u32> {
        value.parse::<u32>().map_err(|_| {
            ScheduleError::validation(format!("invalid {label} '{value}' in time of day '{input}'"))
        })
    };
    let hour = parse_field(hour, "hour")?;
    let minute = parse_field(minute, "minute")?;
    let second = parse_field(second, "second")?;
    if hour > 23 {
        return Err(ScheduleError::validation(format!(
            "hour {hour} out of range in time of day '{input}'"
        )));
    }

    NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| ScheduleError::validation(format!("invalid time of day '{input}'")))
}

/// `YYYY-MM-DDTHH:MM[:SS]`; a space is accepted in place of the `T`.
pub fn parse_date_time(input: &str) -> ScheduleResult<NaiveDateTime> {
    let trimmed = input.trim();
    let Some((date, time)) = trimmed.split_once(['T', ' ']) else {
        return Err(ScheduleError::validation(format!(
            "invalid date-time '{input}' (YYYY-MM-DDTHH:MM)"
        )));
    };
    Ok(parse_date(date)?.and_time(parse_time_of_day(time)?))
}

pub fn format_time_of_day(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

/// Serde adapter for `NaiveTime` fields written as `HH:MM[:SS]`.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
