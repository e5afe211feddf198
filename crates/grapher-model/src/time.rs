//! Time axis parsing.
//!
//! Year tables take integers. Day tables additionally accept ISO 8601
//! calendar dates, stored as a signed day offset from [`DAY_ZERO`].

use chrono::NaiveDate;

use crate::enums::TimeUnit;
use crate::ids::Time;
use crate::value::RawValue;

/// Calendar date of day index 0 on day-based time axes.
pub const DAY_ZERO: (i32, u32, u32) = (2020, 1, 21);

fn day_zero() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(DAY_ZERO.0, DAY_ZERO.1, DAY_ZERO.2)
}

/// Convert an ISO date (`YYYY-MM-DD`) into a day index.
pub fn date_to_day_index(value: &str) -> Option<Time> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    Some(date.signed_duration_since(day_zero()?).num_days())
}

/// Convert a day index back into an ISO date string.
pub fn day_index_to_date(day: Time) -> Option<String> {
    let date = day_zero()?.checked_add_signed(chrono::Duration::try_days(day)?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Parse a raw time field for the given axis unit.
///
/// Returns `None` for blank, fractional or unparseable values.
pub fn parse_time(raw: &RawValue, unit: TimeUnit) -> Option<Time> {
    match raw {
        RawValue::Number(v) => integral(*v),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                return Some(v);
            }
            match unit {
                TimeUnit::Day => date_to_day_index(trimmed),
                TimeUnit::Year => trimmed.parse::<f64>().ok().and_then(integral),
            }
        }
        RawValue::Null | RawValue::Boolean(_) => None,
    }
}

fn integral(v: f64) -> Option<Time> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        Some(v as Time)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_index_round_trip_anchor() {
        assert_eq!(date_to_day_index("2020-01-21"), Some(0));
        assert_eq!(date_to_day_index("2020-01-20"), Some(-1));
        assert_eq!(date_to_day_index("2020-02-21"), Some(31));
        assert_eq!(day_index_to_date(31).as_deref(), Some("2020-02-21"));
    }

    #[test]
    fn test_parse_time_by_unit() {
        assert_eq!(parse_time(&RawValue::from(2001_i64), TimeUnit::Year), Some(2001));
        assert_eq!(parse_time(&RawValue::from("1999"), TimeUnit::Year), Some(1999));
        assert_eq!(parse_time(&RawValue::from("2020-01-22"), TimeUnit::Year), None);
        assert_eq!(parse_time(&RawValue::from("2020-01-22"), TimeUnit::Day), Some(1));
        assert_eq!(parse_time(&RawValue::Number(2000.5), TimeUnit::Year), None);
        assert_eq!(parse_time(&RawValue::Null, TimeUnit::Year), None);
    }
}
