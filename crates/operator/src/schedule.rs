//! Interval parsing and cron schedule derivation.
//!
//! Intervals use Go duration syntax ("90s", "1h30m", "1.5h"). A schedule is
//! derived at minute granularity below one hour and at hour granularity
//! below one day; anything else is rejected.

use chrono::Duration;

use crate::{Error, Result};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3600 * NANOS_PER_SECOND),
        _ => None,
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse a duration string such as "300ms", "-1.5h" or "2h45m".
///
/// Accepts a sequence of decimal numbers, each with an optional fraction and
/// a unit suffix (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`), with an optional
/// leading sign. A bare `"0"` is also accepted.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || Error::InvalidDuration(input.to_string());

    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", tail),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_end = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(invalid)?;

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        total = whole
            .checked_mul(scale)
            .and_then(|nanos| total.checked_add(nanos))
            .ok_or_else(invalid)?;

        // Digits past nanosecond precision for the largest unit cannot change the result.
        let mut numerator: i128 = 0;
        let mut denominator: i128 = 1;
        for digit in fraction.bytes().take(18) {
            numerator = numerator * 10 + i128::from(digit - b'0');
            denominator *= 10;
        }
        total += numerator * scale / denominator;

        if total > i128::from(i64::MAX) {
            return Err(invalid());
        }
        rest = tail;
    }

    let nanos = i64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

/// Derive a five-field cron expression from an interval string.
///
/// Minutes and hours are never combined: "90m" fires every hour, not every
/// ninety minutes.
pub fn derive_schedule(interval: &str) -> Result<String> {
    let duration = parse_duration(interval)?;

    let minutes = duration.num_minutes();
    if minutes < 1 {
        return Err(Error::ScheduleTooFrequent(minutes));
    }
    if minutes < 60 {
        return Ok(format!("*/{} * * * *", minutes));
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return Ok(format!("* */{} * * *", hours));
    }
    Err(Error::ScheduleTooInfrequent(hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("70s").unwrap(), Duration::seconds(70));
        assert_eq!(parse_duration("90m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("23h").unwrap(), Duration::hours(23));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("15us").unwrap(), Duration::microseconds(15));
        assert_eq!(parse_duration("15µs").unwrap(), Duration::microseconds(15));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::nanoseconds(7));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::minutes(90)
        );
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration("2.m").unwrap(), Duration::minutes(2));
        assert_eq!(
            parse_duration("1m0.5s").unwrap(),
            Duration::milliseconds(60_500)
        );
    }

    #[test]
    fn test_parse_signs_and_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_duration("+5m").unwrap(), Duration::minutes(5));
        assert_eq!(parse_duration("-5m").unwrap(), Duration::minutes(-5));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "unparsable", "5", "5x", "m", ".", "-", "1h-5m", "10 m"] {
            assert!(
                matches!(parse_duration(input), Err(Error::InvalidDuration(_))),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_duration("9999999999999h").is_err());
    }

    #[test]
    fn test_minute_schedules() {
        assert_eq!(derive_schedule("70s").unwrap(), "*/1 * * * *");
        assert_eq!(derive_schedule("1m").unwrap(), "*/1 * * * *");
        assert_eq!(derive_schedule("3m").unwrap(), "*/3 * * * *");
        assert_eq!(derive_schedule("3599s").unwrap(), "*/59 * * * *");
    }

    #[test]
    fn test_hour_schedules() {
        assert_eq!(derive_schedule("60m").unwrap(), "* */1 * * *");
        assert_eq!(derive_schedule("90m").unwrap(), "* */1 * * *");
        assert_eq!(derive_schedule("2h59m").unwrap(), "* */2 * * *");
        assert_eq!(derive_schedule("23h").unwrap(), "* */23 * * *");
        assert_eq!(derive_schedule("23h59m59s").unwrap(), "* */23 * * *");
    }

    #[test]
    fn test_too_frequent() {
        let err = derive_schedule("59s").unwrap_err();
        assert!(matches!(err, Error::ScheduleTooFrequent(0)));
        assert_eq!(
            err.to_string(),
            "Bad duration, must be at least a minute, but got 0 minute"
        );
        assert!(matches!(
            derive_schedule("-10m"),
            Err(Error::ScheduleTooFrequent(-10))
        ));
        assert!(matches!(derive_schedule("0"), Err(Error::ScheduleTooFrequent(0))));
    }

    #[test]
    fn test_too_infrequent() {
        let err = derive_schedule("24h").unwrap_err();
        assert!(matches!(err, Error::ScheduleTooInfrequent(24)));
        assert_eq!(
            err.to_string(),
            "Bad duration, must be less than 24 hours, but got 24 hours"
        );
        assert!(matches!(
            derive_schedule("1440m"),
            Err(Error::ScheduleTooInfrequent(24))
        ));
    }

    #[test]
    fn test_unparsable() {
        let err = derive_schedule("unparsable").unwrap_err();
        assert_eq!(err.to_string(), "invalid duration \"unparsable\"");
    }
}
