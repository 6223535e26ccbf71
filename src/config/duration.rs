//! Duration strings as written in config documents.
//!
//! Accepts Go-style sequences of `<number><unit>` such as `"30s"`, `"1m30s"`,
//! `"250ms"` or `"1.5h"`. Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.
//! A bare `"0"` is zero.

use std::time::Duration;

use thiserror::Error;

/// Failure to read a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DurationError(String);

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" => Some(1_000.0),
        "ms" => Some(1_000_000.0),
        "s" => Some(1_000_000_000.0),
        "m" => Some(60.0 * 1_000_000_000.0),
        "h" => Some(3_600.0 * 1_000_000_000.0),
        _ => None,
    }
}

/// Parse a duration string.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError("empty duration".to_string()));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err(DurationError("duration must not be negative".to_string()));
    }

    let mut total_nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| DurationError(format!("missing unit in duration '{}'", input)))?;
        if number_len == 0 {
            return Err(DurationError(format!("expected a number in duration '{}'", input)));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError(format!("invalid number '{}' in duration", number)))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, remaining) = tail.split_at(unit_len);
        let scale = unit_nanos(unit)
            .ok_or_else(|| {
                DurationError(format!("unknown unit '{}' in duration '{}'", unit, input))
            })?;

        total_nanos += value * scale;
        rest = remaining;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(DurationError(format!("duration '{}' is out of range", input)));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Render a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let nanos = duration.as_nanos();
    if nanos % 1_000_000_000 != 0 {
        return if nanos % 1_000_000 == 0 {
            format!("{}ms", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            format!("{}us", nanos / 1_000)
        } else {
            format!("{}ns", nanos)
        };
    }

    let mut secs = duration.as_secs();
    let hours = secs / 3600;
    secs %= 3600;
    let minutes = secs / 60;
    secs %= 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if secs > 0 {
        out.push_str(&format!("{}s", secs));
    }
    out
}

/// Serde helper for canonical `Duration` fields.
pub mod serde_duration {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*duration))
    }
}
