//! Duration expressions used by expiry configuration and time-window claims
//!
//! Accepted forms:
//! - whole seconds: `"3600"`, `"-30"`
//! - ISO-8601 durations without calendar units: `"PT1H"`, `"P1DT2H30M"`, `"P2W"`,
//!   optionally signed: `"-PT1H"`, `"+PT1H"`
//! - relative phrases: `"1 hour"`, `"+30 minutes"`, `"-2 days"`, `"1 hour 30 minutes"`

use crate::error::ClaimError;
use chrono::Duration;

/// Parse a duration expression.
///
/// # Errors
/// Returns `ClaimError::InvalidInterval` when the expression is empty, uses a
/// calendar unit (months, years), or does not match any accepted form.
pub fn parse(expression: &str) -> Result<Duration, ClaimError> {
    let invalid = || ClaimError::InvalidInterval {
        expression: expression.to_string(),
    };

    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    if let Ok(seconds) = trimmed.parse::<i64>() {
        return Duration::try_seconds(seconds).ok_or_else(invalid);
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if let Some(iso) = body.strip_prefix('P') {
        let duration = parse_iso8601(iso).ok_or_else(invalid)?;
        return Ok(if negative { -duration } else { duration });
    }

    parse_relative(trimmed).ok_or_else(invalid)
}

/// Seconds per supported unit, or `None` for unknown and calendar units
fn unit_seconds(unit: &str) -> Option<i64> {
    let seconds = match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "week" | "weeks" => 604_800,
        _ => return None,
    };
    Some(seconds)
}

fn scaled(amount: i64, unit_seconds: i64) -> Option<Duration> {
    amount
        .checked_mul(unit_seconds)
        .and_then(Duration::try_seconds)
}

/// `[nW][nD][T[nH][nM][nS]]` after the leading `P`, each designator at most
/// once and in that order
fn parse_iso8601(body: &str) -> Option<Duration> {
    if body.is_empty() {
        return None;
    }

    let mut total = Duration::zero();
    let mut in_time = false;
    let mut digits = String::new();
    let mut last_rank: Option<u8> = None;
    let mut seen_time_component = false;

    for c in body.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'T' if !in_time && digits.is_empty() => in_time = true,
            designator => {
                let amount: i64 = digits.parse().ok()?;
                digits.clear();
                let (rank, unit) = match (in_time, designator) {
                    (false, 'W') => (0, 604_800),
                    (false, 'D') => (1, 86_400),
                    (true, 'H') => (2, 3_600),
                    (true, 'M') => (3, 60),
                    (true, 'S') => (4, 1),
                    // Years and months have no fixed length
                    _ => return None,
                };
                if last_rank.is_some_and(|last| rank <= last) {
                    return None;
                }
                last_rank = Some(rank);
                total = total.checked_add(&scaled(amount, unit)?)?;
                seen_time_component |= in_time;
            }
        }
    }

    // A `T` must be followed by at least one time component
    let complete = digits.is_empty() && last_rank.is_some();
    (complete && (seen_time_component || !in_time)).then_some(total)
}

/// Whitespace-separated `<signed amount> <unit>` pairs; `"1hour"` style
/// tokens with no space are also accepted
fn parse_relative(phrase: &str) -> Option<Duration> {
    let mut total = Duration::zero();
    let mut pending: Option<i64> = None;
    let mut seen_component = false;

    for token in phrase.split_whitespace() {
        match pending.take() {
            None => {
                let split = token
                    .char_indices()
                    .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-'))))
                    .map_or(token.len(), |(i, _)| i);
                let (amount, unit) = token.split_at(split);
                let amount: i64 = amount.strip_prefix('+').unwrap_or(amount).parse().ok()?;
                if unit.is_empty() {
                    pending = Some(amount);
                } else {
                    total = total.checked_add(&scaled(amount, unit_seconds(unit)?)?)?;
                    seen_component = true;
                }
            }
            Some(amount) => {
                total = total.checked_add(&scaled(amount, unit_seconds(token)?)?)?;
                seen_component = true;
            }
        }
    }

    (pending.is_none() && seen_component).then_some(total)
}
