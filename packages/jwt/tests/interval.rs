//! Duration expression parsing

use chrono::Duration;
use cryypt_jwt_manager::ClaimError;
use cryypt_jwt_manager::interval::parse;
use proptest::prelude::*;

#[test]
fn test_whole_seconds() {
    assert_eq!(parse("3600").unwrap(), Duration::hours(1));
    assert_eq!(parse(" 90 ").unwrap(), Duration::seconds(90));
    assert_eq!(parse("-30").unwrap(), Duration::seconds(-30));
    assert_eq!(parse("0").unwrap(), Duration::zero());
}

#[test]
fn test_iso8601_durations() {
    assert_eq!(parse("PT1H").unwrap(), Duration::hours(1));
    assert_eq!(parse("PT10M").unwrap(), Duration::minutes(10));
    assert_eq!(parse("PT45S").unwrap(), Duration::seconds(45));
    assert_eq!(parse("P1DT2H").unwrap(), Duration::seconds(93_600));
    assert_eq!(parse("P1DT2H30M15S").unwrap(), Duration::seconds(95_415));
    assert_eq!(parse("P2W").unwrap(), Duration::weeks(2));
    assert_eq!(parse("P3D").unwrap(), Duration::days(3));
    assert_eq!(parse("-PT1H").unwrap(), Duration::hours(-1));
    assert_eq!(parse("+PT1H").unwrap(), Duration::hours(1));
    assert_eq!(parse("P1W2D").unwrap(), Duration::days(9));
}

#[test]
fn test_relative_phrases() {
    assert_eq!(parse("1 hour").unwrap(), Duration::hours(1));
    assert_eq!(parse("1 hour 30 minutes").unwrap(), Duration::seconds(5_400));
    assert_eq!(parse("+30 minutes").unwrap(), Duration::minutes(30));
    assert_eq!(parse("-2 days").unwrap(), Duration::days(-2));
    assert_eq!(parse("1hour").unwrap(), Duration::hours(1));
    assert_eq!(parse("2 Weeks").unwrap(), Duration::weeks(2));
    assert_eq!(parse("1 day -1 hour").unwrap(), Duration::hours(23));
}

#[test]
fn test_rejected_expressions() {
    for expression in [
        "", "   ", "-", "P", "PT", "hour", "P1M", "P1Y", "PT1D", "P1H", "1 month", "2 years",
        "1 hour 30", "soon", "1.5 hours", "P1DT", "PT5", "P1D2D", "PT1M1H", "PT1H1H", "P1D1W",
        "PT1S2M", "+-PT1H", "-+PT1H",
    ] {
        match parse(expression) {
            Err(ClaimError::InvalidInterval { expression: reported }) => {
                assert_eq!(reported, expression);
            }
            other => panic!("{expression:?} parsed as {other:?}"),
        }
    }
}

const UNITS: [(&str, i64); 10] = [
    ("second", 1),
    ("seconds", 1),
    ("min", 60),
    ("minutes", 60),
    ("h", 3_600),
    ("hours", 3_600),
    ("day", 86_400),
    ("days", 86_400),
    ("week", 604_800),
    ("weeks", 604_800),
];

proptest! {
    #[test]
    fn prop_integer_strings_are_seconds(seconds in -1_000_000_000i64..1_000_000_000) {
        prop_assert_eq!(parse(&seconds.to_string()).unwrap(), Duration::seconds(seconds));
    }

    #[test]
    fn prop_relative_amounts_scale_by_unit(
        amount in -10_000i64..10_000,
        unit in 0..UNITS.len(),
        spaced in any::<bool>(),
    ) {
        let (name, seconds) = UNITS[unit];
        let expression = if spaced {
            format!("{amount} {name}")
        } else {
            format!("{amount}{name}")
        };
        prop_assert_eq!(parse(&expression).unwrap(), Duration::seconds(amount * seconds));
    }

    #[test]
    fn prop_iso_components_add_up(
        days in 0i64..400,
        hours in 0i64..48,
        minutes in 0i64..120,
        seconds in 0i64..120,
    ) {
        let expression = format!("P{days}DT{hours}H{minutes}M{seconds}S");
        let expected = days * 86_400 + hours * 3_600 + minutes * 60 + seconds;
        prop_assert_eq!(parse(&expression).unwrap(), Duration::seconds(expected));
        prop_assert_eq!(parse(&format!("-{expression}")).unwrap(), Duration::seconds(-expected));
        prop_assert_eq!(parse(&format!("+{expression}")).unwrap(), Duration::seconds(expected));
    }
}
