//! Unit tests for cron schedule parsing and tick computation

use backup_scheduler::utils::cron::{validate_cron_schedule, CronParseError, CronSchedule};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Weekday};
use rstest::rstest;

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap()
}

#[rstest]
#[case("0 0 * * *")]
#[case("*/15 * * * *")]
#[case("30 2 * * 1-5")]
#[case("0 3 1,15 * *")]
#[case("0 0 * jan-mar sun")]
#[case("0 12 * * 7")]
#[case("5-55/10 8-18 * * mon-fri")]
#[case("@daily")]
#[case("@hourly")]
#[case("@weekly")]
fn test_valid_schedules(#[case] expression: &str) {
    assert!(validate_cron_schedule(expression), "{} should parse", expression);
}

#[rstest]
#[case("")]
#[case("0 0 * *")]
#[case("0 0 * * * *")]
#[case("60 0 * * *")]
#[case("0 24 * * *")]
#[case("0 0 0 * *")]
#[case("0 0 * 13 *")]
#[case("*/0 * * * *")]
#[case("1-59/4294967295 * * * *")]
#[case("*/99999999999 * * * *")]
#[case("0 0 * * funday")]
#[case("@fortnightly")]
fn test_invalid_schedules(#[case] expression: &str) {
    assert!(!validate_cron_schedule(expression), "{} should be rejected", expression);
}

#[test]
fn test_parse_error_kinds() {
    assert_eq!(
        CronSchedule::parse("0 0 * *").unwrap_err(),
        CronParseError::FieldCount(4)
    );
    assert!(matches!(
        CronSchedule::parse("0 25 * * *").unwrap_err(),
        CronParseError::OutOfRange { field: "hour", value: 25, .. }
    ));
    assert!(matches!(
        CronSchedule::parse("@never").unwrap_err(),
        CronParseError::UnknownDescriptor(_)
    ));
}

#[test]
fn test_default_schedule_is_daily_midnight() {
    let schedule = CronSchedule::parse("0 0 * * *").unwrap();
    let next = schedule.next_after(at(2024, 3, 10, 14, 37)).unwrap();
    assert_eq!(next, at(2024, 3, 11, 0, 0));
}

#[test]
fn test_next_is_strictly_after() {
    let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
    let next = schedule.next_after(at(2024, 5, 1, 10, 15)).unwrap();
    assert_eq!(next, at(2024, 5, 1, 10, 30));
}

#[test]
fn test_weekday_schedule_skips_weekend() {
    let schedule = CronSchedule::parse("30 2 * * mon-fri").unwrap();
    // 2024-06-07 is a Friday
    let next = schedule.next_after(at(2024, 6, 7, 3, 0)).unwrap();
    assert_eq!(next.weekday(), Weekday::Mon);
    assert_eq!((next.day(), next.hour(), next.minute()), (10, 2, 30));
}

#[test]
fn test_day_of_month_or_day_of_week() {
    // Either the 1st of the month or any Sunday
    let schedule = CronSchedule::parse("0 0 1 * sun").unwrap();
    // 2024-06-01 is a Saturday, 2024-06-02 a Sunday
    let ticks: Vec<_> = schedule.upcoming(at(2024, 5, 31, 12, 0)).take(2).collect();
    assert_eq!(ticks, vec![at(2024, 6, 1, 0, 0), at(2024, 6, 2, 0, 0)]);
}

#[test]
fn test_upcoming_is_increasing() {
    let schedule = CronSchedule::parse("@hourly").unwrap();
    let ticks: Vec<_> = schedule.upcoming(at(2024, 1, 1, 0, 30)).take(5).collect();

    assert_eq!(ticks.len(), 5);
    assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ticks[0], at(2024, 1, 1, 1, 0));
}

#[test]
fn test_impossible_date_has_no_tick() {
    let schedule = CronSchedule::parse("0 0 30 2 *").unwrap();
    assert!(schedule.next_after(at(2024, 1, 1, 0, 0)).is_none());
}

#[test]
fn test_display_keeps_expression() {
    let schedule: CronSchedule = " @daily ".parse().unwrap();
    assert_eq!(schedule.to_string(), "@daily");
    assert_eq!(schedule.expression(), "@daily");
}
