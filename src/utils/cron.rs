//! Cron schedule parsing and next-tick computation
//!
//! Supports the classic five-field notation (minute, hour, day of month,
//! month, day of week) with `*`, ranges, steps, lists, month/weekday names and
//! the common `@daily`-style descriptors.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use std::fmt;

/// How far ahead `next_after` searches before giving up (e.g. `0 0 30 2 *`)
const MAX_SEARCH_YEARS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CronParseError {
    #[error("expected 5 fields, got {0}")]
    FieldCount(usize),

    #[error("unknown descriptor '{0}'")]
    UnknownDescriptor(String),

    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} value {value} out of range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("invalid step in {field}: '{value}'")]
    InvalidStep { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, names: &[] };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, names: &[] };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[] };
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"],
};
// 7 is accepted as an alias for Sunday and folded into 0 after parsing
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &["sun", "mon", "tue", "wed", "thu", "fri", "sat"],
};

/// A set of allowed values for one field, stored as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet {
    bits: u64,
    // True when the field was written as `*` (matters for day matching)
    any: bool,
}

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        self.bits & (1u64 << value) != 0
    }
}

/// Parsed cron schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
}

impl CronSchedule {
    /// Parse a cron expression
    pub fn parse(expression: &str) -> Result<Self, CronParseError> {
        let trimmed = expression.trim();

        let expanded = if trimmed.starts_with('@') {
            expand_descriptor(trimmed)?
        } else {
            trimmed
        };

        let fields: Vec<&str> = expanded.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronParseError::FieldCount(fields.len()));
        }

        let mut days_of_week = parse_field(fields[4], DAY_OF_WEEK)?;
        if days_of_week.contains(7) {
            days_of_week.bits = (days_of_week.bits & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: trimmed.to_string(),
            minutes: parse_field(fields[0], MINUTE)?,
            hours: parse_field(fields[1], HOUR)?,
            days_of_month: parse_field(fields[2], DAY_OF_MONTH)?,
            months: parse_field(fields[3], MONTH)?,
            days_of_week,
        })
    }

    /// The expression as written by the user
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next matching minute strictly after `after`
    pub fn next_after(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        let start = after.naive_local().with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);
        let limit_year = start.year() + MAX_SEARCH_YEARS;

        let mut candidate = start;
        while candidate.year() <= limit_year {
            if !self.months.contains(candidate.month()) {
                candidate = first_of_next_month(candidate)?;
                continue;
            }
            if !self.day_matches(candidate.date()) {
                candidate = (candidate.date() + Duration::days(1)).and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !self.hours.contains(candidate.hour()) {
                candidate = candidate.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !self.minutes.contains(candidate.minute()) {
                candidate += Duration::minutes(1);
                continue;
            }

            // Local times skipped by a DST jump do not exist; keep searching
            match Local.from_local_datetime(&candidate).earliest() {
                Some(resolved) => return Some(resolved),
                None => candidate += Duration::minutes(1),
            }
        }

        None
    }

    /// Iterator over the upcoming ticks after `after`
    pub fn upcoming(&self, after: DateTime<Local>) -> impl Iterator<Item = DateTime<Local>> + '_ {
        std::iter::successors(self.next_after(after), move |previous| self.next_after(*previous))
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(date.day());
        let dow = self.days_of_week.contains(date.weekday().num_days_from_sunday());

        // When both fields are restricted a day matches if either does
        if self.days_of_month.any || self.days_of_week.any {
            dom && dow
        } else {
            dom || dow
        }
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl std::str::FromStr for CronSchedule {
    type Err = CronParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Validate cron schedule syntax
pub fn validate_cron_schedule(schedule: &str) -> bool {
    CronSchedule::parse(schedule).is_ok()
}

fn expand_descriptor(descriptor: &str) -> Result<&'static str, CronParseError> {
    match descriptor.to_lowercase().as_str() {
        "@yearly" | "@annually" => Ok("0 0 1 1 *"),
        "@monthly" => Ok("0 0 1 * *"),
        "@weekly" => Ok("0 0 * * 0"),
        "@daily" | "@midnight" => Ok("0 0 * * *"),
        "@hourly" => Ok("0 * * * *"),
        _ => Err(CronParseError::UnknownDescriptor(descriptor.to_string())),
    }
}

fn parse_field(field: &str, spec: FieldSpec) -> Result<FieldSet, CronParseError> {
    let mut set = FieldSet {
        bits: 0,
        any: field.starts_with('*') || field.starts_with('?'),
    };

    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| CronParseError::InvalidStep {
                    field: spec.name,
                    value: part.to_string(),
                })?;
                if step == 0 || step > spec.max {
                    return Err(CronParseError::InvalidStep {
                        field: spec.name,
                        value: part.to_string(),
                    });
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (start, end) = if range == "*" || range == "?" {
            (spec.min, spec.max)
        } else if let Some((low, high)) = range.split_once('-') {
            (parse_value(low, spec)?, parse_value(high, spec)?)
        } else {
            let value = parse_value(range, spec)?;
            // `5/15` means "from 5 to the end in steps of 15"
            (value, if step.is_some() { spec.max } else { value })
        };

        if start > end {
            return Err(CronParseError::InvalidValue {
                field: spec.name,
                value: part.to_string(),
            });
        }

        let step = step.unwrap_or(1);
        let mut value = start;
        while value <= end {
            set.bits |= 1u64 << value;
            match value.checked_add(step) {
                Some(next) => value = next,
                None => break,
            }
        }
    }

    Ok(set)
}

fn parse_value(raw: &str, spec: FieldSpec) -> Result<u32, CronParseError> {
    let lowered = raw.to_lowercase();
    if let Some(index) = spec.names.iter().position(|name| *name == lowered) {
        return Ok(index as u32 + if spec.min == 1 { 1 } else { 0 });
    }

    let value: u32 = raw.parse().map_err(|_| CronParseError::InvalidValue {
        field: spec.name,
        value: raw.to_string(),
    })?;

    if value < spec.min || value > spec.max {
        return Err(CronParseError::OutOfRange {
            field: spec.name,
            value,
            min: spec.min,
            max: spec.max,
        });
    }

    Ok(value)
}

fn first_of_next_month(at: NaiveDateTime) -> Option<NaiveDateTime> {
    let (year, month) = if at.month() == 12 {
        (at.year() + 1, 1)
    } else {
        (at.year(), at.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}
