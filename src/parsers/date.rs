//! Absolute date literals: `YYYY[-MM[-DD[ hh[:mm[:ss]]]]]`
//!
//! A partial date denotes a period (a whole year, month, day, ...).
//! [`AbsoluteTime`] exposes both ends of that period.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::config::ParserConfig;
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

/// Earliest accepted instant, as a unix timestamp
pub const ZBX_MIN_DATE: i64 = 0;

/// Latest accepted instant, as a unix timestamp
pub const ZBX_MAX_DATE: i64 = 2_147_464_800;

/// Options for [`AbsoluteTimeParser`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AbsoluteTimeOptions {
    /// Earliest accepted start, unix seconds
    pub min: i64,
    /// Latest accepted start, unix seconds
    pub max: i64,
}

impl Default for AbsoluteTimeOptions {
    fn default() -> Self {
        Self {
            min: ZBX_MIN_DATE,
            max: ZBX_MAX_DATE,
        }
    }
}

/// Most precise field written in the literal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    /// `YYYY`
    #[default]
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM-DD hh`
    Hour,
    /// `YYYY-MM-DD hh:mm`
    Minute,
    /// `YYYY-MM-DD hh:mm:ss`
    Second,
}

/// The period a date literal denotes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbsoluteTime {
    /// First second of the period
    pub start: Option<NaiveDateTime>,
    /// Last second of the period
    pub end: Option<NaiveDateTime>,
    /// How much of the literal was written
    pub precision: DatePrecision,
}

fn two_digits(sc: &Scanner<'_>, pos: usize) -> Option<u32> {
    let end = sc.skip_digits(pos);
    if end - pos < 2 {
        return None;
    }
    sc.slice(pos, pos + 2).parse().ok()
}

fn period_end(start: NaiveDateTime, precision: DatePrecision) -> Option<NaiveDateTime> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59)?;
    let date = start.date();
    let end = match precision {
        DatePrecision::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31)?.and_time(last_second),
        DatePrecision::Month => date
            .checked_add_months(Months::new(1))?
            .pred_opt()?
            .and_time(last_second),
        DatePrecision::Day => date.and_time(last_second),
        DatePrecision::Hour => start + chrono::Duration::seconds(3599),
        DatePrecision::Minute => start + chrono::Duration::seconds(59),
        DatePrecision::Second => start,
    };
    Some(end)
}

pub(crate) fn scan_absolute_time(
    sc: &Scanner<'_>,
    pos: usize,
    opts: &AbsoluteTimeOptions,
) -> Option<(usize, AbsoluteTime)> {
    if sc.skip_digits(pos) - pos < 4 {
        return None;
    }
    let year: i32 = sc.slice(pos, pos + 4).parse().ok()?;
    let mut fields = [1u32, 1, 0, 0, 0];
    let mut precision = DatePrecision::Year;
    let mut p = pos + 4;

    const STEPS: [(u8, DatePrecision); 5] = [
        (b'-', DatePrecision::Month),
        (b'-', DatePrecision::Day),
        (b' ', DatePrecision::Hour),
        (b':', DatePrecision::Minute),
        (b':', DatePrecision::Second),
    ];

    for (i, (separator, next)) in STEPS.into_iter().enumerate() {
        let field_start = if separator == b' ' {
            let after = sc.skip_spaces(p);
            (after > p).then_some(after)
        } else {
            sc.is(p, separator).then_some(p + 1)
        };
        let Some(field_start) = field_start else { break };
        let Some(value) = two_digits(sc, field_start) else { break };
        fields[i] = value;
        precision = next;
        p = field_start + 2;
    }

    let [month, day, hour, minute, second] = fields;
    let start = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let timestamp = start.and_utc().timestamp();
    if timestamp < opts.min || timestamp > opts.max {
        return None;
    }

    Some((
        p,
        AbsoluteTime {
            start: Some(start),
            end: Some(period_end(start, precision)?),
            precision,
        },
    ))
}

/// Calendar-checked absolute date
#[derive(Debug, Clone, Default)]
pub struct AbsoluteTimeParser {
    options: AbsoluteTimeOptions,
    config: ParserConfig,
}

impl AbsoluteTimeParser {
    /// Create a date parser
    pub fn new(options: AbsoluteTimeOptions) -> Self {
        Self {
            options,
            config: ParserConfig::default(),
        }
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for AbsoluteTimeParser {
    type Output = AbsoluteTime;

    fn parse(&self, source: &str, pos: usize) -> Parsed<AbsoluteTime> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            scan_absolute_time(sc, pos, options)
        })
    }
}
