//! Time periods and polling intervals
//!
//! - [`TimePeriodParser`]: `d[-d],hh:mm-hh:mm`
//! - [`TimePeriodsParser`]: `;`-separated periods, optionally user macros
//! - [`SimpleIntervalParser`]: `30`, `5m`, `{$DELAY}`
//! - [`FlexibleIntervalParser`]: `<interval>/<period>`
//! - [`SchedulingIntervalParser`]: `md`, `wd`, `h`, `m`, `s` filters
//! - [`UpdateIntervalParser`]: `<delay>[;<flexible or scheduling>]...`
//!
//! The interval scanners return `Err(position)` at the first byte that
//! cannot continue a valid interval: the digit that pushes a value out of
//! range, or the byte that ends a field too long, too short or out of
//! order. The whole-string [`UpdateIntervalParser`] quotes the input from
//! there, or reports the end of input.

use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::error::ParseError;
use super::macros::{scan_lld_macro, scan_user_macro, MacroKind, UserMacroOptions};
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

type Scan<T> = Result<(usize, T), usize>;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Longest flexible interval, in seconds
pub const SEC_PER_DAY: u64 = 86_400;

/// Bytes a flexible interval and its `/` may span
pub const FLEXIBLE_INTERVAL_MAX_LEN: usize = 244;

// ============================================================================
// Time periods
// ============================================================================

/// `d[-d],hh:mm-hh:mm`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimePeriod {
    /// First week day, 1 is Monday
    pub day_from: u8,
    /// Last week day, equal to `day_from` for a single day
    pub day_to: u8,
    /// Start, in minutes since midnight
    pub from: u32,
    /// End, in minutes since midnight; up to `24:00`
    pub to: u32,
}

/// Digits of one numeric field and their value, `None` when there are none
///
/// `fits` sees the value after every digit but the first. The first digit
/// that breaks it is the error position; other checks wait for the byte
/// that ends the field.
fn scan_field(sc: &Scanner<'_>, pos: usize, fits: impl Fn(u32) -> bool) -> Scan<Option<u32>> {
    let mut value: Option<u32> = None;
    let mut p = pos;

    while let Some(b) = sc.at(p).filter(u8::is_ascii_digit) {
        let digit = u32::from(b - b'0');
        value = Some(match value {
            None => digit,
            Some(v) => {
                let v = v.saturating_mul(10).saturating_add(digit);
                if !fits(v) {
                    return Err(p);
                }
                v
            }
        });
        p += 1;
    }
    Ok((p, value))
}

/// Value of a field ending at `end`, or `Err(end)`
fn field_value(
    start: usize,
    end: usize,
    value: Option<u32>,
    max_digits: usize,
    valid: impl Fn(u32) -> bool,
) -> Result<u32, usize> {
    match value {
        Some(v) if end - start <= max_digits && valid(v) => Ok(v),
        _ => Err(end),
    }
}

fn scan_week_day(sc: &Scanner<'_>, pos: usize) -> Option<u8> {
    match sc.at(pos) {
        Some(b @ b'1'..=b'7') => Some(b - b'0'),
        _ => None,
    }
}

/// `h[h]:mm`, returned in minutes; the hour may not pass `max_hour`
fn scan_clock(sc: &Scanner<'_>, pos: usize, max_hour: u32) -> Scan<u32> {
    let (hours_end, hours) = scan_field(sc, pos, |h| h <= max_hour)?;
    let hours = field_value(pos, hours_end, hours, 2, |_| true)?;
    if !sc.is(hours_end, b':') {
        return Err(hours_end);
    }

    let minutes_start = hours_end + 1;
    let (end, minutes) = scan_field(sc, minutes_start, |m| m <= 59)?;
    match minutes {
        Some(minutes) if end - minutes_start == 2 => Ok((end, hours * 60 + minutes)),
        _ => Err(end),
    }
}

pub(crate) fn scan_time_period(sc: &Scanner<'_>, pos: usize) -> Scan<TimePeriod> {
    let day_from = scan_week_day(sc, pos).ok_or(pos)?;
    let mut day_to = day_from;
    let mut p = pos + 1;

    if sc.is(p, b'-') {
        day_to = match sc.at(p + 1) {
            Some(b @ b'0'..=b'9') if b - b'0' >= day_from => b - b'0',
            _ => return Err(p + 1),
        };
        p += 2;
    }
    if !sc.is(p, b',') || day_to > 7 {
        return Err(p);
    }

    let (end, from) = scan_clock(sc, p + 1, 23)?;
    if !sc.is(end, b'-') {
        return Err(end);
    }
    let (end, to) = scan_clock(sc, end + 1, 24)?;
    if from >= to || to > MINUTES_PER_DAY {
        return Err(end);
    }

    Ok((
        end,
        TimePeriod {
            day_from,
            day_to,
            from,
            to,
        },
    ))
}

/// A single time period
#[derive(Debug, Clone, Default)]
pub struct TimePeriodParser {
    config: ParserConfig,
}

impl TimePeriodParser {
    /// Create a time period parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for TimePeriodParser {
    type Output = TimePeriod;

    fn parse(&self, source: &str, pos: usize) -> Parsed<TimePeriod> {
        run(source, pos, &self.config, |sc, pos| scan_time_period(sc, pos).ok())
    }
}

/// Options shared by the period list and interval parsers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntervalOptions {
    /// Accept `{$NAME}` in place of a value
    pub usermacros: bool,
    /// Accept `{#NAME}` in place of a value
    pub lldmacros: bool,
}

fn scan_interval_macro(sc: &Scanner<'_>, pos: usize, opts: &IntervalOptions) -> Option<(usize, MacroKind)> {
    if opts.usermacros {
        if let Some((end, _)) = scan_user_macro(sc, pos, &UserMacroOptions::default()) {
            return Some((end, MacroKind::User));
        }
    }
    if opts.lldmacros {
        if let Some((end, _)) = scan_lld_macro(sc, pos) {
            return Some((end, MacroKind::Lld));
        }
    }
    None
}

/// One member of a period list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimePeriodPart {
    /// A literal period
    Period {
        /// The parsed period
        period: TimePeriod,
    },
    /// A user macro standing in for a period
    UserMacro {
        /// The macro as written
        name: String,
    },
}

/// Periods in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimePeriods {
    /// Each period as written
    pub periods: Vec<String>,
    /// Each period parsed
    pub periods_parts: Vec<TimePeriodPart>,
}

/// `period[;period]...`
///
/// A `;` with nothing valid after it is left unmatched.
#[derive(Debug, Clone, Default)]
pub struct TimePeriodsParser {
    options: IntervalOptions,
    config: ParserConfig,
}

impl TimePeriodsParser {
    /// Create a period list parser; only `usermacros` is honoured
    pub fn new(options: IntervalOptions) -> Self {
        Self {
            options: IntervalOptions {
                lldmacros: false,
                ..options
            },
            config: ParserConfig::default(),
        }
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for TimePeriodsParser {
    type Output = TimePeriods;

    fn parse(&self, source: &str, pos: usize) -> Parsed<TimePeriods> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            let mut result = TimePeriods::default();
            let mut p = pos;
            let mut end = pos;

            loop {
                let part = match scan_time_period(sc, p) {
                    Ok((e, period)) => Some((e, TimePeriodPart::Period { period })),
                    Err(_) => scan_interval_macro(sc, p, options).map(|(e, _)| {
                        (
                            e,
                            TimePeriodPart::UserMacro {
                                name: sc.slice(p, e).to_string(),
                            },
                        )
                    }),
                };
                let Some((part_end, part)) = part else { break };

                result.periods.push(sc.slice(p, part_end).to_string());
                result.periods_parts.push(part);
                end = part_end;
                if !sc.is(end, b';') {
                    break;
                }
                p = end + 1;
            }

            Some((end, result))
        })
    }
}

// ============================================================================
// Intervals
// ============================================================================

/// `\d+[smhdw]?` or a macro
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimpleInterval {
    /// Length in seconds, absent for a macro
    pub seconds: Option<u64>,
    /// Time suffix as written
    pub suffix: Option<char>,
    /// Macro grammar that matched instead of a number
    pub macro_kind: Option<MacroKind>,
}

fn time_suffix(b: u8) -> Option<(char, u64)> {
    match b {
        b's' => Some(('s', 1)),
        b'm' => Some(('m', 60)),
        b'h' => Some(('h', 3600)),
        b'd' => Some(('d', SEC_PER_DAY)),
        b'w' => Some(('w', 7 * SEC_PER_DAY)),
        _ => None,
    }
}

fn scan_simple_interval(sc: &Scanner<'_>, pos: usize, opts: &IntervalOptions) -> Scan<SimpleInterval> {
    if let Some((end, kind)) = scan_interval_macro(sc, pos, opts) {
        return Ok((
            end,
            SimpleInterval {
                macro_kind: Some(kind),
                ..SimpleInterval::default()
            },
        ));
    }

    let digits_end = sc.skip_digits(pos);
    if digits_end == pos {
        return Err(pos);
    }
    let value: u64 = sc.slice(pos, digits_end).parse().map_err(|_| pos)?;

    let (end, suffix, multiplier) = match sc.at(digits_end).and_then(time_suffix) {
        Some((suffix, multiplier)) => (digits_end + 1, Some(suffix), multiplier),
        None => (digits_end, None, 1),
    };

    Ok((
        end,
        SimpleInterval {
            seconds: Some(value.checked_mul(multiplier).ok_or(pos)?),
            suffix,
            macro_kind: None,
        },
    ))
}

/// A polling delay
#[derive(Debug, Clone, Default)]
pub struct SimpleIntervalParser {
    options: IntervalOptions,
    config: ParserConfig,
}

impl SimpleIntervalParser {
    /// Create a delay parser
    pub fn new(options: IntervalOptions) -> Self {
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

impl TokenParser for SimpleIntervalParser {
    type Output = SimpleInterval;

    fn parse(&self, source: &str, pos: usize) -> Parsed<SimpleInterval> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            scan_simple_interval(sc, pos, options).ok()
        })
    }
}

/// `<interval>/<period>`: poll at `interval` during `period`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlexibleInterval {
    /// Interval part as written
    pub update_interval: String,
    /// Period part as written
    pub time_period: String,
    /// Parsed interval
    pub interval: SimpleInterval,
    /// Parsed period, absent when a macro stands in for it
    pub period: Option<TimePeriod>,
}

/// The interval before `/`, at most a day long
fn scan_flexible_delay(sc: &Scanner<'_>, pos: usize, opts: &IntervalOptions) -> Scan<SimpleInterval> {
    if let Some((end, kind)) = scan_interval_macro(sc, pos, opts) {
        if !sc.is(end, b'/') {
            return Err(end);
        }
        return Ok((
            end,
            SimpleInterval {
                macro_kind: Some(kind),
                ..SimpleInterval::default()
            },
        ));
    }

    let limit = pos + FLEXIBLE_INTERVAL_MAX_LEN;
    let mut value: u64 = 0;
    let mut p = pos;
    while let Some(b) = sc.at(p).filter(u8::is_ascii_digit) {
        value = value * 10 + u64::from(b - b'0');
        if p >= limit || value > SEC_PER_DAY {
            return Err(p);
        }
        p += 1;
    }
    if p == pos {
        return Err(pos);
    }

    let (slash, suffix, seconds) = match sc.at(p).and_then(time_suffix) {
        Some((suffix, multiplier)) => {
            let seconds = value * multiplier;
            if p >= limit || seconds > SEC_PER_DAY {
                return Err(p);
            }
            (p + 1, Some(suffix), seconds)
        }
        None => (p, None, value),
    };
    if slash >= limit || !sc.is(slash, b'/') {
        return Err(slash);
    }

    Ok((
        slash,
        SimpleInterval {
            seconds: Some(seconds),
            suffix,
            macro_kind: None,
        },
    ))
}

pub(crate) fn scan_flexible_interval(
    sc: &Scanner<'_>,
    pos: usize,
    opts: &IntervalOptions,
) -> Scan<FlexibleInterval> {
    let (slash, interval) = scan_flexible_delay(sc, pos, opts)?;

    let period_start = slash + 1;
    let (end, period) = match scan_time_period(sc, period_start) {
        Ok((end, period)) => (end, Some(period)),
        Err(reached) => match scan_interval_macro(sc, period_start, opts) {
            Some((end, _)) => (end, None),
            None => return Err(reached),
        },
    };

    Ok((
        end,
        FlexibleInterval {
            update_interval: sc.slice(pos, slash).to_string(),
            time_period: sc.slice(period_start, end).to_string(),
            interval,
            period,
        },
    ))
}

/// A flexible interval
#[derive(Debug, Clone, Default)]
pub struct FlexibleIntervalParser {
    options: IntervalOptions,
    config: ParserConfig,
}

impl FlexibleIntervalParser {
    /// Create a flexible interval parser
    pub fn new(options: IntervalOptions) -> Self {
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

impl TokenParser for FlexibleIntervalParser {
    type Output = FlexibleInterval;

    fn parse(&self, source: &str, pos: usize) -> Parsed<FlexibleInterval> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            scan_flexible_interval(sc, pos, options).ok()
        })
    }
}

// ============================================================================
// Scheduling
// ============================================================================

/// Scheduling filter kinds, in the order they must appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleUnit {
    /// `md`, 1-31
    MonthDay,
    /// `wd`, 1-7
    WeekDay,
    /// `h`, 0-23
    Hour,
    /// `m`, 0-59
    Minute,
    /// `s`, 0-59
    Second,
}

const SCHEDULE_UNITS: [ScheduleUnit; 5] = [
    ScheduleUnit::MonthDay,
    ScheduleUnit::WeekDay,
    ScheduleUnit::Hour,
    ScheduleUnit::Minute,
    ScheduleUnit::Second,
];

impl ScheduleUnit {
    /// Filter prefix
    pub fn prefix(self) -> &'static str {
        match self {
            ScheduleUnit::MonthDay => "md",
            ScheduleUnit::WeekDay => "wd",
            ScheduleUnit::Hour => "h",
            ScheduleUnit::Minute => "m",
            ScheduleUnit::Second => "s",
        }
    }

    /// Inclusive value bounds
    pub fn bounds(self) -> (u32, u32) {
        match self {
            ScheduleUnit::MonthDay => (1, 31),
            ScheduleUnit::WeekDay => (1, 7),
            ScheduleUnit::Hour => (0, 23),
            ScheduleUnit::Minute | ScheduleUnit::Second => (0, 59),
        }
    }

    fn max_digits(self) -> usize {
        if self == ScheduleUnit::WeekDay {
            1
        } else {
            2
        }
    }
}

/// `from[-to][/step]` or `/step`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleRange {
    /// First value, absent for a bare `/step`
    pub from: Option<u32>,
    /// Last value
    pub to: Option<u32>,
    /// Step
    pub step: Option<u32>,
}

/// One filter with its comma-separated ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleFilter {
    /// Which field the filter applies to
    pub unit: ScheduleUnit,
    /// Ranges in source order
    pub ranges: Vec<ScheduleRange>,
}

/// A scheduling interval such as `wd1-5h9-18`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulingInterval {
    /// Filters in source order
    pub filters: Vec<ScheduleFilter>,
    /// Macro grammar that matched instead of filters
    pub macro_kind: Option<MacroKind>,
}

fn scan_schedule_range(sc: &Scanner<'_>, pos: usize, unit: ScheduleUnit) -> Scan<ScheduleRange> {
    let (min, max) = unit.bounds();
    let digits = unit.max_digits();
    let multi_digit = digits > 1;
    let mut range = ScheduleRange::default();
    let mut p = pos;

    if !sc.is(p, b'/') {
        let in_bounds = |v: u32| (min..=max).contains(&v);
        let (end, from) = scan_field(sc, p, |v| multi_digit && in_bounds(v))?;
        let from = field_value(p, end, from, digits, in_bounds)?;
        range.from = Some(from);
        p = end;
        if !sc.is(p, b'-') {
            return Ok((p, range));
        }

        // month days past the end are reported once the range is complete
        let (end, to) = scan_field(sc, p + 1, |v| {
            multi_digit && v >= from && (v <= max || unit == ScheduleUnit::MonthDay)
        })?;
        let to = field_value(p + 1, end, to, digits, |v| v >= from)?;
        range.to = Some(to);
        p = end;
        if !sc.is(p, b'/') {
            return if to <= max { Ok((p, range)) } else { Err(p) };
        }
    }

    let span = match (range.from, range.to) {
        (Some(from), Some(to)) => to - from,
        _ => max - min,
    };
    let step_fits = |v: u32| v >= 1 && v <= max - min && v <= span;
    let (end, step) = scan_field(sc, p + 1, |v| multi_digit && step_fits(v))?;
    let step = field_value(p + 1, end, step, digits, step_fits)?;
    if range.to.is_some_and(|to| to > max) {
        return Err(end);
    }
    range.step = Some(step);
    Ok((end, range))
}

/// `m` is never the last byte, and past the first filter it must be
/// followed by a value
fn minute_prefix_ok(sc: &Scanner<'_>, pos: usize, first: bool) -> bool {
    let next = pos + 1;
    next < sc.len() && (first || sc.is(next, b'/') || sc.is_class(next, CharClass::Digit))
}

pub(crate) fn scan_scheduling_interval(
    sc: &Scanner<'_>,
    pos: usize,
    opts: &IntervalOptions,
) -> Scan<SchedulingInterval> {
    if let Some((end, kind)) = scan_interval_macro(sc, pos, opts) {
        return Ok((
            end,
            SchedulingInterval {
                filters: Vec::new(),
                macro_kind: Some(kind),
            },
        ));
    }

    let mut filters = Vec::new();
    let mut p = pos;
    let mut next_unit = 0;

    while let Some(offset) = SCHEDULE_UNITS[next_unit..]
        .iter()
        .position(|unit| sc.starts_with(p, unit.prefix()))
    {
        let unit = SCHEDULE_UNITS[next_unit + offset];
        if unit == ScheduleUnit::Minute && !minute_prefix_ok(sc, p, filters.is_empty()) {
            return Err(p);
        }
        next_unit += offset + 1;
        p += unit.prefix().len();

        let mut ranges = Vec::new();
        loop {
            let (end, range) = scan_schedule_range(sc, p, unit)?;
            ranges.push(range);
            p = end;
            if !sc.is(p, b',') {
                break;
            }
            p += 1;
        }
        filters.push(ScheduleFilter { unit, ranges });
    }

    if filters.is_empty() {
        return Err(pos);
    }
    Ok((
        p,
        SchedulingInterval {
            filters,
            macro_kind: None,
        },
    ))
}

/// A scheduling interval
#[derive(Debug, Clone, Default)]
pub struct SchedulingIntervalParser {
    options: IntervalOptions,
    config: ParserConfig,
}

impl SchedulingIntervalParser {
    /// Create a scheduling interval parser
    pub fn new(options: IntervalOptions) -> Self {
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

impl TokenParser for SchedulingIntervalParser {
    type Output = SchedulingInterval;

    fn parse(&self, source: &str, pos: usize) -> Parsed<SchedulingInterval> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            scan_scheduling_interval(sc, pos, options).ok()
        })
    }
}

// ============================================================================
// Update interval
// ============================================================================

/// A custom interval after the delay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomInterval {
    /// `<interval>/<period>`
    Flexible {
        /// The parsed interval
        interval: FlexibleInterval,
    },
    /// `md..wd..h..m..s..`
    Scheduling {
        /// The parsed interval
        interval: SchedulingInterval,
    },
}

/// A full item update interval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateInterval {
    /// Default delay
    pub delay: SimpleInterval,
    /// Custom intervals in source order
    pub intervals: Vec<CustomInterval>,
}

impl UpdateInterval {
    /// Flexible intervals only
    pub fn flexible(&self) -> impl Iterator<Item = &FlexibleInterval> {
        self.intervals.iter().filter_map(|i| match i {
            CustomInterval::Flexible { interval } => Some(interval),
            CustomInterval::Scheduling { .. } => None,
        })
    }

    /// Scheduling intervals only
    pub fn scheduling(&self) -> impl Iterator<Item = &SchedulingInterval> {
        self.intervals.iter().filter_map(|i| match i {
            CustomInterval::Scheduling { interval } => Some(interval),
            CustomInterval::Flexible { .. } => None,
        })
    }
}

fn scan_custom_interval(sc: &Scanner<'_>, pos: usize, opts: &IntervalOptions) -> Scan<CustomInterval> {
    let flexible = match scan_flexible_interval(sc, pos, opts) {
        Ok((end, interval)) => return Ok((end, CustomInterval::Flexible { interval })),
        Err(reached) => reached,
    };
    match scan_scheduling_interval(sc, pos, opts) {
        Ok((end, interval)) => Ok((end, CustomInterval::Scheduling { interval })),
        Err(reached) => Err(reached.max(flexible)),
    }
}

fn scan_update_interval(sc: &Scanner<'_>, pos: usize, opts: &IntervalOptions) -> Scan<UpdateInterval> {
    let (mut p, delay) = scan_simple_interval(sc, pos, opts)?;
    let mut intervals = Vec::new();

    while p < sc.len() {
        if !sc.is(p, b';') {
            return Err(p);
        }
        let (end, interval) = scan_custom_interval(sc, p + 1, opts)?;
        intervals.push(interval);
        p = end;
    }
    Ok((p, UpdateInterval { delay, intervals }))
}

/// Whole-string update interval
///
/// Either the rest of the input is a valid interval or the result fails
/// with `incorrect syntax near "..."` / `unexpected end of interval`.
#[derive(Debug, Clone, Default)]
pub struct UpdateIntervalParser {
    options: IntervalOptions,
    config: ParserConfig,
}

impl UpdateIntervalParser {
    /// Create an update interval parser
    pub fn new(options: IntervalOptions) -> Self {
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

impl TokenParser for UpdateIntervalParser {
    type Output = UpdateInterval;

    fn parse(&self, source: &str, pos: usize) -> Parsed<UpdateInterval> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            match scan_update_interval(sc, pos, options) {
                Ok(result) => Some(result),
                Err(reached) => {
                    log_debug!("update interval rejected at {}", reached);
                    sc.report(ParseError::incorrect_syntax(sc.src(), reached));
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::protocol::ParseStatus;

    fn error_of(source: &str) -> String {
        UpdateIntervalParser::default()
            .parse(source, 0)
            .error()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_time_period() {
        let parser = TimePeriodParser::new();
        let result = parser.parse("1-5,09:00-18:00", 0);
        assert_eq!(result.status(), ParseStatus::Success);
        assert_eq!(
            *result.data(),
            TimePeriod {
                day_from: 1,
                day_to: 5,
                from: 540,
                to: 1080
            }
        );

        assert!(parser.parse("7,0:00-24:00", 0).is_success());
        assert!(parser.parse("7,23:59-24:00", 0).is_success());
        assert!(parser.parse("8,00:00-24:00", 0).is_fail());
        assert!(parser.parse("5-1,00:00-24:00", 0).is_fail());
        assert!(parser.parse("1,10:00-09:00", 0).is_fail());
        assert!(parser.parse("1,00:00-24:01", 0).is_fail());
        assert!(parser.parse("1,00:60-10:00", 0).is_fail());
    }

    #[test]
    fn test_time_periods_with_macros() {
        let parser = TimePeriodsParser::new(IntervalOptions {
            usermacros: true,
            lldmacros: true,
        });
        let result = parser.parse("1-5,09:00-18:00;{$WEEKEND}", 0);
        assert_eq!(result.status(), ParseStatus::Success);
        assert_eq!(result.data().periods, ["1-5,09:00-18:00", "{$WEEKEND}"]);
        assert_eq!(
            result.data().periods_parts[1],
            TimePeriodPart::UserMacro {
                name: "{$WEEKEND}".into()
            }
        );

        let result = parser.parse("6-7,00:00-24:00;x", 0);
        assert_eq!(result.status(), ParseStatus::SuccessContinue);
        assert_eq!(result.get_match(), "6-7,00:00-24:00");

        assert!(parser.parse("{#PERIOD}", 0).is_fail());
    }

    #[test]
    fn test_simple_interval() {
        let parser = SimpleIntervalParser::default();
        assert_eq!(parser.parse("30", 0).data().seconds, Some(30));
        assert_eq!(parser.parse("5m", 0).data().seconds, Some(300));
        assert_eq!(parser.parse("1w", 0).data().suffix, Some('w'));
        assert_eq!(parser.parse("1y", 0).status(), ParseStatus::SuccessContinue);
        assert!(parser.parse("{$DELAY}", 0).is_fail());

        let parser = SimpleIntervalParser::new(IntervalOptions {
            usermacros: true,
            lldmacros: false,
        });
        assert_eq!(parser.parse("{$DELAY}", 0).data().macro_kind, Some(MacroKind::User));
    }

    #[test]
    fn test_flexible_interval() {
        let parser = FlexibleIntervalParser::default();
        let result = parser.parse("50/1-7,00:00-24:00", 0);
        assert_eq!(result.status(), ParseStatus::Success);
        assert_eq!(result.data().update_interval, "50");
        assert_eq!(result.data().time_period, "1-7,00:00-24:00");
        assert!(parser.parse("50", 0).is_fail());
    }

    #[test]
    fn test_scheduling_interval() {
        let parser = SchedulingIntervalParser::default();
        for source in [
            "md/30",
            "md1-31/30",
            "md1-5,8-31",
            "wd1-5h9-18",
            "md05-10wd5",
            "h00-23/23m0-59s/30",
            "s1-1,58-59/1,/1,/59",
        ] {
            assert_eq!(parser.parse(source, 0).status(), ParseStatus::Success, "{}", source);
        }

        let result = parser.parse("wd1-5h9", 0);
        assert_eq!(result.data().filters.len(), 2);
        assert_eq!(
            result.data().filters[0].ranges[0],
            ScheduleRange {
                from: Some(1),
                to: Some(5),
                step: None
            }
        );

        for source in ["md/31", "md32", "wd8", "h24", "md1-2/3", "md31-30", "wd01-7", "mdm"] {
            assert!(!parser.parse(source, 0).is_success(), "{}", source);
        }
    }

    #[test]
    fn test_update_interval() {
        let result = UpdateIntervalParser::default().parse("30s;50/1-7,00:00-24:00;wd1-5h9-18", 0);
        assert_eq!(result.status(), ParseStatus::Success);
        assert_eq!(result.data().delay.seconds, Some(30));
        assert_eq!(result.data().flexible().count(), 1);
        assert_eq!(result.data().scheduling().count(), 1);
    }

    #[test]
    fn test_update_interval_errors() {
        assert_eq!(error_of("30;1,23:59-24:00"), "incorrect syntax near \",23:59-24:00\"");
        assert_eq!(error_of("30;5/2,1:00-9:20;"), "unexpected end of interval");
        assert_eq!(error_of("30;md/"), "unexpected end of interval");
        assert_eq!(error_of("30;md/a"), "incorrect syntax near \"a\"");
        assert_eq!(error_of("30;mdm"), "incorrect syntax near \"m\"");
        assert_eq!(error_of("30;md1/1"), "incorrect syntax near \"/1\"");
        assert_eq!(error_of(";md"), "incorrect syntax near \";md\"");
    }

    #[test]
    fn test_flexible_interval_is_at_most_a_day() {
        assert!(UpdateIntervalParser::default()
            .parse("30;86400/7,23:59-24:00", 0)
            .is_success());
        assert_eq!(
            error_of("30;86401/7,23:59-24:00"),
            "incorrect syntax near \"1/7,23:59-24:00\""
        );
        assert_eq!(
            error_of("30;2d/7,23:59-24:00"),
            "incorrect syntax near \"d/7,23:59-24:00\""
        );
        assert!(FlexibleIntervalParser::default().parse("90000/1,00:00-24:00", 0).is_fail());
    }

    #[test]
    fn test_flexible_interval_length() {
        let longest = format!("30;{}/7,0:01-0:02", "0".repeat(FLEXIBLE_INTERVAL_MAX_LEN - 1));
        assert!(UpdateIntervalParser::default().parse(&longest, 0).is_success());

        let too_long = format!("30;{}/7,0:01-0:02", "0".repeat(FLEXIBLE_INTERVAL_MAX_LEN));
        assert_eq!(error_of(&too_long), "incorrect syntax near \"/7,0:01-0:02\"");
    }

    #[test]
    fn test_interval_error_positions() {
        let cases = [
            ("30;0/2,99:00-24:00", "incorrect syntax near \"9:00-24:00\""),
            ("30;0/2,000:00-24:00", "incorrect syntax near \":00-24:00\""),
            ("30;0/2,00:0-24:00", "incorrect syntax near \"-24:00\""),
            ("30;0/2,5:00-29:00", "incorrect syntax near \"9:00\""),
            ("30;0/2,0:00-9:2", "unexpected end of interval"),
            ("30;5/7-9,0:00-24:00", "incorrect syntax near \",0:00-24:00\""),
            ("30;h24", "incorrect syntax near \"4\""),
            ("30;h000", "unexpected end of interval"),
            ("30;md0", "unexpected end of interval"),
            ("30;md1-31/001", "incorrect syntax near \"01\""),
            ("30;md30-32/5", "unexpected end of interval"),
            ("30;wd1-07", "incorrect syntax near \"7\""),
            ("30;m", "incorrect syntax near \"m\""),
            ("30;h00-23md1-31", "incorrect syntax near \"md1-31\""),
        ];
        for (source, expected) in cases {
            assert_eq!(error_of(source), expected, "{}", source);
        }
    }
}
