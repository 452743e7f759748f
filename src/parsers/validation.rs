//! Validation-rule strings
//!
//! A rule string is a `|`-separated list of clauses describing what an API
//! parameter may contain:
//!
//! ```text
//! fatal|required|in 1,2,3|db hosts.name|time_unit 60:3600
//! ```
//!
//! Clause names are unique within one string. Any unknown or malformed
//! clause fails the whole string with [`ParseError::InvalidRules`] pointing
//! at the clause keyword.

use indexmap::IndexMap;
use serde::Serialize;

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::error::ParseError;
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

const FLAGS: &[&str] = &[
    "fatal",
    "required",
    "not_empty",
    "json",
    "array",
    "array_id",
    "id",
    "cuid",
    "rgb",
    "string",
    "range_time",
    "abs_date",
    "abs_time",
    "time_periods",
    "int32",
];

/// `from:to` bounds of a `time_unit` clause, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Lower bound
    pub from: i64,
    /// Upper bound
    pub to: i64,
}

/// Parameters of one clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// A bare flag such as `required`
    Flag(bool),
    /// `in a,b,c`
    In(Vec<String>),
    /// `db table.field` and `array_db table.field`
    Db {
        /// Table name
        table: String,
        /// Field name
        field: String,
    },
    /// `ge N` and `le N`
    Int(i64),
    /// `time_unit` and `time_unit_year`, with optional ranges
    TimeUnit(Vec<TimeRange>),
}

/// Clause name to clause parameters, in source order
pub type ValidationRules = IndexMap<String, RuleValue>;

fn scan_int(sc: &Scanner<'_>, pos: usize) -> Option<(usize, i64)> {
    let digits = if sc.is(pos, b'-') { pos + 1 } else { pos };
    let end = sc.skip_digits(digits);
    if end == digits {
        return None;
    }
    sc.slice(pos, end).parse().ok().map(|n| (end, n))
}

fn scan_db_field(sc: &Scanner<'_>, pos: usize) -> Option<(usize, RuleValue)> {
    let table_end = sc.skip_while(pos, CharClass::Identifier);
    if table_end == pos || !sc.is(table_end, b'.') {
        return None;
    }
    let field_end = sc.skip_while(table_end + 1, CharClass::Identifier);
    if field_end == table_end + 1 {
        return None;
    }
    Some((
        field_end,
        RuleValue::Db {
            table: sc.slice(pos, table_end).to_string(),
            field: sc.slice(table_end + 1, field_end).to_string(),
        },
    ))
}

fn scan_in_list(sc: &Scanner<'_>, pos: usize) -> Option<(usize, RuleValue)> {
    let mut values = Vec::new();
    let mut p = pos;
    loop {
        let end = sc.skip_bytes(p, |b| !matches!(b, b',' | b'|' | b' ' | b'\t'));
        if end == p {
            return None;
        }
        values.push(sc.slice(p, end).to_string());
        p = end;
        if !sc.is(p, b',') {
            return Some((p, RuleValue::In(values)));
        }
        p += 1;
    }
}

fn scan_time_ranges(sc: &Scanner<'_>, pos: usize) -> Option<(usize, Vec<TimeRange>)> {
    let mut ranges = Vec::new();
    let mut p = pos;
    loop {
        let (end, from) = scan_int(sc, p)?;
        if !sc.is(end, b':') {
            return None;
        }
        let (end, to) = scan_int(sc, end + 1)?;
        ranges.push(TimeRange { from, to });
        p = end;
        if !sc.is(p, b',') {
            return Some((p, ranges));
        }
        p += 1;
    }
}

/// One clause starting at its keyword
fn scan_clause(sc: &Scanner<'_>, pos: usize) -> Option<(usize, String, RuleValue)> {
    let name_end = sc.skip_while(pos, CharClass::Identifier);
    if name_end == pos {
        return None;
    }
    let name = sc.slice(pos, name_end);

    if FLAGS.contains(&name) {
        return Some((name_end, name.to_string(), RuleValue::Flag(true)));
    }

    let arg = sc.skip_spaces(name_end);
    let (end, value) = match name {
        "in" if arg > name_end => scan_in_list(sc, arg)?,
        "db" | "array_db" if arg > name_end => scan_db_field(sc, arg)?,
        "ge" | "le" if arg > name_end => {
            let (end, n) = scan_int(sc, arg)?;
            (end, RuleValue::Int(n))
        }
        "time_unit" | "time_unit_year" => {
            if arg > name_end && (sc.is_class(arg, CharClass::Digit) || sc.is(arg, b'-')) {
                let (end, ranges) = scan_time_ranges(sc, arg)?;
                (end, RuleValue::TimeUnit(ranges))
            } else {
                (name_end, RuleValue::TimeUnit(Vec::new()))
            }
        }
        _ => return None,
    };
    Some((end, name.to_string(), value))
}

pub(crate) fn scan_rules(sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, ValidationRules)> {
    let mut rules = ValidationRules::new();
    let mut p = pos;

    loop {
        let clause_start = sc.skip_spaces(p);
        let parsed = scan_clause(sc, clause_start).and_then(|(end, name, value)| {
            let after = sc.skip_spaces(end);
            (after == sc.len() || sc.is(after, b'|')).then_some((after, name, value))
        });

        let Some((after, name, value)) = parsed else {
            log_debug!("invalid validation clause at {}", clause_start);
            sc.report(ParseError::InvalidRules {
                rules: sc.slice(pos, sc.len()).to_string(),
                position: clause_start,
            });
            return None;
        };

        if rules.contains_key(&name) {
            sc.report(ParseError::DuplicateRule {
                name,
                position: clause_start,
            });
            return None;
        }
        rules.insert(name, value);

        if after == sc.len() {
            return Some((after, rules));
        }
        p = after + 1;
    }
}

/// Parser for validation-rule strings
///
/// Always consumes the whole input or fails with a diagnostic.
#[derive(Debug, Clone, Default)]
pub struct ValidationRuleParser {
    config: ParserConfig,
}

impl ValidationRuleParser {
    /// Create a validation-rule parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for ValidationRuleParser {
    type Output = ValidationRules;

    fn parse(&self, source: &str, pos: usize) -> Parsed<ValidationRules> {
        run(source, pos, &self.config, scan_rules)
    }
}
