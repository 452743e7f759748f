//! Numeric literal grammars
//!
//! - [`NumberParser`]: decimal numbers with optional size/time suffix
//! - [`PortParser`] / [`PortRangeParser`]: bounded port numbers and lists
//! - [`FunctionIdParser`]: `{<id>}` references to stored functions

use serde::{Deserialize, Serialize};

use super::config::ParserConfig;
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

/// Smallest port number accepted by default
pub const ZBX_MIN_PORT_NUMBER: u32 = 0;

/// Largest port number accepted by default
pub const ZBX_MAX_PORT_NUMBER: u32 = 65535;

/// Largest database identifier (2^63 - 1)
pub const ZBX_DB_MAX_ID: u64 = i64::MAX as u64;

const SIZE_SUFFIXES: &[u8] = b"KMGT";
const TIME_SUFFIXES: &[u8] = b"smhdw";

/// Multiplier for a number suffix
pub fn suffix_multiplier(suffix: char) -> Option<f64> {
    let value = match suffix {
        'K' => 1024.0,
        'M' => 1024.0 * 1024.0,
        'G' => 1024.0 * 1024.0 * 1024.0,
        'T' => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        's' => 1.0,
        'm' => 60.0,
        'h' => 3600.0,
        'd' => 86400.0,
        'w' => 7.0 * 86400.0,
        _ => return None,
    };
    Some(value)
}

// ============================================================================
// Number
// ============================================================================

/// Options for [`NumberParser`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberOptions {
    /// Accept a leading `-`
    pub with_minus: bool,
    /// Accept `K`, `M`, `G`, `T`
    pub with_size_suffix: bool,
    /// Accept `s`, `m`, `h`, `d`, `w`
    pub with_time_suffix: bool,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            with_minus: true,
            with_size_suffix: true,
            with_time_suffix: true,
        }
    }
}

/// A recognised number
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Number {
    /// Numeric part without the suffix, sign included
    pub number: String,
    /// Size or time suffix
    pub suffix: Option<char>,
}

impl Number {
    /// Numeric value with the suffix multiplier applied
    pub fn value(&self) -> Option<f64> {
        let base: f64 = self.number.parse().ok()?;
        match self.suffix {
            Some(suffix) => suffix_multiplier(suffix).map(|m| base * m),
            None => Some(base),
        }
    }
}

/// `[-](digits[.digits] | .digits)[suffix]`
#[derive(Debug, Clone, Default)]
pub struct NumberParser {
    options: NumberOptions,
    config: ParserConfig,
}

impl NumberParser {
    /// Create a number parser
    pub fn new(options: NumberOptions) -> Self {
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

impl TokenParser for NumberParser {
    type Output = Number;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Number> {
        run(source, pos, &self.config, |sc, pos| {
            scan_number(sc, pos, &self.options)
        })
    }
}

/// Unsigned or signed decimal with optional `.` fraction
fn scan_decimal(sc: &Scanner<'_>, pos: usize, with_minus: bool) -> Option<usize> {
    let mut p = pos;
    if with_minus && sc.is(p, b'-') {
        p += 1;
    }

    let int_end = sc.skip_digits(p);
    if int_end > p {
        if sc.is(int_end, b'.') {
            return Some(sc.skip_digits(int_end + 1));
        }
        return Some(int_end);
    }

    if sc.is(p, b'.') {
        let frac_end = sc.skip_digits(p + 1);
        if frac_end > p + 1 {
            return Some(frac_end);
        }
    }
    None
}

pub(crate) fn scan_number(
    sc: &Scanner<'_>,
    pos: usize,
    options: &NumberOptions,
) -> Option<(usize, Number)> {
    let end = scan_decimal(sc, pos, options.with_minus)?;
    let number = sc.slice(pos, end).to_string();

    let suffix = sc.at(end).filter(|b| {
        (options.with_size_suffix && SIZE_SUFFIXES.contains(b))
            || (options.with_time_suffix && TIME_SUFFIXES.contains(b))
    });

    match suffix {
        Some(b) => Some((
            end + 1,
            Number {
                number,
                suffix: Some(b as char),
            },
        )),
        None => Some((
            end,
            Number {
                number,
                suffix: None,
            },
        )),
    }
}

/// Digit run at `pos` parsed as an integer within `min..=max`
pub(crate) fn scan_bounded(sc: &Scanner<'_>, pos: usize, min: u64, max: u64) -> Option<(usize, u64)> {
    let end = sc.skip_digits(pos);
    if end == pos {
        return None;
    }
    let value: u64 = sc.slice(pos, end).parse().ok()?;
    if value < min || value > max {
        return None;
    }
    Some((end, value))
}

// ============================================================================
// Ports
// ============================================================================

/// Bounds for port numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PortOptions {
    /// Inclusive minimum
    pub min: u32,
    /// Inclusive maximum
    pub max: u32,
}

impl Default for PortOptions {
    fn default() -> Self {
        Self {
            min: ZBX_MIN_PORT_NUMBER,
            max: ZBX_MAX_PORT_NUMBER,
        }
    }
}

/// A single bounded port number
#[derive(Debug, Clone, Default)]
pub struct PortParser {
    options: PortOptions,
    config: ParserConfig,
}

impl PortParser {
    /// Create a port parser with the given bounds
    pub fn new(options: PortOptions) -> Self {
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

impl TokenParser for PortParser {
    type Output = u32;

    fn parse(&self, source: &str, pos: usize) -> Parsed<u32> {
        let PortOptions { min, max } = self.options;
        run(source, pos, &self.config, |sc, pos| {
            scan_bounded(sc, pos, min.into(), max.into()).map(|(end, v)| (end, v as u32))
        })
    }
}

/// One `from[-to]` member of a port list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortRange {
    /// First port
    pub from: u32,
    /// Last port (equal to `from` for a single port)
    pub to: u32,
}

/// Comma-separated ports and `from-to` ranges
///
/// A dangling `,` or `-` fails the whole token; so does a range whose
/// start exceeds its end.
#[derive(Debug, Clone, Default)]
pub struct PortRangeParser {
    options: PortOptions,
    config: ParserConfig,
}

impl PortRangeParser {
    /// Create a port range parser with the given bounds
    pub fn new(options: PortOptions) -> Self {
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

impl TokenParser for PortRangeParser {
    type Output = Vec<PortRange>;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Vec<PortRange>> {
        let (min, max) = (u64::from(self.options.min), u64::from(self.options.max));

        run(source, pos, &self.config, |sc, pos| {
            let mut ranges = Vec::new();
            let mut p = pos;
            loop {
                let (end, from) = scan_bounded(sc, p, min, max)?;
                p = end;
                let mut to = from;
                if sc.is(p, b'-') {
                    let (end, upper) = scan_bounded(sc, p + 1, min, max)?;
                    if upper < from {
                        return None;
                    }
                    p = end;
                    to = upper;
                }
                ranges.push(PortRange {
                    from: from as u32,
                    to: to as u32,
                });

                if !sc.is(p, b',') {
                    break;
                }
                p += 1;
            }
            Some((p, ranges))
        })
    }
}

// ============================================================================
// Function identifiers
// ============================================================================

/// `{<id>}` with `1 <= id <= ZBX_DB_MAX_ID` and no leading zeros
#[derive(Debug, Clone, Default)]
pub struct FunctionIdParser {
    config: ParserConfig,
}

impl FunctionIdParser {
    /// Create a function id parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

pub(crate) fn scan_function_id(sc: &Scanner<'_>, pos: usize) -> Option<(usize, u64)> {
    if !sc.is(pos, b'{') || sc.is(pos + 1, b'0') {
        return None;
    }
    let (end, id) = scan_bounded(sc, pos + 1, 1, ZBX_DB_MAX_ID)?;
    if !sc.is(end, b'}') {
        return None;
    }
    Some((end + 1, id))
}

impl TokenParser for FunctionIdParser {
    type Output = u64;

    fn parse(&self, source: &str, pos: usize) -> Parsed<u64> {
        run(source, pos, &self.config, |sc, pos| scan_function_id(sc, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::protocol::ParseStatus;

    #[test]
    fn test_number_forms() {
        let parser = NumberParser::default();
        for input in ["1", ".5", "5.", "-1.5", "1.5K", "1w"] {
            assert_eq!(parser.parse(input, 0).status(), ParseStatus::Success, "{}", input);
        }
        assert!(parser.parse("..5", 0).is_fail());
        assert!(parser.parse("-", 0).is_fail());
    }

    #[test]
    fn test_number_suffix_continue() {
        let result = NumberParser::default().parse("1Ks", 0);
        assert_eq!(result.status(), ParseStatus::SuccessContinue);
        assert_eq!(result.get_match(), "1K");
        assert_eq!(result.data().suffix, Some('K'));
        assert_eq!(result.data().value(), Some(1024.0));
    }

    #[test]
    fn test_number_without_suffixes() {
        let parser = NumberParser::new(NumberOptions {
            with_minus: false,
            with_size_suffix: false,
            with_time_suffix: false,
        });
        let result = parser.parse("10m", 0);
        assert_eq!(result.get_match(), "10");
        assert!(parser.parse("-1", 0).is_fail());
    }

    #[test]
    fn test_port_bounds() {
        let parser = PortParser::default();
        assert_eq!(*parser.parse("65535", 0).data(), 65535);
        assert!(parser.parse("65536", 0).is_fail());
        assert!(parser.parse("99999999999999999999999", 0).is_fail());
    }

    #[test]
    fn test_port_range() {
        let parser = PortRangeParser::default();
        let result = parser.parse("22,80-90", 0);
        assert!(result.is_success());
        assert_eq!(
            result.data(),
            &vec![
                PortRange { from: 22, to: 22 },
                PortRange { from: 80, to: 90 }
            ]
        );
    }

    #[test]
    fn test_port_range_dangling_member_fails() {
        let parser = PortRangeParser::default();
        assert!(parser.parse("123-123,123-", 0).is_fail());
        assert!(parser.parse("123,", 0).is_fail());
        assert!(parser.parse("90-80", 0).is_fail());
    }

    #[test]
    fn test_function_id() {
        let parser = FunctionIdParser::new();
        assert_eq!(*parser.parse("{12345}", 0).data(), 12345);
        assert!(parser.parse("{0}", 0).is_fail());
        assert!(parser.parse("{012}", 0).is_fail());
        assert!(parser.parse("{9223372036854775808}", 0).is_fail());
        assert!(parser.parse("{9223372036854775807}", 0).is_success());
    }
}
