//! Trigger and Calculated-Item Expressions
//!
//! The most recursive grammar in the crate. An expression is a chain of
//! operands joined by binary operators; operands nest through groups,
//! function parameters and `{?...}` expression macros:
//!
//! ```text
//! expression := operand (operator operand)*
//! operand    := ["not" ws] ["-"] atom
//! atom       := "(" expression ")" | string | macro | number
//!             | name "(" query ("," hist-param)* ")"
//!             | name "(" [expression ("," expression)*] ")"
//! ```
//!
//! A dangling operator ends the match before the operator, and the result
//! carries an "incorrect expression starting from" diagnostic.
//!
//! # Example
//!
//! ```rust
//! use monexpr::parsers::{ExpressionOptions, ExpressionParser, TokenKind, TokenParser};
//!
//! let parser = ExpressionParser::new(ExpressionOptions::default());
//! let result = parser.parse("last(/host/key) > 0 and {TRIGGER.VALUE} = 1", 0);
//!
//! assert!(result.is_success());
//! assert!(matches!(result.data()[0].kind, TokenKind::HistFunction { .. }));
//! ```

use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::error::ParseError;
use super::macros::{scan_builtin_macro, scan_lld_macro, scan_macro_function, scan_user_macro, Receivers, UserMacroOptions};
use super::number::{scan_function_id, scan_number, NumberOptions};
use super::protocol::{Parsed, TokenParser};
use super::query::{scan_query, Query, QueryOptions};
use super::scan::{run, Scanner};

const UNSIGNED: NumberOptions = NumberOptions {
    with_minus: false,
    with_size_suffix: true,
    with_time_suffix: true,
};

const PERIOD_UNITS: &[u8] = b"smhdwMy";

/// Symbolic operators, longest first
const SYMBOL_OPERATORS: &[&str] = &["<>", "<=", ">=", "+", "-", "*", "/", "=", "<", ">"];

/// Options for [`ExpressionParser`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpressionOptions {
    /// Accept `{$NAME}` operands
    pub usermacros: bool,
    /// Accept `{#NAME}` operands
    pub lldmacros: bool,
    /// Accept `{HOST.HOST}` as a query host
    pub host_macro: bool,
    /// Accept `{HOST.HOST<n>}` as a query host
    pub host_macro_n: bool,
    /// Accept queries with an empty host
    pub empty_host: bool,
    /// Calculated-item dialect: `*` wildcards and filters, no built-in macros
    pub calculated: bool,
    /// Stored-trigger dialect: `{<functionid>}` operands instead of history functions
    pub collapsed_expression: bool,
    /// Built-in macro operands
    pub macros: Vec<String>,
    /// Built-in macro operands with a reference index
    pub macros_n: Vec<String>,
    /// Accept nested `{?expr}` operands
    pub expression_macros: bool,
}

impl Default for ExpressionOptions {
    fn default() -> Self {
        Self {
            usermacros: false,
            lldmacros: false,
            host_macro: false,
            host_macro_n: false,
            empty_host: false,
            calculated: false,
            collapsed_expression: false,
            macros: vec!["{TRIGGER.VALUE}".to_string()],
            macros_n: Vec::new(),
            expression_macros: false,
        }
    }
}

impl ExpressionOptions {
    /// Options for the body of a `{?...}` macro
    pub(crate) fn for_macro(usermacros: bool, lldmacros: bool, macros_n: Vec<String>) -> Self {
        Self {
            usermacros,
            lldmacros,
            macros: Vec::new(),
            macros_n,
            expression_macros: true,
            ..Self::default()
        }
    }

    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            host_macro: self.host_macro,
            host_macro_n: self.host_macro_n,
            empty_host: self.empty_host,
            calculated: self.calculated,
            usermacros: self.usermacros,
            lldmacros: self.lldmacros,
        }
    }
}

/// Token type plus type-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenKind {
    /// `(`
    OpenBrace,
    /// `)`
    CloseBrace,
    /// Binary operator, unary `-` or `not`
    Operator,
    /// Unsigned number
    Number {
        /// Size or time suffix
        suffix: Option<char>,
    },
    /// `"..."`
    String,
    /// Built-in macro or built-in macro function
    Macro,
    /// User macro or user macro function
    UserMacro,
    /// Discovery macro or discovery macro function
    LldMacro,
    /// `{<functionid>}` in a collapsed expression
    FunctionIdMacro,
    /// Nested `{?expr}`
    ExpressionMacro,
    /// Function over item history; the first parameter is a query
    HistFunction {
        /// Function name
        function: String,
        /// Parameters in order
        parameters: Vec<HistParam>,
    },
    /// Function over expressions
    MathFunction {
        /// Function name
        function: String,
        /// One [`TokenKind::Expression`] token per parameter
        parameters: Vec<Token>,
    },
    /// One math function parameter
    Expression {
        /// Tokens of the parameter expression
        tokens: Vec<Token>,
    },
}

/// One expression token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Type and fields
    #[serde(flatten)]
    pub kind: TokenKind,
    /// Byte offset
    pub pos: usize,
    /// Length in bytes
    pub length: usize,
    /// Token text
    #[serde(rename = "match")]
    pub matched: String,
}

/// Kind of a history function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistParamKind {
    /// `/host/key`
    Query {
        /// Parsed query
        query: Query,
    },
    /// `#5`, `1h`, `1d:now/d-1h`
    Period {
        /// Count or length part
        sec_num: String,
        /// Part after `:`, empty when absent
        time_shift: String,
    },
    /// `"..."`
    Quoted,
    /// Macro or empty parameter
    Unquoted,
}

/// One history function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistParam {
    /// Kind and fields
    #[serde(flatten)]
    pub kind: HistParamKind,
    /// Byte offset
    pub pos: usize,
    /// Length in bytes
    pub length: usize,
    /// Parameter text
    #[serde(rename = "match")]
    pub matched: String,
}

fn token(sc: &Scanner<'_>, kind: TokenKind, start: usize, end: usize) -> Token {
    Token {
        kind,
        pos: start,
        length: end - start,
        matched: sc.slice(start, end).to_string(),
    }
}

/// Per-call expression state; `error` is the last failure position seen
struct ExprScan<'o> {
    options: &'o ExpressionOptions,
    query: QueryOptions,
    error: Option<usize>,
}

impl<'o> ExprScan<'o> {
    fn new(options: &'o ExpressionOptions) -> Self {
        Self {
            options,
            query: options.query_options(),
            error: None,
        }
    }

    /// Returns the end of the last operand; trailing whitespace is not consumed
    fn expression(&mut self, sc: &mut Scanner<'_>, pos: usize, tokens: &mut Vec<Token>) -> Option<usize> {
        let start = sc.skip_whitespace(pos);
        let mut end = self.operand(sc, start, tokens, true)?;

        loop {
            let op_start = sc.skip_whitespace(end);
            let Some(op_end) = self.operator(sc, end, op_start) else {
                break;
            };

            let mark = tokens.len();
            tokens.push(token(sc, TokenKind::Operator, op_start, op_end));

            let rhs = sc.skip_whitespace(op_end);
            match self.operand(sc, rhs, tokens, rhs > op_end) {
                Some(rhs_end) => end = rhs_end,
                None => {
                    tokens.truncate(mark);
                    break;
                }
            }
        }

        Some(end)
    }

    fn operator(&mut self, sc: &Scanner<'_>, end: usize, pos: usize) -> Option<usize> {
        if let Some(op) = SYMBOL_OPERATORS.iter().find(|op| sc.starts_with(pos, op)) {
            return Some(pos + op.len());
        }

        let word = ["and", "or"]
            .into_iter()
            .find(|w| pos > end && sc.starts_with(pos, w));
        if let Some(word) = word {
            let word_end = pos + word.len();
            if sc.is_class(word_end, CharClass::Whitespace) || sc.is(word_end, b'(') {
                return Some(word_end);
            }
            self.error = Some(word_end);
            return None;
        }

        self.error = Some(pos);
        None
    }

    /// `unary_not` is false right after an operator with no space before `not`
    fn operand(
        &mut self,
        sc: &mut Scanner<'_>,
        pos: usize,
        tokens: &mut Vec<Token>,
        unary_not: bool,
    ) -> Option<usize> {
        let mark = tokens.len();
        let mut p = pos;

        if unary_not && sc.starts_with(p, "not") && sc.is_class(p + 3, CharClass::Whitespace) {
            tokens.push(token(sc, TokenKind::Operator, p, p + 3));
            p = sc.skip_whitespace(p + 3);
        }
        if sc.is(p, b'-') {
            tokens.push(token(sc, TokenKind::Operator, p, p + 1));
            p = sc.skip_whitespace(p + 1);
        }

        let end = self.atom(sc, p, tokens);
        if end.is_none() {
            tokens.truncate(mark);
        }
        end
    }

    fn atom(&mut self, sc: &mut Scanner<'_>, pos: usize, tokens: &mut Vec<Token>) -> Option<usize> {
        if sc.is(pos, b'(') {
            return self.group(sc, pos, tokens);
        }

        let found = match sc.at(pos) {
            Some(b'"') => sc.quoted(pos).map(|end| token(sc, TokenKind::String, pos, end)),
            Some(b'{') => self.macro_atom(sc, pos),
            _ => match scan_number(sc, pos, &UNSIGNED) {
                Some((end, number)) => Some(token(
                    sc,
                    TokenKind::Number {
                        suffix: number.suffix,
                    },
                    pos,
                    end,
                )),
                None => self.function(sc, pos),
            },
        };

        match found {
            Some(t) => {
                let end = t.pos + t.length;
                tokens.push(t);
                Some(end)
            }
            None => {
                // `not(...)` keeps the position where its argument failed
                let inner = sc.starts_with(pos, "not(") && self.error.is_some_and(|e| e > pos);
                if !inner {
                    self.error = Some(pos);
                }
                None
            }
        }
    }

    fn group(&mut self, sc: &mut Scanner<'_>, pos: usize, tokens: &mut Vec<Token>) -> Option<usize> {
        let mark = tokens.len();
        tokens.push(token(sc, TokenKind::OpenBrace, pos, pos + 1));

        let inner = sc.nested(|sc| self.expression(sc, pos + 1, tokens));
        if let Some(inner_end) = inner {
            let close = sc.skip_whitespace(inner_end);
            if sc.is(close, b')') {
                tokens.push(token(sc, TokenKind::CloseBrace, close, close + 1));
                return Some(close + 1);
            }
        }

        tokens.truncate(mark);
        None
    }

    fn macro_atom(&mut self, sc: &mut Scanner<'_>, pos: usize) -> Option<Token> {
        let options = self.options;

        if options.collapsed_expression {
            if let Some((end, _)) = scan_function_id(sc, pos) {
                return Some(token(sc, TokenKind::FunctionIdMacro, pos, end));
            }
        }
        if options.expression_macros {
            if let Some((end, _)) = scan_expression_macro(sc, pos, options) {
                return Some(token(sc, TokenKind::ExpressionMacro, pos, end));
            }
        }
        if options.usermacros {
            let receivers = Receivers {
                user: true,
                ..Receivers::NONE
            };
            let end = scan_macro_function(sc, pos, &receivers)
                .map(|(end, _)| end)
                .or_else(|| scan_user_macro(sc, pos, &UserMacroOptions::default()).map(|(end, _)| end));
            if let Some(end) = end {
                return Some(token(sc, TokenKind::UserMacro, pos, end));
            }
        }
        if options.lldmacros {
            let receivers = Receivers {
                lld: true,
                ..Receivers::NONE
            };
            let end = scan_macro_function(sc, pos, &receivers)
                .map(|(end, _)| end)
                .or_else(|| scan_lld_macro(sc, pos).map(|(end, _)| end));
            if let Some(end) = end {
                return Some(token(sc, TokenKind::LldMacro, pos, end));
            }
        }
        if !options.calculated {
            let receivers = Receivers {
                macros: &options.macros,
                macros_n: &options.macros_n,
                ..Receivers::NONE
            };
            let end = scan_macro_function(sc, pos, &receivers)
                .map(|(end, _)| end)
                .or_else(|| {
                    scan_builtin_macro(sc, pos, &options.macros, &options.macros_n).map(|(end, _)| end)
                });
            if let Some(end) = end {
                return Some(token(sc, TokenKind::Macro, pos, end));
            }
        }
        None
    }

    fn function(&mut self, sc: &mut Scanner<'_>, pos: usize) -> Option<Token> {
        let name_end = sc.skip_while(pos, CharClass::FunctionName);
        if name_end == pos || !sc.is(name_end, b'(') {
            return None;
        }
        let function = sc.slice(pos, name_end).to_string();

        let query_start = sc.skip_spaces(name_end + 1);
        let (end, kind) = if sc.is(query_start, b'/') {
            if self.options.collapsed_expression {
                return None;
            }
            let (end, parameters) = self.hist_params(sc, query_start)?;
            (end, TokenKind::HistFunction { function, parameters })
        } else {
            let first = sc.skip_whitespace(name_end + 1);
            let (end, parameters) = sc.nested(|sc| self.math_params(sc, first))?;
            (end, TokenKind::MathFunction { function, parameters })
        };
        Some(token(sc, kind, pos, end))
    }

    /// `query ("," param)* ")"` starting at the query
    fn hist_params(&mut self, sc: &mut Scanner<'_>, first: usize) -> Option<(usize, Vec<HistParam>)> {
        let (query_end, query) = scan_query(sc, first, &self.query)?;
        let mut parameters = vec![HistParam {
            kind: HistParamKind::Query { query },
            pos: first,
            length: query_end - first,
            matched: sc.slice(first, query_end).to_string(),
        }];

        let mut p = sc.skip_spaces(query_end);
        while sc.is(p, b',') {
            let start = sc.skip_spaces(p + 1);
            let (end, kind) = self.hist_param(sc, start)?;
            parameters.push(HistParam {
                kind,
                pos: start,
                length: end - start,
                matched: sc.slice(start, end).to_string(),
            });
            p = sc.skip_spaces(end);
        }

        if !sc.is(p, b')') {
            return None;
        }
        Some((p + 1, parameters))
    }

    fn hist_param(&self, sc: &Scanner<'_>, pos: usize) -> Option<(usize, HistParamKind)> {
        if sc.is(pos, b'"') {
            return sc.quoted(pos).map(|end| (end, HistParamKind::Quoted));
        }
        if let Some((end, sec_num, time_shift)) = scan_period(sc, pos) {
            return Some((end, HistParamKind::Period { sec_num, time_shift }));
        }
        if self.options.usermacros {
            if let Some((end, _)) = scan_user_macro(sc, pos, &UserMacroOptions::default()) {
                return Some((end, HistParamKind::Unquoted));
            }
        }
        if self.options.lldmacros {
            if let Some((end, _)) = scan_lld_macro(sc, pos) {
                return Some((end, HistParamKind::Unquoted));
            }
        }
        matches!(sc.at(pos), Some(b',' | b')')).then_some((pos, HistParamKind::Unquoted))
    }

    /// `[expression ("," expression)*] ")"`
    fn math_params(&mut self, sc: &mut Scanner<'_>, first: usize) -> Option<(usize, Vec<Token>)> {
        let mut parameters = Vec::new();
        if sc.is(first, b')') {
            return Some((first + 1, parameters));
        }

        let mut p = first;
        loop {
            let start = sc.skip_whitespace(p);
            let mut tokens = Vec::new();
            let end = self.expression(sc, start, &mut tokens)?;
            parameters.push(token(sc, TokenKind::Expression { tokens }, start, end));

            let next = sc.skip_whitespace(end);
            match sc.at(next) {
                Some(b',') => p = next + 1,
                Some(b')') => return Some((next + 1, parameters)),
                _ => return None,
            }
        }
    }
}

/// `(#N | N[unit])[:now(/unit | [+-]N unit)*]`
fn scan_period(sc: &Scanner<'_>, pos: usize) -> Option<(usize, String, String)> {
    let mut p = if sc.is(pos, b'#') {
        let end = sc.skip_digits(pos + 1);
        if end == pos + 1 {
            return None;
        }
        end
    } else {
        let end = sc.skip_digits(pos);
        if end == pos {
            return None;
        }
        match sc.at(end) {
            Some(b) if PERIOD_UNITS.contains(&b) => end + 1,
            _ => end,
        }
    };
    let sec_num = sc.slice(pos, p).to_string();

    let mut time_shift = String::new();
    if sc.starts_with(p, ":now") {
        let shift_start = p + 1;
        p += ":now".len();
        loop {
            match sc.at(p) {
                Some(b'/') if sc.at(p + 1).is_some_and(|b| PERIOD_UNITS.contains(&b)) => p += 2,
                Some(b'+' | b'-') => {
                    let digits_end = sc.skip_digits(p + 1);
                    match sc.at(digits_end) {
                        Some(b) if digits_end > p + 1 && PERIOD_UNITS.contains(&b) => p = digits_end + 1,
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        time_shift = sc.slice(shift_start, p).to_string();
    }

    Some((p, sec_num, time_shift))
}

/// Full-input expression run shared by the public parsers
fn parse_expression(sc: &mut Scanner<'_>, pos: usize, options: &ExpressionOptions) -> Option<(usize, Vec<Token>)> {
    let mut scan = ExprScan::new(options);
    let mut tokens = Vec::new();

    let end = scan.expression(sc, pos, &mut tokens).map(|end| {
        let trailing = sc.skip_whitespace(end);
        if trailing == sc.len() {
            trailing
        } else {
            end
        }
    });

    if end != Some(sc.len()) {
        let at = scan.error.unwrap_or(pos);
        log_debug!("expression stops at {}", at);
        sc.report(ParseError::incorrect_expression(sc.src(), at));
    }
    end.map(|end| (end, tokens))
}

/// Trigger or calculated-item expression
#[derive(Debug, Clone, Default)]
pub struct ExpressionParser {
    options: ExpressionOptions,
    config: ParserConfig,
}

impl ExpressionParser {
    /// Create an expression parser
    pub fn new(options: ExpressionOptions) -> Self {
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

impl TokenParser for ExpressionParser {
    type Output = Vec<Token>;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Vec<Token>> {
        let parsed = run(source, pos, &self.config, |sc, pos| {
            parse_expression(sc, pos, &self.options)
        });
        if parsed.is_fail() && parsed.error().is_none() {
            return parsed.with_error(ParseError::incorrect_expression(source, pos));
        }
        parsed
    }
}

// ============================================================================
// Expression macros
// ============================================================================

/// Options for [`ExpressionMacroParser`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpressionMacroOptions {
    /// Accept `{$NAME}` operands
    pub usermacros: bool,
    /// Accept `{#NAME}` operands
    pub lldmacros: bool,
    /// Accept `{HOST.HOST}` as a query host
    pub host_macro: bool,
    /// Accept `{HOST.HOST<n>}` as a query host
    pub host_macro_n: bool,
    /// Accept queries with an empty host
    pub empty_host: bool,
    /// Built-in macro operands with a reference index
    pub macros_n: Vec<String>,
}

impl ExpressionMacroOptions {
    pub(crate) fn expression_options(&self) -> ExpressionOptions {
        ExpressionOptions {
            host_macro: self.host_macro,
            host_macro_n: self.host_macro_n,
            empty_host: self.empty_host,
            ..ExpressionOptions::for_macro(self.usermacros, self.lldmacros, self.macros_n.clone())
        }
    }
}

/// A `{?expr}` macro
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpressionMacro {
    /// Text between `{?` and `}`
    pub expression: String,
    /// Tokens of the expression
    pub tokens: Vec<Token>,
}

/// `{?expr}` at `pos`; on failure after `{?` the error carries the stop position
pub(crate) fn scan_expression_macro_at(
    sc: &mut Scanner<'_>,
    pos: usize,
    options: &ExpressionOptions,
) -> Result<(usize, ExpressionMacro), Option<usize>> {
    if !sc.starts_with(pos, "{?") {
        return Err(None);
    }

    let mut scan = ExprScan::new(options);
    let mut tokens = Vec::new();
    let body = pos + 2;
    let end = sc.nested(|sc| scan.expression(sc, body, &mut tokens));

    let Some(end) = end else {
        return Err(Some(scan.error.unwrap_or(body)));
    };
    let close = sc.skip_whitespace(end);
    if !sc.is(close, b'}') {
        return Err(Some(scan.error.filter(|&e| e >= close).unwrap_or(close)));
    }

    Ok((
        close + 1,
        ExpressionMacro {
            expression: sc.slice(body, close).to_string(),
            tokens,
        },
    ))
}

pub(crate) fn scan_expression_macro(
    sc: &mut Scanner<'_>,
    pos: usize,
    options: &ExpressionOptions,
) -> Option<(usize, ExpressionMacro)> {
    scan_expression_macro_at(sc, pos, options).ok()
}

/// `{?expr}`
#[derive(Debug, Clone)]
pub struct ExpressionMacroParser {
    options: ExpressionOptions,
    config: ParserConfig,
}

impl Default for ExpressionMacroParser {
    fn default() -> Self {
        Self::new(ExpressionMacroOptions::default())
    }
}

impl ExpressionMacroParser {
    /// Create an expression macro parser
    pub fn new(options: ExpressionMacroOptions) -> Self {
        Self {
            options: options.expression_options(),
            config: ParserConfig::default(),
        }
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for ExpressionMacroParser {
    type Output = ExpressionMacro;

    fn parse(&self, source: &str, pos: usize) -> Parsed<ExpressionMacro> {
        run(source, pos, &self.config, |sc, pos| {
            match scan_expression_macro_at(sc, pos, &self.options) {
                Ok(found) => Some(found),
                Err(stop) => {
                    if let Some(at) = stop {
                        sc.report(ParseError::incorrect_expression(sc.src(), at));
                    }
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

    fn parse(source: &str) -> Parsed<Vec<Token>> {
        ExpressionParser::default().parse(source, 0)
    }

    fn parse_with(source: &str, options: ExpressionOptions) -> Parsed<Vec<Token>> {
        ExpressionParser::new(options).parse(source, 0)
    }

    fn error(result: &Parsed<Vec<Token>>) -> String {
        result.error().map(ToString::to_string).unwrap_or_default()
    }

    #[test]
    fn test_numbers_and_whitespace() {
        for source in ["1+1", "1+1 ", " 1+1 \t\r\n", ".5", "5.", "-1.5T", "1w", "last(/host/key)=00"] {
            assert_eq!(parse(source).status(), ParseStatus::Success, "{:?}", source);
        }
        assert!(parse("..5").is_fail());

        let result = parse("5..");
        assert_eq!(result.get_match(), "5.");
        assert_eq!(error(&result), "incorrect expression starting from \".\"");
    }

    #[test]
    fn test_empty_input_errors() {
        assert_eq!(error(&parse("")), "incorrect expression starting from \"\"");
        assert_eq!(error(&parse(" ")), "incorrect expression starting from \"\"");
        assert_eq!(error(&parse("+")), "incorrect expression starting from \"+\"");
        assert_eq!(error(&parse("abc")), "incorrect expression starting from \"abc\"");
    }

    #[test]
    fn test_word_operator_boundaries() {
        assert!(parse("last(/host/key) and {TRIGGER.VALUE}").is_success());

        let result = parse("last(/host/key)and {TRIGGER.VALUE}");
        assert_eq!(result.get_match(), "last(/host/key)");
        assert_eq!(
            error(&result),
            "incorrect expression starting from \"and {TRIGGER.VALUE}\""
        );

        let result = parse("last(/host/key) and{TRIGGER.VALUE}");
        assert_eq!(error(&result), "incorrect expression starting from \"{TRIGGER.VALUE}\"");

        let result = parse("last(/host/key) and + {TRIGGER.VALUE}");
        assert_eq!(error(&result), "incorrect expression starting from \"+ {TRIGGER.VALUE}\"");

        assert!(parse("last(/host/key,1) and(-1)").is_success());
        assert_eq!(parse("last(/host/key,1)and(-1)").status(), ParseStatus::SuccessContinue);
        assert_eq!(parse("1 AND 1").status(), ParseStatus::SuccessContinue);
    }

    #[test]
    fn test_not_and_unary_minus() {
        for source in ["not 1", "not (1)", "not -1", "not -(1)", "not(1)", "not(-1)", "last(/host/key,1) --1"] {
            assert!(parse(source).is_success(), "{:?}", source);
        }
        for source in ["not1", "not-1", "not{TRIGGER.VALUE}", "- not 1", "-not 1", "Not 1", "--1"] {
            assert!(parse(source).is_fail(), "{:?}", source);
        }

        let result = parse("1 not 1");
        assert_eq!(result.get_match(), "1");
        assert_eq!(error(&result), "incorrect expression starting from \"not 1\"");

        for op in ["*", "/", "+", "-", "=", "<>", "<", ">"] {
            for source in [
                format!("last(/host/key,1){}not 1", op),
                format!("last(/host/key,1) {}not 1", op),
            ] {
                let result = parse(&source);
                assert_eq!(result.status(), ParseStatus::SuccessContinue, "{:?}", source);
                assert_eq!(result.get_match(), "last(/host/key,1)", "{:?}", source);
            }
            assert!(parse(&format!("last(/host/key,1) {} not 1", op)).is_success(), "{}", op);
        }
        assert!(parse("last(/host/key,1) and not 1").is_success());
        assert!(parse("max(1,not 1)").is_success());
    }

    #[test]
    fn test_macro_gating() {
        let result = parse("{$USERMACRO}=1");
        assert!(result.is_fail());
        assert_eq!(error(&result), "incorrect expression starting from \"{$USERMACRO}=1\"");

        let options = ExpressionOptions {
            usermacros: true,
            lldmacros: true,
            ..ExpressionOptions::default()
        };
        assert!(parse_with("{$USERMACRO}=1", options.clone()).is_success());
        assert!(parse_with("{#LLD} + {{#LLD}.regsub(\"^a\", \\1)}", options).is_success());

        let result = parse("not ({$USERMACRO})");
        assert_eq!(error(&result), "incorrect expression starting from \"{$USERMACRO})\"");

        for source in ["not({$USERMACRO})", "not(-{$USERMACRO})"] {
            let result = parse(source);
            assert!(result.is_fail(), "{:?}", source);
            assert_eq!(
                error(&result),
                "incorrect expression starting from \"{$USERMACRO})\"",
                "{:?}",
                source
            );
        }
    }

    #[test]
    fn test_groups() {
        for source in ["(last(/host/key))", " ( ( ( last(/host/key) ) ) ) ", "(15 - 5.25 - 1)=last(/host/key)"] {
            assert!(parse(source).is_success(), "{:?}", source);
        }
        for source in ["(last(/host/key)", "()0=( last(/host/key) )", "(0+)=last(/host/key)", "last((/host/key))=0"] {
            assert!(parse(source).is_fail(), "{:?}", source);
        }

        let result = parse("((last(/host/key)) * 1w) / (1d * (last(/host/key))");
        assert_eq!(result.get_match(), "((last(/host/key)) * 1w)");
        assert_eq!(error(&result), "incorrect expression starting from \"\"");

        let result = parse("((last(/host/key)) * 1w) / 1Ks");
        assert_eq!(result.get_match(), "((last(/host/key)) * 1w) / 1K");
        assert_eq!(error(&result), "incorrect expression starting from \"s\"");
    }

    #[test]
    fn test_hist_function_params() {
        let result = parse("func(/host/key, #25:now/M, \"eq\", \"str\")");
        assert!(result.is_success());
        let TokenKind::HistFunction { function, parameters } = &result.data()[0].kind else {
            panic!("expected a history function");
        };
        assert_eq!(function, "func");
        assert_eq!(parameters.len(), 4);
        assert_eq!(parameters[1].pos, 16);
        assert_eq!(
            parameters[1].kind,
            HistParamKind::Period {
                sec_num: "#25".into(),
                time_shift: "now/M".into()
            }
        );
        assert_eq!(parameters[2].kind, HistParamKind::Quoted);

        for source in [
            "avg(/host/item,1h:now/h-1d) > 0",
            "forecast(/host/item,30m:now-1d,600s,,\"avg\") > 0",
            "count(/host/key[a,,\"b\",,[c,d,,\"e\",],,[f]],1,,\"b\",3)",
        ] {
            assert!(parse(source).is_success(), "{:?}", source);
        }
        for source in ["last(/host)", "last(/host/,)", "last(/host//)", "last(/host/key,1.23)"] {
            assert!(parse(source).is_fail(), "{:?}", source);
        }
    }

    #[test]
    fn test_hist_params_allow_only_spaces() {
        assert!(parse("count( /host/key , 1 , \"\" )=0").is_success());

        for source in [
            "count(/host/key,1,\"\"\t)=0",
            "count(/host/key,\n1,\"\")=0",
            "count(/host/key\r,1)=0",
            "count(/host/key,1\t,\"\")=0",
            "count(\t/host/key,1)=0",
        ] {
            assert!(parse(source).is_fail(), "{:?}", source);
        }
    }

    #[test]
    fn test_math_function_params() {
        let result = parse("min( last(/host/key), 123, \"abc\" , min(min(/host/key, 1d:now/d), 125) + 10 )");
        assert!(result.is_success());
        let TokenKind::MathFunction { parameters, .. } = &result.data()[0].kind else {
            panic!("expected a math function");
        };
        assert_eq!(parameters.len(), 4);
        assert_eq!(parameters[0].pos, 5);
        assert_eq!(parameters[0].matched, "last(/host/key)");
        assert_eq!(parameters[3].matched, "min(min(/host/key, 1d:now/d), 125) + 10");

        assert!(parse("now()").is_success());
        assert!(parse("now(0)").is_success());
        assert!(parse("now(0,)").is_fail());
    }

    #[test]
    fn test_calculated_dialect() {
        let options = ExpressionOptions {
            calculated: true,
            ..ExpressionOptions::default()
        };
        let result = parse_with("last(/*/agent.ping) = {TRIGGER.VALUE}", options.clone());
        assert_eq!(result.get_match(), "last(/*/agent.ping)");
        assert_eq!(error(&result), "incorrect expression starting from \"{TRIGGER.VALUE}\"");

        let source = r#"last(/host2/*?[group = "Zabbix servers" and (tag = {$MACRO} or tag = "tag2")]) = 1"#;
        let result = parse_with(source, options.clone());
        assert!(result.is_fail());

        let options = ExpressionOptions {
            usermacros: true,
            ..options
        };
        assert!(parse_with(source, options).is_success());
    }

    #[test]
    fn test_collapsed_expression() {
        let options = ExpressionOptions {
            collapsed_expression: true,
            ..ExpressionOptions::default()
        };
        assert!(parse_with("func(/host/key)", options.clone()).is_fail());
        assert!(parse_with("{123}", options.clone()).is_success());
        assert_eq!(
            parse_with("{123} = {$MACRO}", options).status(),
            ParseStatus::SuccessContinue
        );
    }

    #[test]
    fn test_token_positions() {
        let result = parse("((-12 + 1)) = 1K");
        let tokens = result.data();
        let summary: Vec<_> = tokens.iter().map(|t| (t.pos, t.matched.as_str())).collect();
        assert_eq!(
            summary,
            vec![(0, "("), (1, "("), (2, "-"), (3, "12"), (6, "+"), (8, "1"), (9, ")"), (10, ")"), (12, "="), (14, "1K")]
        );
        assert_eq!(tokens[9].kind, TokenKind::Number { suffix: Some('K') });
    }

    #[test]
    fn test_expression_macro() {
        let parser = ExpressionMacroParser::default();
        let result = parser.parse("{?last(/host/key) * 2} rest", 0);
        assert_eq!(result.status(), ParseStatus::SuccessContinue);
        assert_eq!(result.get_match(), "{?last(/host/key) * 2}");
        assert_eq!(result.data().expression, "last(/host/key) * 2");
        assert_eq!(result.data().tokens.len(), 3);

        let result = parser.parse("{?{?1+1}*2}", 0);
        assert!(result.is_success());
        assert_eq!(result.data().tokens[0].kind, TokenKind::ExpressionMacro);

        assert!(parser.parse("{?last(/host/key) + }", 0).is_fail());
        assert!(parser.parse("{?1+1", 0).is_fail());
        assert!(parser.parse("{?{$M}}", 0).is_fail());

        let parser = ExpressionMacroParser::new(ExpressionMacroOptions {
            usermacros: true,
            host_macro: true,
            ..ExpressionMacroOptions::default()
        });
        assert!(parser.parse("{?{$M} + last(/{HOST.HOST}/key)}", 0).is_success());
    }
}
