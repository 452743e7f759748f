//! Boolean Formulas
//!
//! One precedence-climbing engine drives two grammars:
//!
//! - [`ConditionFormulaParser`]: operands are `[A-Z]+` constants
//! - [`FilterParser`]: operands are `key = "value"` / `key <> "value"` pairs
//!
//! `not` binds tighter than `and`, which binds tighter than `or`; both binary
//! operators are left-associative. Keywords are lowercase only, so `AND` and
//! `NOT` are ordinary constants.
//!
//! # Example
//!
//! ```rust
//! use monexpr::parsers::{ConditionFormulaParser, TokenParser};
//!
//! let result = ConditionFormulaParser::new().parse("A and not B or C", 0);
//! let constants: Vec<_> = result
//!     .data()
//!     .constants
//!     .iter()
//!     .map(|c| (c.value.as_str(), c.pos))
//!     .collect();
//!
//! assert!(result.is_success());
//! assert_eq!(constants, vec![("A", 0), ("B", 10), ("C", 15)]);
//! ```

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::error::ParseError;
use super::macros::{scan_lld_macro, scan_macro_function, scan_user_macro, Receivers, UserMacroOptions};
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, unquote, Scanner};

/// Binary boolean operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    /// `and`
    And,
    /// `or`
    Or,
}

impl BoolOp {
    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BoolOp::And => 2,
            BoolOp::Or => 1,
        }
    }

    /// Source keyword
    pub fn keyword(self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

/// Structure of a formula; parentheses leave no node of their own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaNode {
    /// Index into the formula's operands, in source order
    Operand {
        /// Operand index
        index: usize,
    },
    /// `not x`
    Not {
        /// Negated sub-formula
        operand: Box<FormulaNode>,
    },
    /// `lhs op rhs`
    Binary {
        /// Operator
        op: BoolOp,
        /// Left side
        lhs: Box<FormulaNode>,
        /// Right side
        rhs: Box<FormulaNode>,
    },
}

impl FormulaNode {
    /// Fully parenthesised rendering using `names` for operands
    pub fn canonical(&self, names: &[&str]) -> String {
        match self {
            FormulaNode::Operand { index } => names.get(*index).copied().unwrap_or("?").to_string(),
            FormulaNode::Not { operand } => format!("(not {})", operand.canonical(names)),
            FormulaNode::Binary { op, lhs, rhs } => format!(
                "({} {} {})",
                lhs.canonical(names),
                op.keyword(),
                rhs.canonical(names)
            ),
        }
    }
}

/// Kind of a formula token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaTokenKind {
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `and`, `or`, `not`
    Operator,
    /// Grammar-specific operand
    Operand,
}

/// One token of a formula, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaToken<O> {
    /// Token kind
    #[serde(rename = "type")]
    pub kind: FormulaTokenKind,
    /// Byte offset
    pub pos: usize,
    /// Length in bytes
    pub length: usize,
    /// Token text
    #[serde(rename = "match")]
    pub matched: String,
    /// Operand fields, for [`FormulaTokenKind::Operand`] only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operand: Option<O>,
}

/// Tokens plus tree of a recognised formula
pub(crate) struct Formula<O> {
    pub(crate) tokens: Vec<FormulaToken<O>>,
    pub(crate) tree: FormulaNode,
}

struct FormulaScan<O, F> {
    operand: F,
    tokens: Vec<FormulaToken<O>>,
}

impl<O, F> FormulaScan<O, F>
where
    F: FnMut(&mut Scanner<'_>, usize) -> Option<(usize, O)>,
{
    fn push(&mut self, sc: &Scanner<'_>, kind: FormulaTokenKind, start: usize, end: usize, operand: Option<O>) {
        self.tokens.push(FormulaToken {
            kind,
            pos: start,
            length: end - start,
            matched: sc.slice(start, end).to_string(),
            operand,
        });
    }

    fn operand_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| t.kind == FormulaTokenKind::Operand)
            .count()
    }

    /// `lhs (op rhs)*` with operators of at least `min_prec`
    fn expr(&mut self, sc: &mut Scanner<'_>, pos: usize, min_prec: u8) -> Option<(usize, FormulaNode)> {
        let (mut end, mut lhs) = self.unary(sc, pos)?;

        loop {
            let Some((op, op_start, op_end)) = binop(sc, end) else {
                break;
            };
            if op.precedence() < min_prec {
                break;
            }

            let mark = self.tokens.len();
            self.push(sc, FormulaTokenKind::Operator, op_start, op_end, None);

            let rhs_start = sc.skip_spaces(op_end);
            match self.expr(sc, rhs_start, op.precedence() + 1) {
                Some((rhs_end, rhs)) => {
                    lhs = FormulaNode::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    end = rhs_end;
                }
                None => {
                    self.tokens.truncate(mark);
                    break;
                }
            }
        }

        Some((end, lhs))
    }

    fn unary(&mut self, sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, FormulaNode)> {
        let mark = self.tokens.len();

        if sc.starts_with(pos, "not") && (sc.is(pos + 3, b' ') || sc.is(pos + 3, b'(')) {
            self.push(sc, FormulaTokenKind::Operator, pos, pos + 3, None);
            let inner_start = sc.skip_spaces(pos + 3);
            let result = sc.nested(|sc| self.unary(sc, inner_start));
            return match result {
                Some((end, operand)) => Some((
                    end,
                    FormulaNode::Not {
                        operand: Box::new(operand),
                    },
                )),
                None => {
                    self.tokens.truncate(mark);
                    None
                }
            };
        }

        if sc.is(pos, b'(') {
            self.push(sc, FormulaTokenKind::OpenParen, pos, pos + 1, None);
            let inner_start = sc.skip_spaces(pos + 1);
            let result = sc.nested(|sc| self.expr(sc, inner_start, 0));
            if let Some((inner_end, node)) = result {
                let close = sc.skip_spaces(inner_end);
                if sc.is(close, b')') {
                    self.push(sc, FormulaTokenKind::CloseParen, close, close + 1, None);
                    return Some((close + 1, node));
                }
            }
            self.tokens.truncate(mark);
            return None;
        }

        let index = self.operand_count();
        let (end, value) = (self.operand)(sc, pos)?;
        self.push(sc, FormulaTokenKind::Operand, pos, end, Some(value));
        Some((end, FormulaNode::Operand { index }))
    }
}

/// Binary keyword after `end`: whitespace or `)` before it, whitespace or `(` after
fn binop(sc: &Scanner<'_>, end: usize) -> Option<(BoolOp, usize, usize)> {
    let start = sc.skip_spaces(end);
    if start == end && !(end > 0 && sc.is(end - 1, b')')) {
        return None;
    }
    let op = if sc.starts_with(start, "and") {
        BoolOp::And
    } else if sc.starts_with(start, "or") {
        BoolOp::Or
    } else {
        return None;
    };
    let op_end = start + op.keyword().len();
    if !(sc.is(op_end, b' ') || sc.is(op_end, b'(')) {
        return None;
    }
    Some((op, start, op_end))
}

/// Formula starting at `pos`; trailing spaces are kept only up to the end of input
pub(crate) fn scan_formula<O, F>(sc: &mut Scanner<'_>, pos: usize, operand: F) -> Option<(usize, Formula<O>)>
where
    F: FnMut(&mut Scanner<'_>, usize) -> Option<(usize, O)>,
{
    let mut scan = FormulaScan {
        operand,
        tokens: Vec::new(),
    };
    let start = sc.skip_spaces(pos);
    let (mut end, tree) = scan.expr(sc, start, 0)?;

    let trailing = sc.skip_spaces(end);
    if trailing == sc.len() {
        end = trailing;
    }

    Some((
        end,
        Formula {
            tokens: scan.tokens,
            tree,
        },
    ))
}

/// Diagnostic for a formula that stops short of the end of input
fn report_stop(sc: &mut Scanner<'_>, stop: usize) {
    let at = sc.skip_spaces(stop);
    if at < sc.len() {
        sc.report(ParseError::unexpected("incorrect formula", at));
    }
}

// ============================================================================
// Condition formulas
// ============================================================================

/// A constant operand and its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constant {
    /// Constant text
    pub value: String,
    /// Byte offset
    pub pos: usize,
}

/// A recognised condition formula
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionFormula {
    /// Constants in source order, duplicates included
    pub constants: Vec<Constant>,
    /// Token stream
    pub tokens: Vec<FormulaToken<()>>,
    /// Structure, absent on failure
    pub tree: Option<FormulaNode>,
}

impl ConditionFormula {
    /// Constant names, first occurrence only
    pub fn distinct_constants(&self) -> Vec<&str> {
        let mut seen = HashSet::with_capacity(self.constants.len());
        self.constants
            .iter()
            .map(|c| c.value.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// `A and (B or not C)`
#[derive(Debug, Clone, Default)]
pub struct ConditionFormulaParser {
    config: ParserConfig,
}

impl ConditionFormulaParser {
    /// Create a condition formula parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

fn scan_constant(sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, ())> {
    let end = sc.skip_while(pos, CharClass::Upper);
    (end > pos).then_some((end, ()))
}

impl TokenParser for ConditionFormulaParser {
    type Output = ConditionFormula;

    fn parse(&self, source: &str, pos: usize) -> Parsed<ConditionFormula> {
        run(source, pos, &self.config, |sc, pos| {
            let result = scan_formula(sc, pos, scan_constant);
            report_stop(sc, result.as_ref().map_or(pos, |(end, _)| *end));
            let (end, formula) = result?;

            let constants = formula
                .tokens
                .iter()
                .filter(|t| t.kind == FormulaTokenKind::Operand)
                .map(|t| Constant {
                    value: t.matched.clone(),
                    pos: t.pos,
                })
                .collect();

            Some((
                end,
                ConditionFormula {
                    constants,
                    tokens: formula.tokens,
                    tree: Some(formula.tree),
                },
            ))
        })
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Options for [`FilterParser`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Allowed attribute keys
    pub keys: Vec<String>,
    /// Accept `{$NAME}` values
    pub usermacros: bool,
    /// Accept `{#NAME}` and `{{#NAME}.func()}` values
    pub lldmacros: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            keys: vec!["group".to_string(), "tag".to_string()],
            usermacros: false,
            lldmacros: false,
        }
    }
}

/// Kind of a filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValueKind {
    /// `"..."`
    #[default]
    String,
    /// `{$NAME}`
    UserMacro,
    /// `{#NAME}`
    LldMacro,
    /// `{{#NAME}.func()}`
    LldMacroFunction,
}

/// `key op value` operand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    /// Attribute key
    pub key: String,
    /// `=` or `<>`
    pub operator: String,
    /// Value as written
    pub value: String,
    /// Value grammar
    pub value_kind: FilterValueKind,
}

impl KeyValue {
    /// Value with quotes and escapes removed; macros are returned as written
    pub fn unquoted_value(&self) -> String {
        match self.value_kind {
            FilterValueKind::String => unquote(&self.value),
            _ => self.value.clone(),
        }
    }
}

/// A recognised filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    /// Token stream
    pub tokens: Vec<FormulaToken<KeyValue>>,
    /// Structure, absent on failure
    pub tree: Option<FormulaNode>,
}

fn scan_filter_value(
    sc: &mut Scanner<'_>,
    pos: usize,
    options: &FilterOptions,
) -> Option<(usize, FilterValueKind)> {
    if let Some(end) = sc.quoted(pos) {
        return Some((end, FilterValueKind::String));
    }
    if options.usermacros {
        if let Some((end, _)) = scan_user_macro(sc, pos, &UserMacroOptions::default()) {
            return Some((end, FilterValueKind::UserMacro));
        }
    }
    if options.lldmacros {
        if let Some((end, _)) = scan_lld_macro(sc, pos) {
            return Some((end, FilterValueKind::LldMacro));
        }
        let receivers = Receivers {
            lld: true,
            ..Receivers::NONE
        };
        if let Some((end, _)) = scan_macro_function(sc, pos, &receivers) {
            return Some((end, FilterValueKind::LldMacroFunction));
        }
    }
    None
}

fn scan_key_value(
    sc: &mut Scanner<'_>,
    pos: usize,
    options: &FilterOptions,
) -> Option<(usize, KeyValue)> {
    let key = options.keys.iter().find(|key| {
        sc.starts_with(pos, key) && !sc.is_class(pos + key.len(), CharClass::Identifier)
    })?;

    let op_start = sc.skip_spaces(pos + key.len());
    let operator = if sc.starts_with(op_start, "<>") {
        "<>"
    } else if sc.is(op_start, b'=') {
        "="
    } else {
        return None;
    };

    let value_start = sc.skip_spaces(op_start + operator.len());
    let (end, value_kind) = scan_filter_value(sc, value_start, options)?;

    Some((
        end,
        KeyValue {
            key: key.clone(),
            operator: operator.to_string(),
            value: sc.slice(value_start, end).to_string(),
            value_kind,
        },
    ))
}

pub(crate) fn scan_filter(
    sc: &mut Scanner<'_>,
    pos: usize,
    options: &FilterOptions,
) -> Option<(usize, Filter)> {
    let (end, formula) = scan_formula(sc, pos, |sc, p| scan_key_value(sc, p, options))?;
    Some((
        end,
        Filter {
            tokens: formula.tokens,
            tree: Some(formula.tree),
        },
    ))
}

/// `group = "Linux servers" and not tag <> "x"`
#[derive(Debug, Clone, Default)]
pub struct FilterParser {
    options: FilterOptions,
    config: ParserConfig,
}

impl FilterParser {
    /// Create a filter parser
    pub fn new(options: FilterOptions) -> Self {
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

impl TokenParser for FilterParser {
    type Output = Filter;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Filter> {
        run(source, pos, &self.config, |sc, pos| {
            let result = scan_filter(sc, pos, &self.options);
            report_stop(sc, result.as_ref().map_or(pos, |(end, _)| *end));
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::protocol::ParseStatus;

    fn tree(source: &str) -> FormulaNode {
        ConditionFormulaParser::new()
            .parse(source, 0)
            .into_data()
            .tree
            .expect("formula should parse")
    }

    #[test]
    fn test_condition_constants_in_order() {
        let result = ConditionFormulaParser::new().parse("A and B or A", 0);
        assert!(result.is_success());
        let values: Vec<_> = result.data().constants.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["A", "B", "A"]);
        assert_eq!(result.data().distinct_constants(), vec!["A", "B"]);
    }

    #[test]
    fn test_condition_precedence() {
        assert_eq!(tree("A and not B or C"), tree("(A and (not B)) or C"));
        assert_eq!(tree("A or B and C"), tree("A or (B and C)"));
        assert_eq!(tree("A and B and C"), tree("(A and B) and C"));
        assert_eq!(
            tree("not A or B").canonical(&["A", "B"]),
            "((not A) or B)"
        );
    }

    #[test]
    fn test_condition_uppercase_keywords_are_constants() {
        let result = ConditionFormulaParser::new().parse("A and NOT and B", 0);
        assert!(result.is_success());
        let values: Vec<_> = result.data().constants.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["A", "NOT", "B"]);
    }

    #[test]
    fn test_condition_boundaries() {
        let parser = ConditionFormulaParser::new();
        assert!(parser.parse("A and(B)", 0).is_success());
        assert!(parser.parse("(A)and B", 0).is_success());
        assert!(parser.parse("not(A)", 0).is_success());

        let result = parser.parse("AandB", 0);
        assert_eq!(result.status(), ParseStatus::SuccessContinue);
        assert_eq!(result.get_match(), "A");
        assert_eq!(result.error().and_then(|e| e.position()), Some(1));
    }

    #[test]
    fn test_condition_dangling_operator_truncates() {
        let result = ConditionFormulaParser::new().parse("A and B or", 0);
        assert_eq!(result.status(), ParseStatus::SuccessContinue);
        assert_eq!(result.get_match(), "A and B");
        assert_eq!(result.data().tokens.len(), 3);
    }

    #[test]
    fn test_condition_failures() {
        let parser = ConditionFormulaParser::new();
        for source in ["", "(A", "not", "and A", "a", "(A or)"] {
            assert!(parser.parse(source, 0).is_fail(), "{:?}", source);
        }
    }

    #[test]
    fn test_filter_tokens() {
        let result = FilterParser::default().parse(r#"group = "Linux" and not tag<>"x""#, 0);
        assert!(result.is_success());

        let kinds: Vec<_> = result.data().tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FormulaTokenKind::Operand,
                FormulaTokenKind::Operator,
                FormulaTokenKind::Operator,
                FormulaTokenKind::Operand,
            ]
        );
        let last = result.data().tokens[3].operand.as_ref().unwrap();
        assert_eq!(last.key, "tag");
        assert_eq!(last.operator, "<>");
        assert_eq!(last.unquoted_value(), "x");
    }

    #[test]
    fn test_filter_key_allow_list() {
        assert!(FilterParser::default().parse(r#"host = "a""#, 0).is_fail());
        assert!(FilterParser::default().parse(r#"groups = "a""#, 0).is_fail());

        let parser = FilterParser::new(FilterOptions {
            keys: vec!["host".into()],
            ..FilterOptions::default()
        });
        assert!(parser.parse(r#"host = "a""#, 0).is_success());
    }

    #[test]
    fn test_filter_macro_values() {
        let source = "tag = {$TAG} or group = {#GROUP} or group = {{#G}.regsub(a, b)}";
        assert!(FilterParser::default().parse(source, 0).is_fail());

        let parser = FilterParser::new(FilterOptions {
            usermacros: true,
            lldmacros: true,
            ..FilterOptions::default()
        });
        let result = parser.parse(source, 0);
        assert!(result.is_success());
        let kinds: Vec<_> = result
            .data()
            .tokens
            .iter()
            .filter_map(|t| t.operand.as_ref().map(|o| o.value_kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                FilterValueKind::UserMacro,
                FilterValueKind::LldMacro,
                FilterValueKind::LldMacroFunction
            ]
        );
    }
}
