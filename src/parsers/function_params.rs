//! Nested Parameter Lists
//!
//! Two dialects share one recursive scanner:
//!
//! - item keys: `key[a, "b", [c, d]]`, where arrays nest and unquoted
//!   parameters keep their trailing spaces
//! - functions: `name(a, "b", f(x))`, where unquoted parameters are trimmed
//!   on both sides and may contain balanced parentheses
//!
//! Every list becomes a [`ParamNode`] tree that keeps the separator text
//! between children, so [`ParamNode::rebuild`] reproduces the source exactly.

use serde::Serialize;

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, unquote, Scanner};

/// Kind of a parameter node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Bracketed list; the only kind with children
    #[default]
    Array,
    /// `"..."` with `\"` and `\\` escapes
    QuotedString,
    /// Bare run of characters, possibly empty
    UnquotedToken,
}

/// One node of a parameter tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ParamNode {
    /// Node kind
    pub kind: ParamKind,
    /// Exact source text of the node
    pub raw: String,
    /// Byte offset of `raw` in the source
    pub start: usize,
    /// Child nodes (arrays only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParamNode>,
    /// Text around the children: one entry before each child plus a final
    /// entry after the last one (arrays only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub separators: Vec<String>,
}

impl ParamNode {
    fn leaf(kind: ParamKind, raw: &str, start: usize) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            start,
            children: Vec::new(),
            separators: Vec::new(),
        }
    }

    /// Byte offset just past the node
    pub fn end(&self) -> usize {
        self.start + self.raw.len()
    }

    /// Parameter value: unescaped for quoted strings, raw for the rest
    pub fn value(&self) -> String {
        match self.kind {
            ParamKind::QuotedString => unquote(&self.raw),
            _ => self.raw.clone(),
        }
    }

    /// Reassemble the source text from children and separators
    pub fn rebuild(&self) -> String {
        if self.kind != ParamKind::Array {
            return self.raw.clone();
        }
        let mut out = String::with_capacity(self.raw.len());
        for (separator, child) in self.separators.iter().zip(&self.children) {
            out.push_str(separator);
            out.push_str(&child.rebuild());
        }
        if let Some(last) = self.separators.last() {
            if self.separators.len() > self.children.len() {
                out.push_str(last);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    ItemKey,
    Function,
}

impl Dialect {
    fn open(self) -> u8 {
        match self {
            Dialect::ItemKey => b'[',
            Dialect::Function => b'(',
        }
    }

    fn close(self) -> u8 {
        match self {
            Dialect::ItemKey => b']',
            Dialect::Function => b')',
        }
    }
}

/// Unquoted parameter body; returns `(start, end)` of the kept text
fn scan_unquoted(sc: &Scanner<'_>, pos: usize, dialect: Dialect) -> Option<(usize, usize)> {
    match dialect {
        Dialect::ItemKey => {
            let end = sc.skip_bytes(pos, |b| b != b',' && b != b']');
            Some((pos, end))
        }
        Dialect::Function => {
            let mut depth = 0usize;
            let mut p = pos;
            loop {
                match sc.at(p)? {
                    b'(' => depth += 1,
                    b')' if depth == 0 => break,
                    b')' => depth -= 1,
                    b',' if depth == 0 => break,
                    b'"' if depth > 0 => {
                        p = sc.quoted(p)?;
                        continue;
                    }
                    _ => {}
                }
                p += 1;
            }
            let trimmed = sc.slice(pos, p).trim_end_matches(' ').len();
            Some((pos, pos + trimmed))
        }
    }
}

/// Bracketed parameter list starting at `pos`
pub(crate) fn scan_param_list(
    sc: &mut Scanner<'_>,
    pos: usize,
    dialect: Dialect,
) -> Option<(usize, ParamNode)> {
    if !sc.is(pos, dialect.open()) {
        return None;
    }

    sc.nested(|sc| {
        let mut children = Vec::new();
        let mut separators = Vec::new();
        let mut sep_start = pos;
        let mut p = pos + 1;

        if dialect == Dialect::Function {
            let q = sc.skip_spaces(p);
            if sc.is(q, b')') {
                separators.push(sc.slice(pos, q + 1).to_string());
                return Some((q + 1, list_node(sc, pos, q + 1, children, separators)));
            }
        }

        let end = loop {
            let start = sc.skip_spaces(p);
            let node = match sc.at(start) {
                Some(b'"') => {
                    let end = sc.quoted(start)?;
                    ParamNode::leaf(ParamKind::QuotedString, sc.slice(start, end), start)
                }
                Some(b'[') if dialect == Dialect::ItemKey => {
                    scan_param_list(sc, start, Dialect::ItemKey)?.1
                }
                _ => {
                    let (s, e) = scan_unquoted(sc, start, dialect)?;
                    ParamNode::leaf(ParamKind::UnquotedToken, sc.slice(s, e), s)
                }
            };

            let after = sc.skip_spaces(node.end());
            separators.push(sc.slice(sep_start, node.start).to_string());
            sep_start = node.end();
            children.push(node);

            match sc.at(after) {
                Some(b',') => p = after + 1,
                Some(c) if c == dialect.close() => break after + 1,
                _ => return None,
            }
        };

        separators.push(sc.slice(sep_start, end).to_string());
        Some((end, list_node(sc, pos, end, children, separators)))
    })
}

fn list_node(
    sc: &Scanner<'_>,
    start: usize,
    end: usize,
    children: Vec<ParamNode>,
    separators: Vec<String>,
) -> ParamNode {
    ParamNode {
        kind: ParamKind::Array,
        raw: sc.slice(start, end).to_string(),
        start,
        children,
        separators,
    }
}

// ============================================================================
// Item keys
// ============================================================================

/// A parsed item key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemKey {
    /// Key name without parameters
    pub key_id: String,
    /// Bracketed parameter list, when present and well formed
    pub params: Option<ParamNode>,
}

impl ItemKey {
    /// Raw parameter list including brackets, or an empty string
    pub fn params_raw(&self) -> &str {
        self.params.as_ref().map_or("", |p| p.raw.as_str())
    }

    /// Top-level parameter values in order
    pub fn param_values(&self) -> Vec<String> {
        self.params
            .as_ref()
            .map(|p| p.children.iter().map(ParamNode::value).collect())
            .unwrap_or_default()
    }
}

pub(crate) fn scan_item_key(sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, ItemKey)> {
    let name_end = sc.skip_while(pos, CharClass::ItemKey);
    if name_end == pos {
        return None;
    }
    let key_id = sc.slice(pos, name_end).to_string();

    if sc.is(name_end, b'[') {
        if let Some((end, params)) = scan_param_list(sc, name_end, Dialect::ItemKey) {
            return Some((
                end,
                ItemKey {
                    key_id,
                    params: Some(params),
                },
            ));
        }
        log_debug!("item key '{}' has a malformed parameter list", key_id);
    }

    Some((
        name_end,
        ItemKey {
            key_id,
            params: None,
        },
    ))
}

/// `key[params]`
///
/// A malformed parameter list truncates the match to the key name, so the
/// result is `SuccessContinue` rather than `Fail`.
#[derive(Debug, Clone, Default)]
pub struct ItemKeyParser {
    config: ParserConfig,
}

impl ItemKeyParser {
    /// Create an item key parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for ItemKeyParser {
    type Output = ItemKey;

    fn parse(&self, source: &str, pos: usize) -> Parsed<ItemKey> {
        run(source, pos, &self.config, scan_item_key)
    }
}

// ============================================================================
// Function calls
// ============================================================================

/// A parsed `name(params)` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    /// Function name
    pub function: String,
    /// Parameter list including the parentheses
    pub params: ParamNode,
}

impl FunctionCall {
    /// Raw parameter list including the parentheses
    pub fn params_raw(&self) -> &str {
        &self.params.raw
    }

    /// Parameter nodes in order
    pub fn parameters(&self) -> &[ParamNode] {
        &self.params.children
    }

    /// Parameter values in order, quoted ones unescaped
    pub fn param_values(&self) -> Vec<String> {
        self.params.children.iter().map(ParamNode::value).collect()
    }
}

/// Function name followed immediately by its parameter list
pub(crate) fn scan_function_call(sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, FunctionCall)> {
    let name_end = sc.skip_while(pos, CharClass::FunctionName);
    if name_end == pos {
        return None;
    }
    let (end, params) = scan_param_list(sc, name_end, Dialect::Function)?;
    Some((
        end,
        FunctionCall {
            function: sc.slice(pos, name_end).to_string(),
            params,
        },
    ))
}

/// `name(params)`
#[derive(Debug, Clone, Default)]
pub struct FunctionParser {
    config: ParserConfig,
}

impl FunctionParser {
    /// Create a function call parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for FunctionParser {
    type Output = FunctionCall;

    fn parse(&self, source: &str, pos: usize) -> Parsed<FunctionCall> {
        run(source, pos, &self.config, scan_function_call)
    }
}
