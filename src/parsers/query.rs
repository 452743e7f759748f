//! Item Queries
//!
//! `/host/key[params]` references, plus the legacy `{host:key.func(params)}`
//! function macro.
//!
//! # Example
//!
//! ```rust
//! use monexpr::parsers::{QueryOptions, QueryParser, TokenParser};
//!
//! let parser = QueryParser::new(QueryOptions::default());
//! let result = parser.parse("/Zabbix server/system.cpu.load[all,avg1]", 0);
//!
//! assert!(result.is_success());
//! assert_eq!(result.data().host, "Zabbix server");
//! assert_eq!(result.data().item, "system.cpu.load[all,avg1]");
//! ```

use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::formula::{scan_filter, Filter, FilterOptions};
use super::function_params::{scan_function_call, scan_item_key, FunctionCall, ItemKey};
use super::macros::scan_builtin_macro;
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

const HOST_MACRO: &[&str] = &["{HOST.HOST}"];
const NO_MACROS: &[&str] = &[];

/// Options for [`QueryParser`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Accept `{HOST.HOST}` as the host
    pub host_macro: bool,
    /// Accept `{HOST.HOST}` and `{HOST.HOST1}`..`{HOST.HOST9}` as the host
    pub host_macro_n: bool,
    /// Accept `//key` with no host
    pub empty_host: bool,
    /// Accept `*` wildcards and a `?[filter]` suffix
    pub calculated: bool,
    /// Accept `{$NAME}` values inside the filter
    pub usermacros: bool,
    /// Accept `{#NAME}` values inside the filter
    pub lldmacros: bool,
}

impl QueryOptions {
    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            usermacros: self.usermacros,
            lldmacros: self.lldmacros,
            ..FilterOptions::default()
        }
    }
}

/// A recognised query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    /// Host part, possibly empty or a macro
    pub host: String,
    /// Item part: a key with parameters, or `*`
    pub item: String,
    /// Parsed item key; empty for a `*` item
    pub key: ItemKey,
    /// `?[...]` filter
    pub filter: Option<QueryFilter>,
}

impl Query {
    /// Top-level item key parameter values
    pub fn item_params(&self) -> Vec<String> {
        self.key.param_values()
    }
}

/// Filter suffix of a calculated-item query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryFilter {
    /// `?[...]` as written
    #[serde(rename = "match")]
    pub matched: String,
    /// Parsed filter
    pub filter: Filter,
}

fn scan_host(sc: &Scanner<'_>, pos: usize, options: &QueryOptions) -> Option<usize> {
    if sc.is(pos, b'/') {
        return options.empty_host.then_some(pos);
    }
    if options.calculated && sc.is(pos, b'*') {
        return Some(pos + 1);
    }
    if options.host_macro || options.host_macro_n {
        let indexed = if options.host_macro_n { HOST_MACRO } else { NO_MACROS };
        if let Some((end, _)) = scan_builtin_macro(sc, pos, HOST_MACRO, indexed) {
            return Some(end);
        }
    }
    let end = sc.skip_while(pos, CharClass::HostName);
    (end > pos).then_some(end)
}

pub(crate) fn scan_query(
    sc: &mut Scanner<'_>,
    pos: usize,
    options: &QueryOptions,
) -> Option<(usize, Query)> {
    if !sc.is(pos, b'/') {
        return None;
    }
    let host_start = pos + 1;
    let host_end = scan_host(sc, host_start, options)?;
    if !sc.is(host_end, b'/') {
        return None;
    }

    let item_start = host_end + 1;
    let (mut end, key) = if options.calculated && sc.is(item_start, b'*') {
        (item_start + 1, ItemKey::default())
    } else {
        scan_item_key(sc, item_start)?
    };

    let mut query = Query {
        host: sc.slice(host_start, host_end).to_string(),
        item: sc.slice(item_start, end).to_string(),
        key,
        filter: None,
    };

    if options.calculated && sc.starts_with(end, "?[") {
        let (filter_end, filter) = scan_filter(sc, end + 2, &options.filter_options())?;
        let close = sc.skip_spaces(filter_end);
        if !sc.is(close, b']') {
            return None;
        }
        query.filter = Some(QueryFilter {
            matched: sc.slice(end, close + 1).to_string(),
            filter,
        });
        end = close + 1;
    }

    Some((end, query))
}

/// `/host/key[params]`
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    options: QueryOptions,
    config: ParserConfig,
}

impl QueryParser {
    /// Create a query parser
    pub fn new(options: QueryOptions) -> Self {
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

impl TokenParser for QueryParser {
    type Output = Query;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Query> {
        run(source, pos, &self.config, |sc, pos| {
            scan_query(sc, pos, &self.options)
        })
    }
}

// ============================================================================
// Function macros
// ============================================================================

/// A `{host:key.func(params)}` reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionMacro {
    /// Host name or `{HOST.HOST}`
    pub host: String,
    /// Item key as written
    pub item: String,
    /// Function call text, e.g. `last(#1)`
    pub function: String,
    /// Parsed function call
    pub call: FunctionCall,
}

impl FunctionMacro {
    /// Function name without parameters
    pub fn function_name(&self) -> &str {
        &self.call.function
    }

    /// Raw parameter list including the parentheses
    pub fn params_raw(&self) -> &str {
        self.call.params_raw()
    }
}

/// Item key inside a function macro, returning where the `.func(` part starts
///
/// A key with no parameters swallows the function name (`item.func`), so the
/// split falls back to its last `.`.
fn scan_macro_item(sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, usize)> {
    let (end, key) = scan_item_key(sc, pos)?;
    if sc.is(end, b'.') {
        return Some((end, end + 1));
    }
    if key.params.is_none() && sc.is(end, b'(') {
        let dot = key.key_id.rfind('.')?;
        if dot == 0 {
            return None;
        }
        return Some((pos + dot, pos + dot + 1));
    }
    None
}

pub(crate) fn scan_function_macro(sc: &mut Scanner<'_>, pos: usize) -> Option<(usize, FunctionMacro)> {
    if !sc.is(pos, b'{') {
        return None;
    }
    let host_start = pos + 1;
    let host_end = match scan_builtin_macro(sc, host_start, HOST_MACRO, HOST_MACRO) {
        Some((end, _)) => end,
        None => sc.skip_while(host_start, CharClass::HostName),
    };
    if host_end == host_start || !sc.is(host_end, b':') {
        return None;
    }

    let item_start = host_end + 1;
    let (item_end, function_start) = scan_macro_item(sc, item_start)?;
    let (call_end, call) = scan_function_call(sc, function_start)?;
    if !sc.is(call_end, b'}') {
        return None;
    }

    Some((
        call_end + 1,
        FunctionMacro {
            host: sc.slice(host_start, host_end).to_string(),
            item: sc.slice(item_start, item_end).to_string(),
            function: sc.slice(function_start, call_end).to_string(),
            call,
        },
    ))
}

/// `{host:key.func(params)}`
#[derive(Debug, Clone, Default)]
pub struct FunctionMacroParser {
    config: ParserConfig,
}

impl FunctionMacroParser {
    /// Create a function macro parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for FunctionMacroParser {
    type Output = FunctionMacro;

    fn parse(&self, source: &str, pos: usize) -> Parsed<FunctionMacro> {
        run(source, pos, &self.config, scan_function_macro)
    }
}
