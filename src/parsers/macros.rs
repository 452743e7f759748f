//! Macro references
//!
//! - `{#NAME}` discovery macros ([`LldMacroParser`])
//! - `{$NAME}` / `{$NAME:context}` user macros ([`UserMacroParser`])
//! - `{NAME}` / `{NAME<n>}` built-in macros from a caller-supplied set ([`MacroParser`])
//! - `{<macro>.func(params)}` compositions ([`MacroFunctionParser`])
//!
//! # Example
//!
//! ```rust
//! use monexpr::parsers::{TokenParser, UserMacroOptions, UserMacroParser};
//!
//! let parser = UserMacroParser::new(UserMacroOptions::default());
//! let result = parser.parse(r#"{$PORT:"eth0"}"#, 0);
//!
//! assert!(result.is_success());
//! assert_eq!(result.data().name, "PORT");
//! assert_eq!(result.data().context.as_deref(), Some("eth0"));
//! ```

use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::expression::{scan_expression_macro, ExpressionOptions};
use super::function_params::{scan_function_call, FunctionCall};
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

/// Which macro grammar recognised a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroKind {
    /// `{NAME}` from a known set
    #[default]
    Builtin,
    /// `{$NAME}`
    User,
    /// `{#NAME}`
    Lld,
    /// `{?expr}`
    Expression,
    /// `{<macro>.func(params)}`
    Function,
}

/// A macro span found inside larger text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroRef {
    /// Grammar that matched
    pub kind: MacroKind,
    /// Byte offset of the opening brace
    pub pos: usize,
    /// Length in bytes
    pub length: usize,
    /// Matched text
    #[serde(rename = "match")]
    pub matched: String,
}

// ============================================================================
// Discovery macros
// ============================================================================

/// A `{#NAME}` macro
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LldMacro {
    /// Name without the `{#` `}` wrapper
    pub name: String,
}

pub(crate) fn scan_lld_macro(sc: &Scanner<'_>, pos: usize) -> Option<(usize, LldMacro)> {
    if !sc.starts_with(pos, "{#") || !sc.is_class(pos + 2, CharClass::Upper) {
        return None;
    }
    let end = sc.skip_while(pos + 2, CharClass::MacroName);
    if !sc.is(end, b'}') {
        return None;
    }
    Some((
        end + 1,
        LldMacro {
            name: sc.slice(pos + 2, end).to_string(),
        },
    ))
}

/// `{#` + `[A-Z][A-Z0-9_.]*` + `}`
#[derive(Debug, Clone, Default)]
pub struct LldMacroParser {
    config: ParserConfig,
}

impl LldMacroParser {
    /// Create a discovery macro parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for LldMacroParser {
    type Output = LldMacro;

    fn parse(&self, source: &str, pos: usize) -> Parsed<LldMacro> {
        run(source, pos, &self.config, |sc, pos| scan_lld_macro(sc, pos))
    }
}

// ============================================================================
// User macros
// ============================================================================

/// Options for [`UserMacroParser`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserMacroOptions {
    /// Accept a `regex:` context prefix
    pub allow_regex: bool,
}

/// A `{$NAME[:context]}` macro
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserMacro {
    /// Name without the `{$` `}` wrapper
    pub name: String,
    /// Static context, unescaped
    pub context: Option<String>,
    /// Regular expression context, unescaped
    pub regex: Option<String>,
    /// Whether the context was written in double quotes
    pub quoted: bool,
}

/// Quoted context: only `\"` is an escape, other backslashes are literal
fn scan_context_quoted(sc: &Scanner<'_>, pos: usize) -> Option<(usize, String)> {
    let mut value = String::new();
    let mut p = pos + 1;
    loop {
        let next = sc.find_either(p, b'"', b'\\')?;
        value.push_str(sc.slice(p, next));
        if sc.is(next, b'"') {
            return Some((next + 1, value));
        }
        if sc.is(next + 1, b'"') {
            value.push('"');
            p = next + 2;
        } else {
            value.push('\\');
            p = next + 1;
        }
    }
}

pub(crate) fn scan_user_macro(
    sc: &Scanner<'_>,
    pos: usize,
    options: &UserMacroOptions,
) -> Option<(usize, UserMacro)> {
    if !sc.starts_with(pos, "{$") {
        return None;
    }
    let name_end = sc.skip_while(pos + 2, CharClass::MacroName);
    if name_end == pos + 2 {
        return None;
    }
    let mut data = UserMacro {
        name: sc.slice(pos + 2, name_end).to_string(),
        ..UserMacro::default()
    };

    match sc.at(name_end)? {
        b'}' => return Some((name_end + 1, data)),
        b':' => {}
        _ => return None,
    }

    let mut p = sc.skip_spaces(name_end + 1);
    let is_regex = options.allow_regex && sc.starts_with(p, "regex:");
    if is_regex {
        p += "regex:".len();
    }

    let (end, value) = if sc.is(p, b'"') {
        let (after, value) = scan_context_quoted(sc, p)?;
        data.quoted = true;
        let close = sc.skip_spaces(after);
        if !sc.is(close, b'}') {
            return None;
        }
        (close + 1, value)
    } else {
        let close = sc.find(p, b'}')?;
        (close + 1, sc.slice(p, close).to_string())
    };

    if is_regex {
        data.regex = Some(value);
    } else {
        data.context = Some(value);
    }
    Some((end, data))
}

/// `{$NAME}` with an optional `:context`
#[derive(Debug, Clone, Default)]
pub struct UserMacroParser {
    options: UserMacroOptions,
    config: ParserConfig,
}

impl UserMacroParser {
    /// Create a user macro parser
    pub fn new(options: UserMacroOptions) -> Self {
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

impl TokenParser for UserMacroParser {
    type Output = UserMacro;

    fn parse(&self, source: &str, pos: usize) -> Parsed<UserMacro> {
        run(source, pos, &self.config, |sc, pos| {
            scan_user_macro(sc, pos, &self.options)
        })
    }
}

// ============================================================================
// Built-in macros
// ============================================================================

/// Options for [`MacroParser`]
///
/// Entries are written with braces, e.g. `{HOST.HOST}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MacroOptions {
    /// Macros accepted as written
    pub macros: Vec<String>,
    /// Macros that also accept a reference index 1-9 (`{HOST.HOST3}`)
    pub macros_n: Vec<String>,
}

/// A built-in macro
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Macro {
    /// Macro name without braces or reference index
    pub macro_name: String,
    /// Reference index for indexed macros
    pub reference: Option<u8>,
}

fn listed<S: AsRef<str>>(list: &[S], body: &str) -> bool {
    list.iter().any(|m| {
        m.as_ref()
            .strip_prefix('{')
            .and_then(|m| m.strip_suffix('}'))
            .is_some_and(|name| name == body)
    })
}

pub(crate) fn scan_builtin_macro<S: AsRef<str>>(
    sc: &Scanner<'_>,
    pos: usize,
    macros: &[S],
    macros_n: &[S],
) -> Option<(usize, Macro)> {
    if macros.is_empty() && macros_n.is_empty() {
        return None;
    }
    if !sc.is(pos, b'{') {
        return None;
    }
    let end = sc.skip_while(pos + 1, CharClass::MacroName);
    if end == pos + 1 || !sc.is(end, b'}') {
        return None;
    }
    let body = sc.slice(pos + 1, end);

    if listed(macros, body) || listed(macros_n, body) {
        return Some((
            end + 1,
            Macro {
                macro_name: body.to_string(),
                reference: None,
            },
        ));
    }

    let (base, index) = body.split_at(body.len() - 1);
    match index.as_bytes()[0] {
        d @ b'1'..=b'9' if listed(macros_n, base) => Some((
            end + 1,
            Macro {
                macro_name: base.to_string(),
                reference: Some(d - b'0'),
            },
        )),
        _ => None,
    }
}

/// `{NAME}` where the macro belongs to a configured set
#[derive(Debug, Clone, Default)]
pub struct MacroParser {
    options: MacroOptions,
    config: ParserConfig,
}

impl MacroParser {
    /// Create a built-in macro parser
    pub fn new(options: MacroOptions) -> Self {
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

impl TokenParser for MacroParser {
    type Output = Macro;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Macro> {
        run(source, pos, &self.config, |sc, pos| {
            scan_builtin_macro(sc, pos, &self.options.macros, &self.options.macros_n)
        })
    }
}

// ============================================================================
// Macro functions
// ============================================================================

/// Options for [`MacroFunctionParser`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MacroFunctionOptions {
    /// Built-in receivers
    pub macros: Vec<String>,
    /// Built-in receivers with a reference index
    pub macros_n: Vec<String>,
    /// Accept `{$NAME}` receivers
    pub usermacros: bool,
    /// Accept `{#NAME}` receivers
    pub lldmacros: bool,
    /// Accept `{?expr}` receivers
    pub expression_macros: bool,
}

impl Default for MacroFunctionOptions {
    fn default() -> Self {
        Self {
            macros: Vec::new(),
            macros_n: Vec::new(),
            usermacros: true,
            lldmacros: true,
            expression_macros: true,
        }
    }
}

/// Receiver grammars tried, in order, inside `{...}.func()`
#[derive(Clone, Copy)]
pub(crate) struct Receivers<'a> {
    pub(crate) macros: &'a [String],
    pub(crate) macros_n: &'a [String],
    pub(crate) user: bool,
    pub(crate) lld: bool,
    pub(crate) expression: Option<&'a ExpressionOptions>,
}

impl Receivers<'static> {
    pub(crate) const NONE: Self = Receivers {
        macros: &[],
        macros_n: &[],
        user: false,
        lld: false,
        expression: None,
    };
}

/// A `{<macro>.func(params)}` composition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MacroFunction {
    /// Kind of the receiver macro
    pub macro_kind: MacroKind,
    /// Receiver text, braces included
    pub receiver: String,
    /// The applied function
    pub function: FunctionCall,
}

fn scan_receiver(
    sc: &mut Scanner<'_>,
    pos: usize,
    receivers: &Receivers<'_>,
) -> Option<(usize, MacroKind)> {
    if let Some((end, _)) = scan_builtin_macro(sc, pos, receivers.macros, receivers.macros_n) {
        return Some((end, MacroKind::Builtin));
    }
    if receivers.user {
        if let Some((end, _)) = scan_user_macro(sc, pos, &UserMacroOptions::default()) {
            return Some((end, MacroKind::User));
        }
    }
    if receivers.lld {
        if let Some((end, _)) = scan_lld_macro(sc, pos) {
            return Some((end, MacroKind::Lld));
        }
    }
    if let Some(options) = receivers.expression {
        if let Some((end, _)) = scan_expression_macro(sc, pos, options) {
            return Some((end, MacroKind::Expression));
        }
    }
    None
}

/// `{` receiver `.` name `(` params `)` `}`; any malformed part fails the lot
pub(crate) fn scan_macro_function(
    sc: &mut Scanner<'_>,
    pos: usize,
    receivers: &Receivers<'_>,
) -> Option<(usize, MacroFunction)> {
    if !sc.is(pos, b'{') {
        return None;
    }
    let (receiver_end, macro_kind) = scan_receiver(sc, pos + 1, receivers)?;
    if !sc.is(receiver_end, b'.') {
        return None;
    }
    let (call_end, function) = scan_function_call(sc, receiver_end + 1)?;
    if !sc.is(call_end, b'}') {
        return None;
    }
    Some((
        call_end + 1,
        MacroFunction {
            macro_kind,
            receiver: sc.slice(pos + 1, receiver_end).to_string(),
            function,
        },
    ))
}

/// `{<macro>.func(params)}`
#[derive(Debug, Clone)]
pub struct MacroFunctionParser {
    options: MacroFunctionOptions,
    expression: ExpressionOptions,
    config: ParserConfig,
}

impl Default for MacroFunctionParser {
    fn default() -> Self {
        Self::new(MacroFunctionOptions::default())
    }
}

impl MacroFunctionParser {
    /// Create a macro function parser
    pub fn new(options: MacroFunctionOptions) -> Self {
        let expression = ExpressionOptions::for_macro(
            options.usermacros,
            options.lldmacros,
            options.macros_n.clone(),
        );
        Self {
            options,
            expression,
            config: ParserConfig::default(),
        }
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    fn receivers(&self) -> Receivers<'_> {
        Receivers {
            macros: &self.options.macros,
            macros_n: &self.options.macros_n,
            user: self.options.usermacros,
            lld: self.options.lldmacros,
            expression: self
                .options
                .expression_macros
                .then_some(&self.expression),
        }
    }
}

impl TokenParser for MacroFunctionParser {
    type Output = MacroFunction;

    fn parse(&self, source: &str, pos: usize) -> Parsed<MacroFunction> {
        let receivers = self.receivers();
        run(source, pos, &self.config, |sc, pos| {
            scan_macro_function(sc, pos, &receivers)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::protocol::ParseStatus;

    #[test]
    fn test_lld_macro() {
        let parser = LldMacroParser::new();
        assert_eq!(parser.parse("{#MACRO.1_X}", 0).status(), ParseStatus::Success);
        assert_eq!(parser.parse("abc{#M}", 3).data().name, "M");
        assert!(parser.parse("{#macro}", 0).is_fail());
        assert!(parser.parse("{#}", 0).is_fail());
        assert!(parser.parse("{#1A}", 0).is_fail());
        assert!(parser.parse("{#A", 0).is_fail());
    }

    #[test]
    fn test_user_macro_contexts() {
        let parser = UserMacroParser::default();

        let result = parser.parse("{$MACRO: ctx value }", 0);
        assert!(result.is_success());
        assert_eq!(result.data().context.as_deref(), Some("ctx value "));
        assert!(!result.data().quoted);

        let result = parser.parse(r#"{$MACRO:"a\"}b" }"#, 0);
        assert!(result.is_success());
        assert_eq!(result.data().context.as_deref(), Some(r#"a"}b"#));
        assert!(result.data().quoted);

        assert!(parser.parse(r#"{$MACRO:"a"b}"#, 0).is_fail());
        assert!(parser.parse("{$}", 0).is_fail());
        assert!(parser.parse("{$macro}", 0).is_fail());
    }

    #[test]
    fn test_user_macro_regex_context() {
        let parser = UserMacroParser::new(UserMacroOptions { allow_regex: true });
        let result = parser.parse("{$M:regex:^[0-9]+$}", 0);
        assert!(result.is_success());
        assert_eq!(result.data().regex.as_deref(), Some("^[0-9]+$"));
        assert!(result.data().context.is_none());

        let plain = UserMacroParser::default().parse("{$M:regex:^a}", 0);
        assert_eq!(plain.data().context.as_deref(), Some("regex:^a"));
    }

    #[test]
    fn test_builtin_macro_sets() {
        let parser = MacroParser::new(MacroOptions {
            macros: vec!["{TRIGGER.VALUE}".into()],
            macros_n: vec!["{HOST.HOST}".into()],
        });

        assert!(parser.parse("{TRIGGER.VALUE}", 0).is_success());
        assert!(parser.parse("{TRIGGER.VALUE2}", 0).is_fail());

        let result = parser.parse("{HOST.HOST3}", 0);
        assert!(result.is_success());
        assert_eq!(result.data().macro_name, "HOST.HOST");
        assert_eq!(result.data().reference, Some(3));

        assert!(parser.parse("{HOST.HOST0}", 0).is_fail());
        assert!(parser.parse("{HOST.NAME}", 0).is_fail());
    }

    #[test]
    fn test_macro_function_receivers() {
        let parser = MacroFunctionParser::new(MacroFunctionOptions {
            macros: vec!["{ITEM.VALUE}".into()],
            ..MacroFunctionOptions::default()
        });

        for source in [
            "{{ITEM.VALUE}.regsub(\"^([0-9]+)\", \\1)}",
            "{{$MACRO}.fmtnum(2)}",
            "{{#LLD}.iregsub(\"a\", b)}",
            "{{?last(/host/key)}.fmtnum(2)}",
        ] {
            assert_eq!(parser.parse(source, 0).status(), ParseStatus::Success, "{}", source);
        }

        let result = parser.parse("{{#LLD}.fmtnum(2)} tail", 0);
        assert_eq!(result.status(), ParseStatus::SuccessContinue);
        assert_eq!(result.data().macro_kind, MacroKind::Lld);
        assert_eq!(result.data().function.function, "fmtnum");
    }

    #[test]
    fn test_macro_function_malformed_suffix_fails_whole() {
        let parser = MacroFunctionParser::default();
        assert!(parser.parse("{{#LLD}.func(\"abc)}", 0).is_fail());
        assert!(parser.parse("{{#LLD}.func()", 0).is_fail());
        assert!(parser.parse("{{#LLD}func()}", 0).is_fail());
        assert!(parser.parse("{{#LLD}.()}", 0).is_fail());
    }
}
