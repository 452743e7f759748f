//! Token parsers for monitoring configuration strings
//!
//! Every parser implements [`TokenParser`]: it is configured once, then
//! `parse(source, pos)` recognises one token starting at byte offset `pos`
//! and returns an immutable [`Parsed`] value (status, span, matched text,
//! derived fields and an optional diagnostic).
//!
//! # Module Organization
//!
//! ## Protocol
//! - [`protocol`] - [`ParseStatus`], [`Parsed`], [`TokenParser`]
//! - [`error`] - [`ParseError`] diagnostics
//! - [`config`] - [`ParserConfig`] resource limits
//! - [`char_class`] - byte class lookup tables
//!
//! ## Primitives
//! - [`number`] - numbers, ports, function ids
//! - [`ip`] - IPv4, IPv6, DNS names
//! - [`date`] - absolute dates
//! - [`escaped`] - backslash-escaped text
//!
//! ## Macros and references
//! - [`macros`] - built-in, user, discovery macros and macro functions
//! - [`function_params`] - item keys and function calls
//! - [`query`] - `/host/key` queries and `{host:key.func()}` references
//! - [`expression`] - trigger expressions and `{?expr}` macros
//!
//! ## Formulas, rules and schedules
//! - [`formula`] - condition formulas and filters
//! - [`validation`] - validation-rule strings
//! - [`time`] - time periods and update intervals
//! - [`names`] - host, event and Active Directory names

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

// ============================================================================
// Module Declarations
// ============================================================================

pub mod char_class;
pub mod config;
pub mod date;
pub mod error;
pub mod escaped;
pub mod expression;
pub mod formula;
pub mod function_params;
pub mod ip;
pub mod macros;
pub mod names;
pub mod number;
pub mod protocol;
pub mod query;
pub mod time;
pub mod validation;

mod scan;

// ============================================================================
// Protocol
// ============================================================================

pub use config::{ParserConfig, DEFAULT_MAX_INPUT_SIZE, DEFAULT_MAX_RECURSION_DEPTH};
pub use error::ParseError;
pub use protocol::{ParseSpan, ParseStatus, Parsed, TokenParser};

// ============================================================================
// Character Classes
// ============================================================================

pub use char_class::{CharClass, CharClassTables, CHAR_CLASSES};

// ============================================================================
// Primitives
// ============================================================================

pub use date::{
    AbsoluteTime, AbsoluteTimeOptions, AbsoluteTimeParser, DatePrecision, ZBX_MAX_DATE,
    ZBX_MIN_DATE,
};
pub use escaped::{EscapedStringOptions, EscapedStringParser};
pub use ip::{
    DnsName, DnsOptions, DnsParser, IpAddress, IpOptions, IpParser, Ipv4Parser, Ipv6Parser,
};
pub use number::{
    suffix_multiplier, FunctionIdParser, Number, NumberOptions, NumberParser, PortOptions,
    PortParser, PortRange, PortRangeParser, ZBX_DB_MAX_ID, ZBX_MAX_PORT_NUMBER,
    ZBX_MIN_PORT_NUMBER,
};

// ============================================================================
// Macros
// ============================================================================

pub use macros::{
    LldMacro, LldMacroParser, Macro, MacroFunction, MacroFunctionOptions, MacroFunctionParser,
    MacroKind, MacroOptions, MacroParser, MacroRef, UserMacro, UserMacroOptions, UserMacroParser,
};

// ============================================================================
// Item Keys, Functions and Queries
// ============================================================================

pub use function_params::{
    FunctionCall, FunctionParser, ItemKey, ItemKeyParser, ParamKind, ParamNode,
};
pub use query::{FunctionMacro, FunctionMacroParser, Query, QueryFilter, QueryOptions, QueryParser};

// ============================================================================
// Expressions
// ============================================================================

pub use expression::{
    ExpressionMacro, ExpressionMacroOptions, ExpressionMacroParser, ExpressionOptions,
    ExpressionParser, HistParam, HistParamKind, Token, TokenKind,
};

// ============================================================================
// Boolean Formulas
// ============================================================================

pub use formula::{
    BoolOp, ConditionFormula, ConditionFormulaParser, Constant, Filter, FilterOptions,
    FilterParser, FilterValueKind, FormulaNode, FormulaToken, FormulaTokenKind, KeyValue,
};

// ============================================================================
// Validation Rules
// ============================================================================

pub use validation::{RuleValue, TimeRange, ValidationRuleParser, ValidationRules};

// ============================================================================
// Time Periods and Intervals
// ============================================================================

pub use time::{
    CustomInterval, FlexibleInterval, FlexibleIntervalParser, IntervalOptions, ScheduleFilter,
    ScheduleRange, ScheduleUnit, SchedulingInterval, SchedulingIntervalParser, SimpleInterval,
    SimpleIntervalParser, TimePeriod, TimePeriodParser, TimePeriodPart, TimePeriods,
    TimePeriodsParser, UpdateInterval, UpdateIntervalParser, FLEXIBLE_INTERVAL_MAX_LEN,
    SEC_PER_DAY,
};

// ============================================================================
// Names
// ============================================================================

pub use names::{
    AdName, AdNameOptions, AdNameParser, AdNameType, EventName, EventNameParser, HostName,
    HostNameOptions, HostNameParser,
};
