//! Prelude module for convenient imports
//!
//! This module re-exports the parse protocol and every parser with its
//! options. Importing it with a wildcard brings them into scope:
//!
//! ```
//! use monexpr::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Protocol
//! - [`TokenParser`] - The uniform `parse(source, pos)` interface
//! - [`Parsed`] - Result of one parse call
//! - [`ParseStatus`] - `Fail`, `Success`, `SuccessContinue`
//! - [`ParseError`] - Diagnostics
//! - [`ParserConfig`] - Resource limits
//!
//! ## Parsers
//! - Primitives: [`NumberParser`], [`PortParser`], [`PortRangeParser`],
//!   [`FunctionIdParser`], [`Ipv4Parser`], [`Ipv6Parser`], [`IpParser`],
//!   [`DnsParser`], [`AbsoluteTimeParser`], [`EscapedStringParser`]
//! - Macros: [`MacroParser`], [`UserMacroParser`], [`LldMacroParser`],
//!   [`MacroFunctionParser`]
//! - References: [`ItemKeyParser`], [`FunctionParser`], [`QueryParser`],
//!   [`FunctionMacroParser`]
//! - Expressions: [`ExpressionParser`], [`ExpressionMacroParser`]
//! - Formulas: [`ConditionFormulaParser`], [`FilterParser`]
//! - Rules: [`ValidationRuleParser`]
//! - Time: [`TimePeriodParser`], [`TimePeriodsParser`],
//!   [`SimpleIntervalParser`], [`FlexibleIntervalParser`],
//!   [`SchedulingIntervalParser`], [`UpdateIntervalParser`]
//! - Names: [`HostNameParser`], [`EventNameParser`], [`AdNameParser`]

// ============================================================================
// Protocol
// ============================================================================

pub use crate::parsers::{ParseError, ParseSpan, ParseStatus, Parsed, ParserConfig, TokenParser};

// ============================================================================
// Primitives
// ============================================================================

pub use crate::parsers::{
    AbsoluteTimeOptions, AbsoluteTimeParser, DnsOptions, DnsParser, EscapedStringOptions,
    EscapedStringParser, FunctionIdParser, IpOptions, IpParser, Ipv4Parser, Ipv6Parser,
    NumberOptions, NumberParser, PortOptions, PortParser, PortRangeParser,
};

// ============================================================================
// Macros and References
// ============================================================================

pub use crate::parsers::{
    FunctionMacroParser, FunctionParser, ItemKeyParser, LldMacroParser, MacroFunctionOptions,
    MacroFunctionParser, MacroKind, MacroOptions, MacroParser, QueryOptions, QueryParser,
    UserMacroOptions, UserMacroParser,
};

// ============================================================================
// Expressions and Formulas
// ============================================================================

pub use crate::parsers::{
    ConditionFormulaParser, ExpressionMacroOptions, ExpressionMacroParser, ExpressionOptions,
    ExpressionParser, FilterOptions, FilterParser, TokenKind,
};

// ============================================================================
// Rules, Time and Names
// ============================================================================

pub use crate::parsers::{
    AdNameOptions, AdNameParser, AdNameType, EventNameParser, FlexibleIntervalParser,
    HostNameOptions, HostNameParser, IntervalOptions, SchedulingIntervalParser,
    SimpleIntervalParser, TimePeriodParser, TimePeriodsParser, UpdateIntervalParser,
    ValidationRuleParser,
};
