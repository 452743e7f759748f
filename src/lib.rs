//! Monexpr - Composable parsers for monitoring configuration expressions
//!
//! Recognises the tokens that appear inside monitoring configuration strings:
//! - Macro references (`{HOST.NAME}`, `{$USER}`, `{#LLD}`, `{{#LLD}.func()}`)
//! - Item keys, function calls and `/host/key` queries
//! - Trigger expressions and `{?expr}` expression macros
//! - Condition formulas (`A and not B`) and filter formulas
//! - Address, port, date and interval literals
//! - Validation-rule strings (`fatal|required|in 1,2,3`)
//!
//! Every parser starts at an arbitrary byte offset and reports whether it
//! consumed the rest of the input (`Success`), stopped early
//! (`SuccessContinue`) or found nothing (`Fail`).
//!
//! ## Quick Start
//!
//! ```rust
//! use monexpr::prelude::*;
//!
//! let parser = FunctionMacroParser::new();
//! let result = parser.parse("{host:item.func()} = 0", 0);
//!
//! assert_eq!(result.status(), ParseStatus::SuccessContinue);
//! assert_eq!(result.get_match(), "{host:item.func()}");
//! assert_eq!(result.data().host, "host");
//! assert_eq!(result.data().function, "func()");
//! ```
//!
//! ## Diagnostics
//!
//! ```rust
//! use monexpr::prelude::*;
//!
//! let result = ValidationRuleParser::new().parse("fatal|required|fatal", 0);
//!
//! assert!(result.is_fail());
//! assert_eq!(
//!     result.error().map(|e| e.to_string()).as_deref(),
//!     Some("Validation rule \"fatal\" already exists.")
//! );
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

// Prelude module for convenient imports
pub mod prelude;

pub mod parsers;

/// Re-export commonly used types for convenience
pub use parsers::{ParseError, ParseStatus, Parsed, ParserConfig, TokenParser};
