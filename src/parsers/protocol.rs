//! Shared Parse Protocol
//!
//! Every parser in this crate exposes the same operation: given a source
//! string and a start offset, consume as much of its grammar as possible and
//! return a [`Parsed`] value describing the consumed span, the grammar's
//! derived fields and a tri-state [`ParseStatus`].
//!
//! # Example
//!
//! ```rust
//! use monexpr::parsers::{LldMacroParser, ParseStatus, TokenParser};
//!
//! let parser = LldMacroParser::new();
//! let result = parser.parse("{#NAME} rest", 0);
//!
//! assert_eq!(result.status(), ParseStatus::SuccessContinue);
//! assert_eq!(result.get_match(), "{#NAME}");
//! assert_eq!(result.length(), 7);
//! ```

use serde::Serialize;

use super::error::ParseError;

/// Outcome of a single `parse` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// No valid token begins at the given offset
    Fail,
    /// A token was recognised and it extends to the end of the source
    Success,
    /// A token was recognised but characters remain after it
    SuccessContinue,
}

impl ParseStatus {
    /// Status for a token spanning `start..end` of a source of `source_len` bytes
    #[inline]
    pub fn for_span(end: usize, source_len: usize) -> Self {
        if end >= source_len {
            ParseStatus::Success
        } else {
            ParseStatus::SuccessContinue
        }
    }

    /// `true` for both success variants
    #[inline]
    pub fn is_match(self) -> bool {
        self != ParseStatus::Fail
    }
}

/// Consumed region of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ParseSpan {
    /// Start byte offset
    pub start: usize,
    /// Number of bytes consumed
    pub length: usize,
}

impl ParseSpan {
    /// Create a span from start/end offsets
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// End byte offset (exclusive)
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// The text this span covers in `source`
    #[inline]
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end()]
    }
}

/// Immutable result of one `parse` call
///
/// Holds the status, the consumed span and matched text, the grammar's
/// derived fields (`data`) and an optional diagnostic. Nothing here refers
/// back to the parser instance, so results can outlive it and parsers can be
/// shared freely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed<T> {
    status: ParseStatus,
    span: ParseSpan,
    #[serde(rename = "match")]
    matched: String,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ParseError>,
}

impl<T: Default> Parsed<T> {
    /// A failed parse at `pos` with empty derived fields
    #[inline]
    pub fn fail(pos: usize) -> Self {
        Self {
            status: ParseStatus::Fail,
            span: ParseSpan {
                start: pos,
                length: 0,
            },
            matched: String::new(),
            data: T::default(),
            error: None,
        }
    }

    /// A failed parse carrying a diagnostic
    #[inline]
    pub fn fail_with(pos: usize, error: ParseError) -> Self {
        Self {
            error: Some(error),
            ..Self::fail(pos)
        }
    }
}

impl<T> Parsed<T> {
    /// A successful parse of `source[start..end]`
    ///
    /// The status is derived from `end` and the source length, so the
    /// status/continuation law holds by construction.
    pub fn matched(source: &str, start: usize, end: usize, data: T) -> Self {
        Self {
            status: ParseStatus::for_span(end, source.len()),
            span: ParseSpan::new(start, end),
            matched: source[start..end].to_string(),
            data,
            error: None,
        }
    }

    /// Attach a diagnostic to a result
    pub fn with_error(mut self, error: ParseError) -> Self {
        self.error = Some(error);
        self
    }

    /// Parse status
    #[inline]
    pub fn status(&self) -> ParseStatus {
        self.status
    }

    /// Consumed span
    #[inline]
    pub fn span(&self) -> ParseSpan {
        self.span
    }

    /// The matched text (empty on failure)
    #[inline]
    pub fn get_match(&self) -> &str {
        &self.matched
    }

    /// Length of the matched text in bytes
    #[inline]
    pub fn length(&self) -> usize {
        self.span.length
    }

    /// Grammar-specific fields
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Take the grammar-specific fields
    #[inline]
    pub fn into_data(self) -> T {
        self.data
    }

    /// Diagnostic, if the parser produced one
    #[inline]
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// `true` if nothing was recognised
    #[inline]
    pub fn is_fail(&self) -> bool {
        self.status == ParseStatus::Fail
    }

    /// `true` if the token spans the rest of the source
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == ParseStatus::Success
    }

    /// Map the derived fields, keeping status, span and diagnostic
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            status: self.status,
            span: self.span,
            matched: self.matched,
            data: f(self.data),
            error: self.error,
        }
    }
}

impl<T: Serialize> Parsed<T> {
    /// Dump the whole result as JSON for consumers outside this crate
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// The uniform parser interface
///
/// Implementations hold only their configuration; every call to
/// [`TokenParser::parse`] builds a fresh [`Parsed`] value.
pub trait TokenParser {
    /// Grammar-specific derived fields
    type Output: Default;

    /// Parse a token starting at byte offset `pos` of `source`
    fn parse(&self, source: &str, pos: usize) -> Parsed<Self::Output>;
}

/// `true` if `pos` can start a token in `source`
#[inline]
pub(crate) fn valid_start(source: &str, pos: usize) -> bool {
    pos < source.len() && source.is_char_boundary(pos)
}
