//! Diagnostics for Parsers
//!
//! Structural failures are reported through [`ParseStatus::Fail`] alone.
//! Content errors (a recognised outer shape with invalid content) and
//! resource-limit hits additionally carry a [`ParseError`] whose `Display`
//! output is the user-facing message.
//!
//! All positions stored here are 0-based byte offsets; messages render them
//! 1-based.
//!
//! [`ParseStatus::Fail`]: super::protocol::ParseStatus::Fail

use std::fmt;

use serde::Serialize;

/// Maximum number of characters quoted in an "incorrect syntax near" message
const MAX_CHUNK_CHARS: usize = 50;

/// Error type for parse operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// Generic position-qualified diagnostic
    Unexpected {
        /// What went wrong
        description: String,
        /// Byte offset of the offending character
        position: usize,
    },

    /// A backslash followed by a character outside the approved escape set
    UnescapedCharacter {
        /// Byte offset of the backslash
        position: usize,
    },

    /// Expression grammars quote everything from the failure point on
    IncorrectExpression {
        /// The unparsed remainder
        near: String,
        /// Byte offset where the remainder starts
        position: usize,
    },

    /// Interval grammars quote the rest of the input instead of a position
    IncorrectSyntax {
        /// The unparsed remainder (truncated)
        near: String,
        /// Byte offset where the remainder starts
        position: usize,
    },

    /// Input ended in the middle of a token
    UnexpectedEnd {
        /// Name of the construct that was cut short
        what: String,
    },

    /// The same validation rule appears twice in one rule string
    DuplicateRule {
        /// Rule name
        name: String,
        /// Byte offset of the second occurrence
        position: usize,
    },

    /// A validation-rule clause is unknown or malformed
    InvalidRules {
        /// The whole rule string
        rules: String,
        /// Byte offset of the failing clause
        position: usize,
    },

    /// Recursion depth limit exceeded
    RecursionLimitExceeded {
        /// Depth reached
        depth: usize,
        /// Maximum allowed depth
        max_depth: usize,
    },

    /// Input exceeds maximum allowed size
    InputTooLarge {
        /// Size of the input in bytes
        input_size: usize,
        /// Maximum allowed size
        max_size: usize,
    },
}

impl ParseError {
    /// Create a position-qualified error
    #[inline]
    pub fn unexpected(description: impl Into<String>, position: usize) -> Self {
        ParseError::Unexpected {
            description: description.into(),
            position,
        }
    }

    /// Build an "incorrect syntax near" error quoting `source` from `position`
    pub fn incorrect_syntax(source: &str, position: usize) -> Self {
        if position >= source.len() {
            return ParseError::UnexpectedEnd {
                what: "interval".to_string(),
            };
        }

        let rest = &source[position..];
        let mut near: String = rest.chars().take(MAX_CHUNK_CHARS).collect();
        if near.len() < rest.len() {
            near.push_str(" ...");
        }

        ParseError::IncorrectSyntax { near, position }
    }

    /// Build an "incorrect expression starting from" error
    pub fn incorrect_expression(source: &str, position: usize) -> Self {
        ParseError::IncorrectExpression {
            near: source.get(position..).unwrap_or_default().to_string(),
            position,
        }
    }

    /// 0-based byte offset the error refers to, when it has one
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Unexpected { position, .. }
            | ParseError::UnescapedCharacter { position }
            | ParseError::IncorrectSyntax { position, .. }
            | ParseError::IncorrectExpression { position, .. }
            | ParseError::DuplicateRule { position, .. }
            | ParseError::InvalidRules { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unexpected {
                description,
                position,
            } => write!(f, "{} at position {}", description, position + 1),
            ParseError::UnescapedCharacter { position } => write!(
                f,
                "value contains unescaped character at position {}",
                position + 1
            ),
            ParseError::IncorrectExpression { near, .. } => {
                write!(f, "incorrect expression starting from \"{}\"", near)
            }
            ParseError::IncorrectSyntax { near, .. } => {
                write!(f, "incorrect syntax near \"{}\"", near)
            }
            ParseError::UnexpectedEnd { what } => write!(f, "unexpected end of {}", what),
            ParseError::DuplicateRule { name, .. } => {
                write!(f, "Validation rule \"{}\" already exists.", name)
            }
            ParseError::InvalidRules { rules, position } => write!(
                f,
                "Cannot parse validation rules \"{}\" at position {}.",
                rules,
                position + 1
            ),
            ParseError::RecursionLimitExceeded { depth, max_depth } => write!(
                f,
                "recursion depth {} exceeds maximum of {}",
                depth, max_depth
            ),
            ParseError::InputTooLarge {
                input_size,
                max_size,
            } => write!(
                f,
                "input of {} bytes exceeds maximum of {} bytes",
                input_size, max_size
            ),
        }
    }
}

impl std::error::Error for ParseError {}
