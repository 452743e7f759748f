//! Plain text where `\` may only introduce an approved escape

use serde::Deserialize;

use super::config::ParserConfig;
use super::error::ParseError;
use super::protocol::{Parsed, TokenParser};
use super::scan::run;

/// Options for [`EscapedStringParser`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EscapedStringOptions {
    /// Characters allowed after a backslash
    pub characters: String,
}

impl Default for EscapedStringOptions {
    fn default() -> Self {
        Self {
            characters: "\\".to_string(),
        }
    }
}

/// Consumes the rest of the input, decoding escapes
///
/// A backslash before any other character fails the whole token with
/// [`ParseError::UnescapedCharacter`] at the backslash.
#[derive(Debug, Clone, Default)]
pub struct EscapedStringParser {
    options: EscapedStringOptions,
    config: ParserConfig,
}

impl EscapedStringParser {
    /// Create an escaped-string parser
    pub fn new(options: EscapedStringOptions) -> Self {
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

impl TokenParser for EscapedStringParser {
    /// The text with escapes decoded
    type Output = String;

    fn parse(&self, source: &str, pos: usize) -> Parsed<String> {
        let characters = &self.options.characters;
        run(source, pos, &self.config, |sc, pos| {
            let text = sc.slice(pos, sc.len());
            let mut out = String::with_capacity(text.len());
            let mut chars = text.char_indices();

            while let Some((i, c)) = chars.next() {
                if c != '\\' {
                    out.push(c);
                    continue;
                }
                match chars.next() {
                    Some((_, escaped)) if characters.contains(escaped) => out.push(escaped),
                    _ => {
                        sc.report(ParseError::UnescapedCharacter { position: pos + i });
                        return None;
                    }
                }
            }
            Some((sc.len(), out))
        })
    }
}
