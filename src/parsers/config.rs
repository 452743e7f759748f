//! Resource limits shared by every parser
//!
//! Grammar options (which macro kinds are allowed, which hosts are legal)
//! live in each parser's own options struct. [`ParserConfig`] only bounds
//! how much work a single `parse` call may do.

use serde::Deserialize;

/// Default maximum input size: 1 MiB
pub const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// Default maximum recursion depth for nested grammars
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 64;

/// Limits applied to a single `parse` call
///
/// # Example
///
/// ```rust
/// use monexpr::parsers::config::ParserConfig;
///
/// let config = ParserConfig::new()
///     .with_max_input_size(64 * 1024)
///     .with_max_recursion_depth(16);
///
/// assert_eq!(config.max_recursion_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum allowed source length in bytes (0 = unlimited)
    pub max_input_size: usize,

    /// Maximum nesting of recursive grammars (0 = unlimited)
    pub max_recursion_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum input size
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Set the maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.max_input_size, DEFAULT_MAX_INPUT_SIZE);
        assert_eq!(config.max_recursion_depth, DEFAULT_MAX_RECURSION_DEPTH);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"max_recursion_depth": 8}"#).unwrap();
        assert_eq!(config.max_recursion_depth, 8);
        assert_eq!(config.max_input_size, DEFAULT_MAX_INPUT_SIZE);
    }
}
