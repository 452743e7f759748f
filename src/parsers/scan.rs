//! Byte-level scanning shared by all grammars
//!
//! A [`Scanner`] wraps one source string for the duration of a single
//! `parse` call. Grammar functions take `&mut Scanner` plus a byte offset
//! and return `Option<(end, data)>`; the scanner carries the recursion depth
//! counter and at most one diagnostic, so nothing survives between calls.

use memchr::{memchr, memchr2};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::error::ParseError;
use super::protocol::{valid_start, Parsed};

/// Per-call scanning state
pub(crate) struct Scanner<'s> {
    src: &'s str,
    bytes: &'s [u8],
    depth: usize,
    max_depth: usize,
    overflow: Option<ParseError>,
    diagnostic: Option<ParseError>,
}

impl<'s> Scanner<'s> {
    pub(crate) fn new(src: &'s str, config: &ParserConfig) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            depth: 0,
            max_depth: config.max_recursion_depth,
            overflow: None,
            diagnostic: None,
        }
    }

    #[inline]
    pub(crate) fn src(&self) -> &'s str {
        self.src
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'s str {
        &self.src[start..end]
    }

    #[inline]
    pub(crate) fn at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    #[inline]
    pub(crate) fn is(&self, pos: usize, b: u8) -> bool {
        self.bytes.get(pos) == Some(&b)
    }

    #[inline]
    pub(crate) fn is_class(&self, pos: usize, class: CharClass) -> bool {
        self.at(pos).is_some_and(|b| class.matches(b))
    }

    #[inline]
    pub(crate) fn starts_with(&self, pos: usize, prefix: &str) -> bool {
        self.bytes
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(prefix.as_bytes()))
    }

    /// Skip ASCII spaces only
    #[inline]
    pub(crate) fn skip_spaces(&self, pos: usize) -> usize {
        self.skip_bytes(pos, |b| b == b' ')
    }

    /// Skip spaces, tabs and line breaks
    #[inline]
    pub(crate) fn skip_whitespace(&self, pos: usize) -> usize {
        self.skip_while(pos, CharClass::Whitespace)
    }

    #[inline]
    pub(crate) fn skip_while(&self, pos: usize, class: CharClass) -> usize {
        self.skip_bytes(pos, class.predicate())
    }

    #[inline]
    pub(crate) fn skip_digits(&self, pos: usize) -> usize {
        self.skip_while(pos, CharClass::Digit)
    }

    /// Skip all bytes matching a predicate, returning the new position
    pub(crate) fn skip_bytes<F: Fn(u8) -> bool>(&self, pos: usize, predicate: F) -> usize {
        let mut current = pos;
        while current < self.bytes.len() && predicate(self.bytes[current]) {
            current += 1;
        }
        current
    }

    /// Position of the next `needle` at or after `pos`
    #[inline]
    pub(crate) fn find(&self, pos: usize, needle: u8) -> Option<usize> {
        let rest = self.bytes.get(pos..)?;
        memchr(needle, rest).map(|i| pos + i)
    }

    /// Position of the next `a` or `b` at or after `pos`
    #[inline]
    pub(crate) fn find_either(&self, pos: usize, a: u8, b: u8) -> Option<usize> {
        let rest = self.bytes.get(pos..)?;
        memchr2(a, b, rest).map(|i| pos + i)
    }

    /// Double-quoted string where only `\"` and `\\` are escapes
    ///
    /// Returns the offset just past the closing quote.
    pub(crate) fn quoted(&self, pos: usize) -> Option<usize> {
        if !self.is(pos, b'"') {
            return None;
        }
        let mut p = pos + 1;
        loop {
            p = self.find_either(p, b'"', b'\\')?;
            if self.bytes[p] == b'"' {
                return Some(p + 1);
            }
            match self.at(p + 1) {
                Some(b'"') | Some(b'\\') => p += 2,
                _ => return None,
            }
        }
    }

    /// Run a recursive sub-grammar one level deeper
    ///
    /// Once the depth limit is hit every further call fails, and [`run`]
    /// turns the whole parse into a failure carrying the limit error.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.overflow.is_some() {
            return None;
        }

        self.depth += 1;
        if self.max_depth > 0 && self.depth > self.max_depth {
            log_debug!(
                "recursion limit hit: depth {} > {}",
                self.depth,
                self.max_depth
            );
            self.overflow = Some(ParseError::RecursionLimitExceeded {
                depth: self.depth,
                max_depth: self.max_depth,
            });
            self.depth -= 1;
            return None;
        }

        let result = f(self);
        self.depth -= 1;

        if self.overflow.is_some() {
            None
        } else {
            result
        }
    }

    /// The depth limit error, if [`nested`](Self::nested) hit it
    pub(crate) fn take_overflow(&mut self) -> Option<ParseError> {
        self.overflow.take()
    }

    /// Record a diagnostic, replacing any earlier one
    pub(crate) fn report(&mut self, error: ParseError) {
        self.diagnostic = Some(error);
    }

    pub(crate) fn take_diagnostic(&mut self) -> Option<ParseError> {
        self.diagnostic.take()
    }
}

/// Strip the quotes and `\"` / `\\` escapes from a quoted literal
pub(crate) fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\\')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Drive one grammar function through the shared protocol
///
/// Checks the input size and start offset, runs `grammar`, and converts its
/// `Option<(end, data)>` into a [`Parsed`]. Empty matches count as failures.
pub(crate) fn run<T, F>(source: &str, pos: usize, config: &ParserConfig, grammar: F) -> Parsed<T>
where
    T: Default,
    F: FnOnce(&mut Scanner<'_>, usize) -> Option<(usize, T)>,
{
    if config.max_input_size > 0 && source.len() > config.max_input_size {
        log_debug!(
            "input of {} bytes rejected, limit {}",
            source.len(),
            config.max_input_size
        );
        return Parsed::fail_with(
            pos,
            ParseError::InputTooLarge {
                input_size: source.len(),
                max_size: config.max_input_size,
            },
        );
    }

    if !valid_start(source, pos) {
        return Parsed::fail(pos);
    }

    let mut scanner = Scanner::new(source, config);
    let outcome = grammar(&mut scanner, pos);

    if let Some(error) = scanner.take_overflow() {
        return Parsed::fail_with(pos, error);
    }

    match outcome {
        Some((end, data)) if end > pos => {
            let parsed = Parsed::matched(source, pos, end, data);
            match scanner.take_diagnostic() {
                Some(error) => parsed.with_error(error),
                None => parsed,
            }
        }
        _ => match scanner.take_diagnostic() {
            Some(error) => Parsed::fail_with(pos, error),
            None => Parsed::fail(pos),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::protocol::ParseStatus;

    fn scanner(src: &str) -> Scanner<'_> {
        Scanner::new(src, &ParserConfig::default())
    }

    #[test]
    fn test_quoted() {
        let sc = scanner(r#""a\"b" rest"#);
        assert_eq!(sc.quoted(0), Some(6));

        let sc = scanner(r#""a\nb""#);
        assert_eq!(sc.quoted(0), None);

        let sc = scanner(r#""open"#);
        assert_eq!(sc.quoted(0), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a\"b\\c""#), r#"a"b\c"#);
        assert_eq!(unquote(r#""""#), "");
    }

    #[test]
    fn test_nested_depth_limit() {
        let config = ParserConfig::new().with_max_recursion_depth(2);
        let mut sc = Scanner::new("x", &config);

        fn descend(sc: &mut Scanner<'_>, levels: usize) -> Option<()> {
            if levels == 0 {
                return Some(());
            }
            sc.nested(|sc| descend(sc, levels - 1))
        }

        assert!(descend(&mut sc, 2).is_some());
        assert!(descend(&mut sc, 3).is_none());
        assert!(matches!(
            sc.take_overflow(),
            Some(ParseError::RecursionLimitExceeded { max_depth: 2, .. })
        ));
        assert!(sc.take_overflow().is_none());
    }

    #[test]
    fn test_run_keeps_reported_diagnostic() {
        let parsed: Parsed<()> = run("abc", 0, &ParserConfig::default(), |sc, _| {
            sc.report(ParseError::incorrect_syntax(sc.src(), 1));
            None
        });
        assert!(parsed.is_fail());
        assert_eq!(parsed.error().and_then(ParseError::position), Some(1));
    }

    #[test]
    fn test_run_rejects_empty_match() {
        let parsed: Parsed<()> = run("abc", 0, &ParserConfig::default(), |_, pos| Some((pos, ())));
        assert_eq!(parsed.status(), ParseStatus::Fail);
    }

    #[test]
    fn test_run_input_limit() {
        let config = ParserConfig::new().with_max_input_size(2);
        let parsed: Parsed<()> = run("abc", 0, &config, |_, _| Some((3, ())));
        assert!(matches!(
            parsed.error(),
            Some(ParseError::InputTooLarge { input_size: 3, .. })
        ));
    }
}
