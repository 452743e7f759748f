//! Character class lookup tables for O(1) membership testing
//!
//! Every grammar in this crate is defined over ASCII character sets (macro
//! names, host names, item keys, function names). Each set is a 256-entry
//! table built at compile time; multi-byte UTF-8 sequences never match any
//! of them.
//!
//! # Example
//!
//! ```rust
//! use monexpr::parsers::char_class::CharClass;
//!
//! assert!(CharClass::MacroName.matches(b'A'));
//! assert!(!CharClass::MacroName.matches(b'a'));
//! assert!(CharClass::HostName.matches(b' '));
//! ```

/// Character sets used by the grammars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Digit: [0-9]
    Digit,
    /// Hex digit: [0-9a-fA-F]
    HexDigit,
    /// Uppercase: [A-Z]
    Upper,
    /// Macro name body: [A-Z0-9_.]
    MacroName,
    /// Host name: [0-9a-zA-Z_. -]
    HostName,
    /// Item key name and DNS name: [0-9a-zA-Z_.-]
    ItemKey,
    /// Function name: [a-z0-9_]
    FunctionName,
    /// Validation-rule identifiers (table and field names): [a-z0-9_]
    Identifier,
    /// Whitespace accepted between expression tokens: [ \t\r\n]
    Whitespace,
}

impl CharClass {
    /// Check if a byte belongs to this class
    #[inline(always)]
    pub fn matches(&self, b: u8) -> bool {
        let table = match self {
            Self::Digit => &CHAR_CLASSES.digit,
            Self::HexDigit => &CHAR_CLASSES.hex_digit,
            Self::Upper => &CHAR_CLASSES.upper,
            Self::MacroName => &CHAR_CLASSES.macro_name,
            Self::HostName => &CHAR_CLASSES.host_name,
            Self::ItemKey => &CHAR_CLASSES.item_key,
            Self::FunctionName | Self::Identifier => &CHAR_CLASSES.function_name,
            Self::Whitespace => &CHAR_CLASSES.whitespace,
        };
        table[b as usize]
    }

    /// Predicate form for bulk scanning
    #[inline]
    pub fn predicate(self) -> impl Fn(u8) -> bool {
        move |b| self.matches(b)
    }
}

/// Pre-computed character class lookup tables
#[derive(Clone, Copy, Debug)]
pub struct CharClassTables {
    /// [0-9]
    pub digit: [bool; 256],
    /// [0-9a-fA-F]
    pub hex_digit: [bool; 256],
    /// [A-Z]
    pub upper: [bool; 256],
    /// [A-Z0-9_.]
    pub macro_name: [bool; 256],
    /// [0-9a-zA-Z_. -]
    pub host_name: [bool; 256],
    /// [0-9a-zA-Z_.-]
    pub item_key: [bool; 256],
    /// [a-z0-9_]
    pub function_name: [bool; 256],
    /// [ \t\r\n]
    pub whitespace: [bool; 256],
}

impl CharClassTables {
    /// Create all character class tables at compile time
    pub const fn new() -> Self {
        let mut tables = Self {
            digit: [false; 256],
            hex_digit: [false; 256],
            upper: [false; 256],
            macro_name: [false; 256],
            host_name: [false; 256],
            item_key: [false; 256],
            function_name: [false; 256],
            whitespace: [false; 256],
        };

        let mut i = b'0';
        while i <= b'9' {
            tables.digit[i as usize] = true;
            tables.hex_digit[i as usize] = true;
            tables.macro_name[i as usize] = true;
            tables.host_name[i as usize] = true;
            tables.item_key[i as usize] = true;
            tables.function_name[i as usize] = true;
            i += 1;
        }

        i = b'a';
        while i <= b'z' {
            tables.host_name[i as usize] = true;
            tables.item_key[i as usize] = true;
            tables.function_name[i as usize] = true;
            if i <= b'f' {
                tables.hex_digit[i as usize] = true;
            }
            i += 1;
        }

        i = b'A';
        while i <= b'Z' {
            tables.upper[i as usize] = true;
            tables.macro_name[i as usize] = true;
            tables.host_name[i as usize] = true;
            tables.item_key[i as usize] = true;
            if i <= b'F' {
                tables.hex_digit[i as usize] = true;
            }
            i += 1;
        }

        tables.macro_name[b'_' as usize] = true;
        tables.macro_name[b'.' as usize] = true;

        tables.host_name[b'_' as usize] = true;
        tables.host_name[b'.' as usize] = true;
        tables.host_name[b' ' as usize] = true;
        tables.host_name[b'-' as usize] = true;

        tables.item_key[b'_' as usize] = true;
        tables.item_key[b'.' as usize] = true;
        tables.item_key[b'-' as usize] = true;

        tables.function_name[b'_' as usize] = true;

        tables.whitespace[b' ' as usize] = true;
        tables.whitespace[b'\t' as usize] = true;
        tables.whitespace[b'\r' as usize] = true;
        tables.whitespace[b'\n' as usize] = true;

        tables
    }
}

impl Default for CharClassTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Global character class tables (computed at compile time)
pub static CHAR_CLASSES: CharClassTables = CharClassTables::new();
