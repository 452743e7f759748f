//! Names embedded in configuration text
//!
//! - [`HostNameParser`]: technical host names, optionally built from
//!   discovery macros
//! - [`EventNameParser`]: free text carrying `{?expr}` macros
//! - [`AdNameParser`]: Active Directory user names

use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::error::ParseError;
use super::expression::{scan_expression_macro_at, ExpressionMacroOptions, ExpressionOptions};
use super::macros::{scan_lld_macro, scan_macro_function, MacroKind, MacroRef, Receivers};
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

fn macro_ref(sc: &Scanner<'_>, kind: MacroKind, pos: usize, end: usize) -> MacroRef {
    MacroRef {
        kind,
        pos,
        length: end - pos,
        matched: sc.slice(pos, end).to_string(),
    }
}

// ============================================================================
// Host name
// ============================================================================

/// Options for [`HostNameParser`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostNameOptions {
    /// Accept `{#NAME}` and `{{#NAME}.func()}` inside the name
    pub lldmacros: bool,
}

/// A host name and the macros it is built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostName {
    /// Embedded macros in source order
    pub macros: Vec<MacroRef>,
}

/// Runs of `[0-9a-zA-Z_. -]` interleaved with discovery macros
#[derive(Debug, Clone, Default)]
pub struct HostNameParser {
    options: HostNameOptions,
    config: ParserConfig,
}

impl HostNameParser {
    /// Create a host name parser
    pub fn new(options: HostNameOptions) -> Self {
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

impl TokenParser for HostNameParser {
    type Output = HostName;

    fn parse(&self, source: &str, pos: usize) -> Parsed<HostName> {
        let lldmacros = self.options.lldmacros;
        run(source, pos, &self.config, |sc, pos| {
            let receivers = Receivers {
                lld: true,
                ..Receivers::NONE
            };
            let mut host = HostName::default();
            let mut p = pos;

            loop {
                let plain = sc.skip_while(p, CharClass::HostName);
                if plain > p {
                    p = plain;
                    continue;
                }
                if !lldmacros {
                    break;
                }
                if let Some((end, _)) = scan_lld_macro(sc, p) {
                    host.macros.push(macro_ref(sc, MacroKind::Lld, p, end));
                    p = end;
                } else if let Some((end, _)) = scan_macro_function(sc, p, &receivers) {
                    host.macros.push(macro_ref(sc, MacroKind::Function, p, end));
                    p = end;
                } else {
                    break;
                }
            }

            Some((p, host))
        })
    }
}

// ============================================================================
// Event name
// ============================================================================

/// Expression macros found in an event name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventName {
    /// `{?expr}` and `{{?expr}.func()}` occurrences in source order
    pub macros: Vec<MacroRef>,
}

/// Free text; every `{?...}` in it must be a valid expression macro
///
/// The match always runs to the end of the input. A malformed expression
/// macro fails the whole name with an "incorrect expression" diagnostic.
#[derive(Debug, Clone)]
pub struct EventNameParser {
    options: ExpressionOptions,
    config: ParserConfig,
}

impl Default for EventNameParser {
    fn default() -> Self {
        Self::new(ExpressionMacroOptions {
            usermacros: true,
            host_macro: true,
            host_macro_n: true,
            empty_host: true,
            ..ExpressionMacroOptions::default()
        })
    }
}

impl EventNameParser {
    /// Create an event name parser
    pub fn new(options: ExpressionMacroOptions) -> Self {
        Self {
            options: options.expression_options(),
            config: ParserConfig::default(),
        }
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for EventNameParser {
    type Output = EventName;

    fn parse(&self, source: &str, pos: usize) -> Parsed<EventName> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            let receivers = Receivers {
                expression: Some(options),
                ..Receivers::NONE
            };
            let mut name = EventName::default();
            let mut p = pos;

            while let Some(brace) = sc.find(p, b'{') {
                if sc.starts_with(brace, "{{?") {
                    if let Some((end, _)) = scan_macro_function(sc, brace, &receivers) {
                        name.macros.push(macro_ref(sc, MacroKind::Function, brace, end));
                        p = end;
                        continue;
                    }
                    p = brace + 1;
                    continue;
                }

                match scan_expression_macro_at(sc, brace, options) {
                    Ok((end, _)) => {
                        name.macros.push(macro_ref(sc, MacroKind::Expression, brace, end));
                        p = end;
                    }
                    Err(Some(at)) => {
                        log_debug!("malformed expression macro at {} in event name", brace);
                        sc.report(ParseError::incorrect_expression(sc.src(), at));
                        return None;
                    }
                    Err(None) => p = brace + 1,
                }
            }

            Some((sc.len(), name))
        })
    }
}

// ============================================================================
// Active Directory names
// ============================================================================

/// Which Active Directory name format matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdNameType {
    /// No format; as an option, accept either
    #[default]
    Unknown,
    /// `DOMAIN\user`
    SamAccountName,
    /// `user@domain`
    UserPrincipalName,
}

/// Options for [`AdNameParser`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdNameOptions {
    /// Format to accept; `Unknown` tries sAMAccountName, then UPN
    pub nametype: AdNameType,
    /// The name must span the rest of the input
    pub strict: bool,
}

/// User and domain of an Active Directory name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdName {
    /// Format that matched
    pub nametype: AdNameType,
    /// User part
    pub user: String,
    /// Domain part
    pub domain: String,
}

const SAM_DOMAIN_MAX: usize = 15;
const SAM_USER_MAX: usize = 20;

fn sam_domain_byte(b: u8) -> bool {
    b > b' ' && !b"\\/:*?\"<>|".contains(&b)
}

fn sam_user_byte(b: u8) -> bool {
    b > b' ' && !b"\"/\\[]:;|=,+*?<>@".contains(&b)
}

fn upn_user_byte(b: u8) -> bool {
    b > b' ' && b != b'@' && b != b'\\'
}

fn scan_sam_account_name(sc: &Scanner<'_>, pos: usize) -> Option<(usize, AdName)> {
    let domain_end = sc.skip_bytes(pos, sam_domain_byte);
    if domain_end == pos || domain_end - pos > SAM_DOMAIN_MAX || !sc.is(domain_end, b'\\') {
        return None;
    }
    let user_start = domain_end + 1;
    let user_end = sc.skip_bytes(user_start, sam_user_byte);
    if user_end == user_start || user_end - user_start > SAM_USER_MAX {
        return None;
    }
    Some((
        user_end,
        AdName {
            nametype: AdNameType::SamAccountName,
            user: sc.slice(user_start, user_end).to_string(),
            domain: sc.slice(pos, domain_end).to_string(),
        },
    ))
}

fn scan_user_principal_name(sc: &Scanner<'_>, pos: usize) -> Option<(usize, AdName)> {
    let user_end = sc.skip_bytes(pos, upn_user_byte);
    if user_end == pos || !sc.is(user_end, b'@') {
        return None;
    }
    let domain_start = user_end + 1;
    let domain_end = sc.skip_while(domain_start, CharClass::ItemKey);
    if domain_end == domain_start {
        return None;
    }
    Some((
        domain_end,
        AdName {
            nametype: AdNameType::UserPrincipalName,
            user: sc.slice(pos, user_end).to_string(),
            domain: sc.slice(domain_start, domain_end).to_string(),
        },
    ))
}

/// `DOMAIN\user` or `user@domain`
#[derive(Debug, Clone, Default)]
pub struct AdNameParser {
    options: AdNameOptions,
    config: ParserConfig,
}

impl AdNameParser {
    /// Create an Active Directory name parser
    pub fn new(options: AdNameOptions) -> Self {
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

impl TokenParser for AdNameParser {
    type Output = AdName;

    fn parse(&self, source: &str, pos: usize) -> Parsed<AdName> {
        let options = self.options;
        run(source, pos, &self.config, |sc, pos| {
            let sc: &Scanner<'_> = sc;
            let accepts = |kind: AdNameType| options.nametype == AdNameType::Unknown || options.nametype == kind;
            let complete = |found: &(usize, AdName)| !options.strict || found.0 == sc.len();

            let sam = accepts(AdNameType::SamAccountName)
                .then(|| scan_sam_account_name(sc, pos))
                .flatten()
                .filter(complete);
            if sam.is_some() {
                return sam;
            }
            accepts(AdNameType::UserPrincipalName)
                .then(|| scan_user_principal_name(sc, pos))
                .flatten()
                .filter(complete)
        })
    }
}
