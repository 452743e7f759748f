//! Address literals
//!
//! [`Ipv4Parser`], [`Ipv6Parser`], the macro-aware [`IpParser`] and
//! [`DnsParser`]. Octets are always read as decimal, so `010.0.0.1` is
//! `10.0.0.1`, not an octal value.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::char_class::CharClass;
use super::config::ParserConfig;
use super::macros::{scan_builtin_macro, scan_lld_macro, scan_user_macro, MacroKind, UserMacroOptions};
use super::protocol::{Parsed, TokenParser};
use super::scan::{run, Scanner};

const MAX_GROUPS: usize = 8;

/// Up to three decimal digits, at most 255
fn scan_octet(sc: &Scanner<'_>, pos: usize) -> Option<(usize, u8)> {
    let run_end = sc.skip_digits(pos);
    let end = run_end.min(pos + 3);
    if end == pos {
        return None;
    }
    let value: u16 = sc.slice(pos, end).parse().ok()?;
    u8::try_from(value).ok().map(|octet| (end, octet))
}

pub(crate) fn scan_ipv4(sc: &Scanner<'_>, pos: usize) -> Option<(usize, Ipv4Addr)> {
    let mut octets = [0u8; 4];
    let mut p = pos;
    for (i, octet) in octets.iter_mut().enumerate() {
        if i > 0 {
            if !sc.is(p, b'.') {
                return None;
            }
            p += 1;
        }
        let (end, value) = scan_octet(sc, p)?;
        *octet = value;
        p = end;
    }
    Some((p, Ipv4Addr::from(octets)))
}

/// One to four hex digits; a longer run is malformed
fn scan_group(sc: &Scanner<'_>, pos: usize) -> Option<(usize, u16)> {
    let end = sc.skip_while(pos, CharClass::HexDigit);
    if end == pos || end - pos > 4 {
        return None;
    }
    u16::from_str_radix(sc.slice(pos, end), 16)
        .ok()
        .map(|group| (end, group))
}

pub(crate) fn scan_ipv6(sc: &Scanner<'_>, pos: usize) -> Option<(usize, Ipv6Addr)> {
    let mut head: Vec<u16> = Vec::with_capacity(MAX_GROUPS);
    let mut tail: Vec<u16> = Vec::new();
    let mut compressed = false;
    let mut p = pos;

    if sc.starts_with(p, "::") {
        compressed = true;
        p += 2;
    }

    loop {
        let count = head.len() + tail.len();
        let groups = if compressed { &mut tail } else { &mut head };

        if (compressed && count <= 5) || (!compressed && count == 6) {
            if let Some((end, v4)) = scan_ipv4(sc, p) {
                let [a, b, c, d] = v4.octets();
                groups.push(u16::from_be_bytes([a, b]));
                groups.push(u16::from_be_bytes([c, d]));
                p = end;
                break;
            }
        }

        let Some((end, group)) = scan_group(sc, p) else {
            if sc.is_class(p, CharClass::HexDigit) {
                return None;
            }
            break;
        };
        groups.push(group);
        p = end;

        if count + 1 == MAX_GROUPS {
            break;
        }
        if !compressed && sc.starts_with(p, "::") {
            compressed = true;
            p += 2;
            continue;
        }
        if sc.is(p, b':') && sc.is_class(p + 1, CharClass::HexDigit) {
            p += 1;
            continue;
        }
        break;
    }

    let count = head.len() + tail.len();
    if p == pos || (compressed && count > MAX_GROUPS - 1) || (!compressed && count != MAX_GROUPS) {
        return None;
    }

    let mut segments = [0u16; MAX_GROUPS];
    segments[..head.len()].copy_from_slice(&head);
    segments[MAX_GROUPS - tail.len()..].copy_from_slice(&tail);
    Some((p, Ipv6Addr::from(segments)))
}

/// Dotted-quad IPv4 address
#[derive(Debug, Clone, Default)]
pub struct Ipv4Parser {
    config: ParserConfig,
}

impl Ipv4Parser {
    /// Create an IPv4 parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for Ipv4Parser {
    type Output = Option<Ipv4Addr>;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Option<Ipv4Addr>> {
        run(source, pos, &self.config, |sc, pos| {
            scan_ipv4(sc, pos).map(|(end, addr)| (end, Some(addr)))
        })
    }
}

/// IPv6 address with `::` compression and an optional IPv4 tail
#[derive(Debug, Clone, Default)]
pub struct Ipv6Parser {
    config: ParserConfig,
}

impl Ipv6Parser {
    /// Create an IPv6 parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl TokenParser for Ipv6Parser {
    type Output = Option<Ipv6Addr>;

    fn parse(&self, source: &str, pos: usize) -> Parsed<Option<Ipv6Addr>> {
        run(source, pos, &self.config, |sc, pos| {
            scan_ipv6(sc, pos).map(|(end, addr)| (end, Some(addr)))
        })
    }
}

// ============================================================================
// Macro-aware address and host name
// ============================================================================

/// Options for [`IpParser`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IpOptions {
    /// Accept IPv6 addresses
    pub v6: bool,
    /// Accept `{$NAME}`
    pub usermacros: bool,
    /// Accept `{#NAME}`
    pub lldmacros: bool,
    /// Accepted built-in macros, e.g. `{HOST.IP}`
    pub macros: Vec<String>,
}

/// An address or a macro standing in for one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IpAddress {
    /// Parsed address, absent when a macro matched
    pub addr: Option<IpAddr>,
    /// Macro grammar that matched instead of an address
    pub macro_kind: Option<MacroKind>,
}

fn scan_address_macro(
    sc: &Scanner<'_>,
    pos: usize,
    usermacros: bool,
    lldmacros: bool,
    macros: &[String],
) -> Option<(usize, MacroKind)> {
    if usermacros {
        if let Some((end, _)) = scan_user_macro(sc, pos, &UserMacroOptions::default()) {
            return Some((end, MacroKind::User));
        }
    }
    if lldmacros {
        if let Some((end, _)) = scan_lld_macro(sc, pos) {
            return Some((end, MacroKind::Lld));
        }
    }
    scan_builtin_macro(sc, pos, macros, &[]).map(|(end, _)| (end, MacroKind::Builtin))
}

/// IPv4, optionally IPv6, or a macro, tried in that order after the macros
#[derive(Debug, Clone, Default)]
pub struct IpParser {
    options: IpOptions,
    config: ParserConfig,
}

impl IpParser {
    /// Create an address parser
    pub fn new(options: IpOptions) -> Self {
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

impl TokenParser for IpParser {
    type Output = IpAddress;

    fn parse(&self, source: &str, pos: usize) -> Parsed<IpAddress> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            if let Some((end, kind)) =
                scan_address_macro(sc, pos, options.usermacros, options.lldmacros, &options.macros)
            {
                return Some((
                    end,
                    IpAddress {
                        addr: None,
                        macro_kind: Some(kind),
                    },
                ));
            }

            let address = scan_ipv4(sc, pos)
                .map(|(end, a)| (end, IpAddr::V4(a)))
                .or_else(|| {
                    options
                        .v6
                        .then(|| scan_ipv6(sc, pos))
                        .flatten()
                        .map(|(end, a)| (end, IpAddr::V6(a)))
                })?;

            Some((
                address.0,
                IpAddress {
                    addr: Some(address.1),
                    macro_kind: None,
                },
            ))
        })
    }
}

/// Options for [`DnsParser`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DnsOptions {
    /// Accept `{$NAME}`
    pub usermacros: bool,
    /// Accept `{#NAME}`
    pub lldmacros: bool,
    /// Accepted built-in macros, e.g. `{HOST.DNS}`
    pub macros: Vec<String>,
}

/// A DNS name or a macro standing in for one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DnsName {
    /// Name as written
    pub name: String,
    /// Macro grammar that matched instead of a name
    pub macro_kind: Option<MacroKind>,
}

/// `[0-9a-zA-Z_.-]+` or a macro
#[derive(Debug, Clone, Default)]
pub struct DnsParser {
    options: DnsOptions,
    config: ParserConfig,
}

impl DnsParser {
    /// Create a DNS name parser
    pub fn new(options: DnsOptions) -> Self {
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

impl TokenParser for DnsParser {
    type Output = DnsName;

    fn parse(&self, source: &str, pos: usize) -> Parsed<DnsName> {
        let options = &self.options;
        run(source, pos, &self.config, |sc, pos| {
            let (end, macro_kind) =
                match scan_address_macro(sc, pos, options.usermacros, options.lldmacros, &options.macros) {
                    Some((end, kind)) => (end, Some(kind)),
                    None => {
                        let end = sc.skip_while(pos, CharClass::ItemKey);
                        (end > pos).then_some((end, None))?
                    }
                };
            Some((
                end,
                DnsName {
                    name: sc.slice(pos, end).to_string(),
                    macro_kind,
                },
            ))
        })
    }
}
