//! IPv4 address and network matching for allow/deny lists

use crate::error::{Result, ValidateError};
use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;

/// Netmask of an entry that names a single host
pub const HOST_NETMASK: u32 = 0xFFFF_FFFF;

/// Whether a parsed entry names one host or a whole network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Host,
    Network,
}

/// One allow/deny entry: an address with its netmask
///
/// Accepted text forms:
/// - `a.b.c.d`
/// - `a.b.c.d/nn` with `nn` in 0..=32
/// - `a.b.c.d/m.m.m.m`
/// - `any`, shorthand for `0.0.0.0/0`
///
/// Any of them may be prefixed with `!` to invert the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddress {
    text: String,
    address: u32,
    netmask: u32,
    negated: bool,
}

impl IpAddress {
    /// Parse rule text, see [`parse_address`]
    pub fn parse(text: &str) -> Result<Self> {
        parse_address(text)
    }

    /// The rule text this entry was parsed from, whitespace stripped
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn netmask(&self) -> u32 {
        self.netmask
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_single_host(&self) -> bool {
        self.netmask == HOST_NETMASK
    }

    pub fn kind(&self) -> AddressKind {
        if self.is_single_host() {
            AddressKind::Host
        } else {
            AddressKind::Network
        }
    }

    /// CIDR prefix length, or None when the netmask bits are not contiguous
    pub fn prefix_len(&self) -> Option<u8> {
        ipnet::ipv4_mask_to_prefix(Ipv4Addr::from(self.netmask)).ok()
    }

    /// Convert to an `Ipv4Net`, when the netmask has a prefix form
    pub fn to_ipnet(&self) -> Option<Ipv4Net> {
        let prefix = self.prefix_len()?;
        Ipv4Net::new(Ipv4Addr::from(self.address), prefix).ok()
    }

    /// Check an already-parsed address against this entry
    pub fn contains_addr(&self, candidate: Ipv4Addr) -> bool {
        let inside = u32::from(candidate) & self.netmask == self.address & self.netmask;
        inside != self.negated
    }

    /// Check a candidate address given as text
    ///
    /// A malformed candidate never matches, negated entry or not.
    pub fn matches(&self, candidate: &str) -> bool {
        match parse_dotted_quad(candidate.trim()) {
            Some(addr) => self.contains_addr(Ipv4Addr::from(addr)),
            None => false,
        }
    }
}

impl From<Ipv4Net> for IpAddress {
    fn from(net: Ipv4Net) -> Self {
        let mut entry = Self {
            text: String::new(),
            address: u32::from(net.addr()),
            netmask: u32::from(net.netmask()),
            negated: false,
        };
        entry.text = entry.to_string();
        entry
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", Ipv4Addr::from(self.address))?;

        if !self.is_single_host() {
            match self.prefix_len() {
                Some(prefix) => write!(f, "/{}", prefix)?,
                None => write!(f, "/{}", netmask_to_string(self.netmask))?,
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for IpAddress {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s)
    }
}

/// Parse an allow/deny entry
///
/// The returned entry's [`AddressKind`] tells a host apart from a network.
pub fn parse_address(text: &str) -> Result<IpAddress> {
    let trimmed = text.trim();

    let (negated, body) = match trimmed.strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    if body.is_empty() {
        return Err(ValidateError::invalid(text, "empty address"));
    }

    let body = if body.eq_ignore_ascii_case("any") {
        "0.0.0.0/0"
    } else {
        body
    };

    let (addr_part, mask_part) = match body.split_once('/') {
        Some((addr, mask)) => (addr, Some(mask)),
        None => (body, None),
    };

    let address = parse_dotted_quad(addr_part)
        .ok_or_else(|| ValidateError::invalid(text, "address must be a.b.c.d with octets 0-255"))?;

    let netmask = match mask_part {
        None => HOST_NETMASK,
        Some(mask) if mask.contains('.') => parse_dotted_quad(mask).ok_or_else(|| {
            ValidateError::invalid(text, "netmask must be m.m.m.m with octets 0-255")
        })?,
        Some(len) => {
            let prefix = parse_prefix_len(len)
                .ok_or_else(|| ValidateError::invalid(text, "CIDR length must be 0-32"))?;
            prefix_to_netmask(prefix)
        }
    };

    Ok(IpAddress {
        text: trimmed.to_string(),
        address,
        netmask,
        negated,
    })
}

/// Render a netmask as a dotted quad
pub fn netmask_to_string(mask: u32) -> String {
    Ipv4Addr::from(mask).to_string()
}

/// Ordered allow/deny entries, matched with OR semantics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAddressList {
    entries: Vec<IpAddress>,
}

impl IpAddressList {
    /// Create a new empty list
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse every entry, failing on the first malformed one
    pub fn parse_all<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|entry| parse_address(entry.as_ref()))
            .collect()
    }

    pub fn push(&mut self, entry: IpAddress) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IpAddress> {
        self.entries.iter()
    }

    /// True if any entry matches; stops at the first one that does
    pub fn matches_any(&self, candidate: &str) -> bool {
        let addr = match parse_dotted_quad(candidate.trim()) {
            Some(addr) => Ipv4Addr::from(addr),
            None => return false,
        };

        self.entries.iter().any(|entry| entry.contains_addr(addr))
    }
}

impl FromIterator<IpAddress> for IpAddressList {
    fn from_iter<T: IntoIterator<Item = IpAddress>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a IpAddressList {
    type Item = &'a IpAddress;
    type IntoIter = std::slice::Iter<'a, IpAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parse `a.b.c.d` into a host-order integer, first octet in the high byte
fn parse_dotted_quad(s: &str) -> Option<u32> {
    let mut fields = s.split('.');
    let mut value: u32 = 0;

    for _ in 0..4 {
        let octet = parse_octet(fields.next()?)?;
        value = (value << 8) | u32::from(octet);
    }

    if fields.next().is_some() {
        return None;
    }

    Some(value)
}

fn parse_octet(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u8>().ok()
}

fn parse_prefix_len(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u8>().ok().filter(|len| *len <= 32)
}

fn prefix_to_netmask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        HOST_NETMASK << (32 - u32::from(prefix))
    }
}
