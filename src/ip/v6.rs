use std::{
    fmt,
    net::{AddrParseError, Ipv4Addr, Ipv6Addr},
    num::ParseIntError,
    str::FromStr,
};

use thiserror::Error;

use super::PrefixLenError;
use crate::iface::MacAddress;

/// Coarse classification of an IPv6 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ipv6AddrKind {
    UniqueLocal,
    LinkLocal,
    Loopback,
    Unclassified,
}

impl Ipv6AddrKind {
    #[must_use]
    pub fn of(addr: Ipv6Addr) -> Ipv6AddrKind {
        let octets = addr.octets();
        if octets[0] & 0xfe == 0xfc {
            Ipv6AddrKind::UniqueLocal
        } else if octets[0] == 0xfe && octets[1] & 0xc0 == 0x80 {
            Ipv6AddrKind::LinkLocal
        } else if addr == Ipv6Addr::LOCALHOST {
            Ipv6AddrKind::Loopback
        } else {
            Ipv6AddrKind::Unclassified
        }
    }
}

impl fmt::Display for Ipv6AddrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Ipv6AddrKind::UniqueLocal => "unique-local",
            Ipv6AddrKind::LinkLocal => "link-local",
            Ipv6AddrKind::Loopback => "loopback",
            Ipv6AddrKind::Unclassified => "unclassified",
        };
        write!(f, "{kind}")
    }
}

/// Classification and text-form helpers for [`Ipv6Addr`].
pub trait Ipv6AddrExt {
    fn kind(&self) -> Ipv6AddrKind;
    fn expanded(&self) -> String;
}

impl Ipv6AddrExt for Ipv6Addr {
    fn kind(&self) -> Ipv6AddrKind {
        Ipv6AddrKind::of(*self)
    }

    fn expanded(&self) -> String {
        let s = self.segments();
        format!(
            "{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}:{:04x}",
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]
        )
    }
}

/// Rewrites an IPv6 literal in canonical compressed form.
pub fn compress(s: &str) -> Result<String, Ipv6FormatError> {
    let addr: Ipv6Addr = s.parse()?;
    Ok(addr.to_string())
}

/// Rewrites an IPv6 literal with all eight groups written out.
pub fn expand(s: &str) -> Result<String, Ipv6FormatError> {
    let addr: Ipv6Addr = s.parse()?;
    Ok(addr.expanded())
}

/// Embeds an IPv4 address into its IPv4-mapped form, `::ffff:a.b.c.d`.
#[must_use]
pub fn ipv4_mapped(addr: Ipv4Addr) -> Ipv6Addr {
    addr.to_ipv6_mapped()
}

/// Extracts the IPv4 address embedded in an IPv4-mapped address.
///
/// Anything outside `::ffff:0:0/96`, including IPv4-compatible
/// addresses, is refused.
pub fn extract_ipv4_mapped(addr: Ipv6Addr) -> Result<Ipv4Addr, Ipv6FormatError> {
    addr.to_ipv4_mapped()
        .ok_or(Ipv6FormatError::NotIpv4Mapped(addr))
}

/// Complement of a mask over all 128 bits.
#[must_use]
pub fn wildcard(addr: Ipv6Addr) -> Ipv6Addr {
    Ipv6Addr::from(!u128::from(addr))
}

/// Subnet mask of `len` leading one bits.
pub fn mask_from_prefix(len: u8) -> Result<Ipv6Addr, PrefixLenError> {
    if len > 128 {
        return Err(PrefixLenError);
    }
    Ok(Ipv6Addr::from(prefix_bits(len)))
}

fn prefix_bits(len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        u128::MAX << (128 - len)
    }
}

/// An IPv6 prefix: the leading `len` bits of an address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv6Prefix {
    addr: Ipv6Addr,
    len: u8,
}

impl Ipv6Prefix {
    /// Creates the prefix of the leading `len` bits of `addr`. Bits
    /// beyond the prefix length are cleared.
    pub fn new(addr: Ipv6Addr, len: u8) -> Result<Ipv6Prefix, PrefixLenError> {
        if len > 128 {
            return Err(PrefixLenError);
        }
        let addr = Ipv6Addr::from(u128::from(addr) & prefix_bits(len));
        Ok(Ipv6Prefix { addr, len })
    }

    #[must_use]
    pub const fn addr(&self) -> Ipv6Addr {
        self.addr
    }

    #[must_use]
    pub const fn len(&self) -> u8 {
        self.len
    }

    #[must_use]
    pub fn mask(&self) -> Ipv6Addr {
        Ipv6Addr::from(prefix_bits(self.len))
    }

    #[must_use]
    pub fn contains(&self, addr: Ipv6Addr) -> bool {
        u128::from(addr) & prefix_bits(self.len) == u128::from(self.addr)
    }

    /// Length of the common leading bit run with `other`, capped at the
    /// prefix length.
    #[must_use]
    pub fn common_prefix_len(&self, other: Ipv6Addr) -> usize {
        let xored = u128::from(self.addr) ^ u128::from(other);
        (xored.leading_zeros() as usize).min(self.len as usize)
    }

    /// Combines the prefix with the modified EUI-64 interface
    /// identifier of `mac`.
    ///
    /// The identifier occupies the low 64 bits, so prefixes longer
    /// than /64 are refused.
    pub fn eui64(&self, mac: MacAddress) -> Result<Ipv6Addr, PrefixLenError> {
        if self.len > 64 {
            return Err(PrefixLenError);
        }
        let mut bytes = self.addr.octets();
        bytes[8..].copy_from_slice(&mac.interface_id());
        Ok(Ipv6Addr::from(bytes))
    }
}

impl fmt::Debug for Ipv6Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl fmt::Display for Ipv6Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Ipv6Prefix {
    type Err = Ipv6FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((addr, len)) = s.split_once('/') else {
            return Err(Ipv6FormatError::MissingPrefixLen);
        };
        let addr = addr.parse()?;
        let len = len.parse().map_err(Ipv6FormatError::InvalidPrefixLen)?;
        Ok(Ipv6Prefix::new(addr, len)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ipv6FormatError {
    #[error("invalid address: {0}")]
    InvalidAddr(#[from] AddrParseError),
    #[error("missing prefix length")]
    MissingPrefixLen,
    #[error("invalid prefix length: {0}")]
    InvalidPrefixLen(ParseIntError),
    #[error(transparent)]
    PrefixLen(#[from] PrefixLenError),
    #[error("{0} is not an IPv4-mapped address")]
    NotIpv4Mapped(Ipv6Addr),
}

#[cfg(feature = "serde")]
impl serde::Serialize for Ipv6Prefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Ipv6Prefix {
    fn deserialize<D>(deserializer: D) -> Result<Ipv6Prefix, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
