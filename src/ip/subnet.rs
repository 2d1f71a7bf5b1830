use std::{fmt, net::Ipv4Addr, str::FromStr};

use super::{parse_lenient, Ipv4AddrExt, Ipv4FormatError, Ipv4Mask};

/// An IPv4 subnet: a network address paired with its mask.
///
/// The mask may be non-contiguous. Such subnets have no CIDR form but
/// behave like any other for membership and host arithmetic.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Subnet {
    network: Ipv4Addr,
    mask: Ipv4Mask,
    hosts: i64,
}

impl Ipv4Subnet {
    /// Creates the subnet containing `addr` under `mask`.
    ///
    /// Host bits of `addr` are cleared, so every member address yields
    /// the same subnet.
    #[must_use]
    pub fn new(addr: Ipv4Addr, mask: Ipv4Mask) -> Ipv4Subnet {
        let network = Ipv4Addr::from(u32::from(addr) & mask.bits());
        Ipv4Subnet {
            network,
            mask,
            hosts: mask.host_count(),
        }
    }

    /// Creates the classful subnet of `addr`.
    #[must_use]
    pub fn from_addr(addr: Ipv4Addr) -> Ipv4Subnet {
        Ipv4Subnet::new(addr, addr.class_mask())
    }

    /// Resolves a textual subnet spec against an optional explicit mask.
    ///
    /// The mask is taken from, in this order: the `mask` argument, a
    /// `/len` suffix on `spec`, or the address class of `spec`. An
    /// explicit mask silently overrides a `/len` suffix.
    pub fn resolve(spec: &str, mask: Option<&str>) -> Result<Ipv4Subnet, Ipv4FormatError> {
        let (addr_part, len_part) = match spec.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (spec, None),
        };
        let addr = parse_lenient(addr_part)?;

        let mask = if let Some(mask) = mask {
            mask.parse::<Ipv4Mask>()?
        } else if let Some(len) = len_part {
            let len = len.parse::<u8>().map_err(Ipv4FormatError::InvalidPrefix)?;
            Ipv4Mask::from_prefix(len)?
        } else {
            addr.class_mask()
        };

        Ok(Ipv4Subnet::new(addr, mask))
    }

    #[must_use]
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    #[must_use]
    pub const fn mask(&self) -> Ipv4Mask {
        self.mask
    }

    #[must_use]
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | self.mask.wildcard().bits())
    }

    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask.bits() == u32::from(self.network)
    }

    /// Number of usable host addresses, which is negative for the
    /// all-ones mask (see [`Ipv4Mask::host_count`]).
    #[must_use]
    pub const fn host_count(&self) -> i64 {
        self.hosts
    }

    #[must_use]
    pub fn prefix_len(&self) -> Option<u8> {
        self.mask.prefix_len()
    }

    /// Returns the CIDR form, if the mask has a prefix length.
    #[must_use]
    pub fn cidr(&self) -> Option<String> {
        self.prefix_len().map(|len| format!("{}/{len}", self.network))
    }
}

impl FromStr for Ipv4Subnet {
    type Err = Ipv4FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4Subnet::resolve(s, None)
    }
}

impl fmt::Debug for Ipv4Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Ipv4Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len() {
            Some(len) => write!(f, "{}/{len}", self.network),
            None => write!(f, "{}", self.network),
        }
    }
}

/// Network address of a textual subnet spec (see [`Ipv4Subnet::resolve`]).
pub fn network_address(spec: &str, mask: Option<&str>) -> Result<Ipv4Addr, Ipv4FormatError> {
    Ok(Ipv4Subnet::resolve(spec, mask)?.network())
}

/// Broadcast address of a textual subnet spec.
pub fn broadcast_address(spec: &str, mask: Option<&str>) -> Result<Ipv4Addr, Ipv4FormatError> {
    Ok(Ipv4Subnet::resolve(spec, mask)?.broadcast())
}

/// Tests whether `addr` lies in the subnet described by `spec` and `mask`.
///
/// Both address arguments are parsed leniently.
pub fn is_in_subnet(addr: &str, spec: &str, mask: Option<&str>) -> Result<bool, Ipv4FormatError> {
    let addr = parse_lenient(addr)?;
    Ok(Ipv4Subnet::resolve(spec, mask)?.contains(addr))
}
