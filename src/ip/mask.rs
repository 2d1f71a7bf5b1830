use std::{fmt, net::Ipv4Addr, str::FromStr};

use thiserror::Error;

use super::Ipv4FormatError;

/// An IPv4 subnet mask over an arbitrary bit pattern.
///
/// Masks are not required to be a contiguous run of leading one bits.
/// A prefix length exists only for masks that are; everything else still
/// supports wildcard, host counting and pool arithmetic.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Mask(u32);

impl Ipv4Mask {
    pub fn from_prefix(len: u8) -> Result<Ipv4Mask, PrefixLenError> {
        if len > 32 {
            return Err(PrefixLenError);
        }
        if len == 0 {
            Ok(Ipv4Mask(0))
        } else {
            Ok(Ipv4Mask(u32::MAX << (32 - len)))
        }
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Ipv4Mask {
        Ipv4Mask(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the prefix length, if the mask is a contiguous run of
    /// leading one bits.
    #[must_use]
    pub fn prefix_len(self) -> Option<u8> {
        if self.is_contiguous() {
            Some(self.0.count_ones() as u8)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_contiguous(self) -> bool {
        self.0.count_ones() == self.0.leading_ones()
    }

    #[must_use]
    pub fn wildcard(self) -> Ipv4Mask {
        Ipv4Mask(!self.0)
    }

    /// Number of usable host addresses under this mask.
    ///
    /// Two bit patterns are reserved for the network and broadcast
    /// addresses, so the all-ones mask yields -1 and a /31 yields 0.
    #[must_use]
    pub fn host_count(self) -> i64 {
        2i64.pow(self.0.count_zeros()) - 2
    }
}

impl From<Ipv4Addr> for Ipv4Mask {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Mask(u32::from(addr))
    }
}

impl From<Ipv4Mask> for Ipv4Addr {
    fn from(mask: Ipv4Mask) -> Self {
        Ipv4Addr::from(mask.0)
    }
}

impl fmt::Debug for Ipv4Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.0))
    }
}

impl fmt::Display for Ipv4Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.0))
    }
}

impl FromStr for Ipv4Mask {
    type Err = Ipv4FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr = Ipv4Addr::from_str(s)?;
        Ok(Ipv4Mask::from(addr))
    }
}

/// Error returned when a prefix length lies outside the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("prefix length out of range")]
pub struct PrefixLenError;

#[cfg(feature = "serde")]
impl serde::Serialize for Ipv4Mask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Ipv4Mask {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4Mask, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
