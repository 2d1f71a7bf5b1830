use std::{
    fmt,
    net::{AddrParseError, Ipv4Addr},
    num::ParseIntError,
    str::FromStr,
};

use thiserror::Error;

use super::{Ipv4Mask, PrefixLenError};

/// Historical class of an IPv4 address, derived from its leading bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpClass {
    A,
    B,
    C,
    D,
    E,
}

impl IpClass {
    #[must_use]
    pub fn of(addr: Ipv4Addr) -> IpClass {
        match u32::from(addr) {
            0x0000_0000..=0x7fff_ffff => IpClass::A,
            0x8000_0000..=0xbfff_ffff => IpClass::B,
            0xc000_0000..=0xdfff_ffff => IpClass::C,
            0xe000_0000..=0xefff_ffff => IpClass::D,
            _ => IpClass::E,
        }
    }

    /// Default prefix length assigned to networks of this class.
    #[must_use]
    pub const fn prefix_len(self) -> u8 {
        match self {
            IpClass::A => 8,
            IpClass::B => 16,
            IpClass::C => 24,
            IpClass::D | IpClass::E => 32,
        }
    }

    #[must_use]
    pub const fn mask(self) -> Ipv4Mask {
        match self {
            IpClass::A => Ipv4Mask::from_bits(0xff00_0000),
            IpClass::B => Ipv4Mask::from_bits(0xffff_0000),
            IpClass::C => Ipv4Mask::from_bits(0xffff_ff00),
            IpClass::D | IpClass::E => Ipv4Mask::from_bits(0xffff_ffff),
        }
    }
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Classful helpers for [`Ipv4Addr`].
pub trait Ipv4AddrExt {
    fn class(&self) -> IpClass;
    fn class_prefix_len(&self) -> u8;
    fn class_mask(&self) -> Ipv4Mask;
}

impl Ipv4AddrExt for Ipv4Addr {
    fn class(&self) -> IpClass {
        IpClass::of(*self)
    }

    fn class_prefix_len(&self) -> u8 {
        self.class().prefix_len()
    }

    fn class_mask(&self) -> Ipv4Mask {
        self.class().mask()
    }
}

/// Parses a dotted-quad address, accepting denormalized octets.
///
/// Each of the four components is read as a decimal integer and reduced
/// to its low 8 bits, so leading zeros and overlong values are tolerated:
/// `"010.200.002.10"` parses to `10.200.2.10`.
pub fn parse_lenient(s: &str) -> Result<Ipv4Addr, Ipv4FormatError> {
    let octets = s.split('.').collect::<Vec<_>>();
    if octets.len() != 4 {
        return Err(Ipv4FormatError::WrongOctetCount(octets.len()));
    }
    let mut bytes = [0; 4];
    for (i, octet) in octets.iter().enumerate() {
        bytes[i] = octet.parse::<u32>()? as u8;
    }
    Ok(Ipv4Addr::from(bytes))
}

/// Parses a dotted-quad address, rejecting anything non-canonical.
pub fn parse_strict(s: &str) -> Result<Ipv4Addr, Ipv4FormatError> {
    Ok(Ipv4Addr::from_str(s)?)
}

/// Rewrites an address in canonical dotted-quad form.
pub fn normalize(s: &str) -> Result<String, Ipv4FormatError> {
    Ok(parse_lenient(s)?.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ipv4FormatError {
    #[error("expected 4 dot-separated octets, found {0}")]
    WrongOctetCount(usize),
    #[error("invalid octet: {0}")]
    InvalidOctet(#[from] ParseIntError),
    #[error("invalid address: {0}")]
    InvalidAddr(#[from] AddrParseError),
    #[error("invalid prefix length: {0}")]
    InvalidPrefix(ParseIntError),
    #[error(transparent)]
    PrefixLen(#[from] PrefixLenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsing_tolerates_denormalized_octets() {
        assert_eq!(
            parse_lenient("010.200.002.10").unwrap(),
            Ipv4Addr::new(10, 200, 2, 10)
        );
        assert_eq!(
            parse_lenient("192.168.5.195").unwrap(),
            Ipv4Addr::new(192, 168, 5, 195)
        );
        // overlong octets wrap to their low 8 bits
        assert_eq!(
            parse_lenient("312.0.0.1").unwrap(),
            Ipv4Addr::new(56, 0, 0, 1)
        );
    }

    #[test]
    fn lenient_parsing_rejects_malformed_input() {
        assert_eq!(
            parse_lenient("10.200.2"),
            Err(Ipv4FormatError::WrongOctetCount(3))
        );
        assert_eq!(
            parse_lenient("10.200.2.10.4"),
            Err(Ipv4FormatError::WrongOctetCount(5))
        );
        assert!(matches!(
            parse_lenient("10.200.x.10"),
            Err(Ipv4FormatError::InvalidOctet(_))
        ));
        assert!(matches!(
            parse_lenient("10.200.-2.10"),
            Err(Ipv4FormatError::InvalidOctet(_))
        ));
    }

    #[test]
    fn strict_parsing_rejects_denormalized_octets() {
        assert_eq!(
            parse_strict("10.200.2.10").unwrap(),
            Ipv4Addr::new(10, 200, 2, 10)
        );
        assert!(matches!(
            parse_strict("010.200.002.10"),
            Err(Ipv4FormatError::InvalidAddr(_))
        ));
        assert!(matches!(
            parse_strict("312.0.0.1"),
            Err(Ipv4FormatError::InvalidAddr(_))
        ));
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize("010.200.002.10").unwrap(), "10.200.2.10");
        assert_eq!(normalize("0.0.0.0").unwrap(), "0.0.0.0");
    }

    #[test]
    fn integer_conversion() {
        let addr = parse_lenient("010.200.002.10").unwrap();
        assert_eq!(u32::from(addr), 180_879_882);
        assert_eq!(
            Ipv4Addr::from(3_232_236_995).to_string(),
            "192.168.5.195"
        );
    }
}
