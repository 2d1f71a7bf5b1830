use std::{fmt::Display, num::ParseIntError, str::FromStr};

use thiserror::Error;

/// A 48-bit IEEE 802 MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const NULL: MacAddress = MacAddress([0; 6]);
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    #[must_use]
    pub fn gen() -> MacAddress {
        let mut mac = rand::random::<[u8; 6]>();
        mac[0] &= 0b1111_1110;
        MacAddress(mac)
    }

    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        *self == MacAddress::NULL
    }

    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        *self == MacAddress::BROADCAST
    }

    /// Returns the modified EUI-64 interface identifier of this address.
    ///
    /// The universal/local bit of the first octet is inverted and the
    /// two fixed bytes `ff:fe` are inserted between the OUI and the
    /// NIC-specific half.
    #[must_use]
    pub fn interface_id(&self) -> [u8; 8] {
        [
            self.0[0] ^ 0b0000_0010,
            self.0[1],
            self.0[2],
            0xff,
            0xfe,
            self.0[3],
            self.0[4],
            self.0[5],
        ]
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(value: [u8; 6]) -> Self {
        MacAddress(value)
    }
}

impl From<MacAddress> for [u8; 6] {
    fn from(value: MacAddress) -> Self {
        value.0
    }
}

impl FromStr for MacAddress {
    type Err = MacFormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups = s.split(':').collect::<Vec<_>>();
        if groups.len() != 6 {
            return Err(MacFormatError::WrongGroupCount(groups.len()));
        }
        let mut mac = [0; 6];
        for (i, group) in groups.iter().enumerate() {
            mac[i] = u8::from_str_radix(group, 16)?;
        }
        Ok(MacAddress(mac))
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacFormatError {
    #[error("expected 6 colon-separated groups, found {0}")]
    WrongGroupCount(usize),
    #[error("invalid hex group: {0}")]
    InvalidGroup(#[from] ParseIntError),
}

#[cfg(feature = "serde")]
impl serde::Serialize for MacAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MacAddress {
    fn deserialize<D>(deserializer: D) -> Result<MacAddress, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
