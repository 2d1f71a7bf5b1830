use std::{fmt, net::Ipv4Addr};

use thiserror::Error;

use super::Ipv4Subnet;

/// A pool of host addresses inside an [`Ipv4Subnet`].
///
/// Host patterns are numbered by position: 0 is the network address,
/// `host_count() + 1` the broadcast pattern, and the pool spans an
/// inclusive position range in between. Positions map onto addresses
/// through the mask's zero bits, so the mapping holds for
/// non-contiguous masks where host bits are scattered across octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Pool {
    subnet: Ipv4Subnet,
    // bit value of the k-th zero bit of the mask, ascending
    weights: Vec<u32>,
    first: u32,
    last: u32,
    cursor: Option<u32>,
}

impl Ipv4Pool {
    /// Creates the pool spanning all usable host positions of `subnet`.
    pub fn new(subnet: Ipv4Subnet) -> Result<Ipv4Pool, PoolError> {
        if subnet.host_count() <= 0 {
            return Err(PoolError::EmptyHostRange(subnet));
        }

        let mask = subnet.mask().bits();
        let mut weights = Vec::with_capacity(mask.count_zeros() as usize);
        for bit in 0..32 {
            if mask & (1 << bit) == 0 {
                weights.push(1 << bit);
            }
        }

        let pool = Ipv4Pool {
            subnet,
            weights,
            first: 1,
            last: subnet.host_count() as u32,
            cursor: None,
        };
        log::trace!(
            target: "netlayer/pool",
            "created pool over {} with {} positions",
            pool.subnet,
            pool.len()
        );
        Ok(pool)
    }

    /// Creates a pool bounded by explicit first/last host addresses.
    pub fn with_bounds(
        subnet: Ipv4Subnet,
        first: Option<Ipv4Addr>,
        last: Option<Ipv4Addr>,
    ) -> Result<Ipv4Pool, PoolError> {
        let mut pool = Ipv4Pool::new(subnet)?;
        pool.set_first_addr(first)?;
        pool.set_last_addr(last)?;
        Ok(pool)
    }

    fn host_addr(&self, host: u32) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.subnet.network()) | host)
    }

    // Greedy decomposition of a position against the weight table.
    // The weights are distinct ascending powers of two, so the loop
    // selects exactly the binary digits of the position. A non-zero
    // remainder means the position exceeds the mask's host space.
    fn split_position(&self, position: u32) -> (u32, u32) {
        let mut host = 0;
        let mut rest = position;
        for index in (0..self.weights.len()).rev() {
            let exp = 1u32 << index;
            if rest >= exp {
                host |= self.weights[index];
                rest -= exp;
            }
        }
        (host, rest)
    }

    /// Address at a host position.
    ///
    /// Position 0 resolves to the network address and
    /// `host_count() + 1` to the broadcast pattern; both are
    /// representable here, bound validation happens in the setters.
    pub fn addr_at(&self, position: u32) -> Result<Ipv4Addr, PoolError> {
        let (host, rest) = self.split_position(position);
        if rest > 0 {
            return Err(PoolError::PositionOutOfRange(position));
        }
        Ok(self.host_addr(host))
    }

    /// Host position of an address. Exact inverse of [`Ipv4Pool::addr_at`]
    /// over the subnet's members.
    pub fn position_of(&self, addr: Ipv4Addr) -> Result<u32, PoolError> {
        if !self.subnet.contains(addr) {
            return Err(PoolError::NotInSubnet(addr, self.subnet));
        }

        let mut host = u32::from(addr) & self.subnet.mask().wildcard().bits();
        let mut position = 0u32;
        for index in (0..self.weights.len()).rev() {
            if host >= self.weights[index] {
                position += 1 << index;
                host -= self.weights[index];
            }
        }
        Ok(position)
    }

    /// Sets the first usable address, or restores the default (the
    /// position right after the network address) with `None`.
    pub fn set_first_addr(&mut self, first: Option<Ipv4Addr>) -> Result<(), PoolError> {
        let first_pos = match first {
            None => 1,
            Some(addr) => {
                let pos = self.position_of(addr)?;
                if pos == 0 {
                    return Err(PoolError::NetworkBoundary(addr, self.subnet));
                }
                if pos >= self.last {
                    return Err(PoolError::BoundsOrder {
                        first: pos,
                        last: self.last,
                    });
                }
                pos
            }
        };
        self.first = first_pos;
        log::trace!(
            target: "netlayer/pool",
            "pool over {} now starts at position {}",
            self.subnet,
            self.first
        );
        Ok(())
    }

    /// Sets the last usable address, or restores the default (the
    /// position right before the broadcast pattern) with `None`.
    pub fn set_last_addr(&mut self, last: Option<Ipv4Addr>) -> Result<(), PoolError> {
        let last_pos = match last {
            None => self.subnet.host_count() as u32,
            Some(addr) => {
                let pos = self.position_of(addr)?;
                if i64::from(pos) == self.subnet.host_count() + 1 {
                    return Err(PoolError::BroadcastBoundary(addr, self.subnet));
                }
                if pos <= self.first {
                    return Err(PoolError::BoundsOrder {
                        first: self.first,
                        last: pos,
                    });
                }
                pos
            }
        };
        self.last = last_pos;
        log::trace!(
            target: "netlayer/pool",
            "pool over {} now ends at position {}",
            self.subnet,
            self.last
        );
        Ok(())
    }

    #[must_use]
    pub const fn subnet(&self) -> Ipv4Subnet {
        self.subnet
    }

    #[must_use]
    pub fn first_addr(&self) -> Ipv4Addr {
        // bounds stay within the host space, the remainder is zero
        let (host, _) = self.split_position(self.first);
        self.host_addr(host)
    }

    #[must_use]
    pub fn last_addr(&self) -> Ipv4Addr {
        let (host, _) = self.split_position(self.last);
        self.host_addr(host)
    }

    /// Number of positions in the pool, bounds inclusive.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.last - self.first + 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<u32> {
        self.cursor
    }

    /// Stores a caller-managed iteration cursor. No bounds are enforced.
    pub fn set_cursor(&mut self, cursor: Option<u32>) {
        self.cursor = cursor;
    }

    /// Iterates over the pool's addresses, first to last.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        (self.first..=self.last).map(|pos| {
            let (host, _) = self.split_position(pos);
            self.host_addr(host)
        })
    }
}

impl fmt::Display for Ipv4Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first_addr(), self.last_addr())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("subnet {0} has no usable host addresses")]
    EmptyHostRange(Ipv4Subnet),
    #[error("address {0} not in subnet {1}")]
    NotInSubnet(Ipv4Addr, Ipv4Subnet),
    #[error("address {0} is the network address of {1}")]
    NetworkBoundary(Ipv4Addr, Ipv4Subnet),
    #[error("address {0} is the broadcast address of {1}")]
    BroadcastBoundary(Ipv4Addr, Ipv4Subnet),
    #[error("first position {first} must lie before last position {last}")]
    BoundsOrder { first: u32, last: u32 },
    #[error("position {0} not representable in the pool's subnet")]
    PositionOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_over(spec: &str, mask: Option<&str>) -> Ipv4Pool {
        Ipv4Pool::new(Ipv4Subnet::resolve(spec, mask).unwrap()).unwrap()
    }

    #[test]
    fn default_bounds_cover_all_hosts() {
        let pool = pool_over("192.168.5.0/24", None);
        assert_eq!(pool.first_addr(), Ipv4Addr::new(192, 168, 5, 1));
        assert_eq!(pool.last_addr(), Ipv4Addr::new(192, 168, 5, 254));
        assert_eq!(pool.len(), 254);
        assert!(!pool.is_empty());
        assert_eq!(pool.to_string(), "192.168.5.1-192.168.5.254");
    }

    #[test]
    fn positions_map_onto_addrs() {
        let pool = pool_over("10.0.0.0/8", None);
        assert_eq!(pool.addr_at(1).unwrap(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(pool.addr_at(256).unwrap(), Ipv4Addr::new(10, 0, 1, 0));
        // boundary patterns are representable, only the setters refuse them
        assert_eq!(pool.addr_at(0).unwrap(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(
            pool.addr_at(16_777_215).unwrap(),
            Ipv4Addr::new(10, 255, 255, 255)
        );
    }

    #[test]
    fn position_of_inverts_addr_at() {
        let pool = pool_over("192.168.5.0/28", None);
        for position in 0..=15 {
            let addr = pool.addr_at(position).unwrap();
            assert_eq!(pool.position_of(addr).unwrap(), position);
        }
        assert_eq!(
            pool.addr_at(16),
            Err(PoolError::PositionOutOfRange(16))
        );
    }

    #[test]
    fn scattered_host_bits() {
        // 10.1.0.1/255.255.0.255 scatters its host bits across the
        // third octet
        let pool = pool_over("10.1.0.1", Some("255.255.0.255"));
        assert_eq!(pool.addr_at(1).unwrap(), Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(pool.addr_at(47).unwrap(), Ipv4Addr::new(10, 1, 47, 1));
        assert_eq!(pool.addr_at(255).unwrap(), Ipv4Addr::new(10, 1, 255, 1));
        assert_eq!(pool.addr_at(256), Err(PoolError::PositionOutOfRange(256)));

        assert_eq!(pool.position_of(Ipv4Addr::new(10, 1, 47, 1)).unwrap(), 47);
        assert_eq!(pool.first_addr(), Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(pool.last_addr(), Ipv4Addr::new(10, 1, 254, 1));
        assert_eq!(pool.len(), 254);
    }

    #[test]
    fn membership_is_checked() {
        let pool = pool_over("10.1.0.1", Some("255.255.0.255"));
        // differs in a mask bit, not a host bit
        let outsider = Ipv4Addr::new(10, 1, 47, 2);
        assert_eq!(
            pool.position_of(outsider),
            Err(PoolError::NotInSubnet(outsider, pool.subnet()))
        );
    }

    #[test]
    fn boundary_addrs_are_refused() {
        let mut pool = pool_over("192.168.5.0/24", None);
        assert_eq!(
            pool.set_first_addr(Some(Ipv4Addr::new(192, 168, 5, 0))),
            Err(PoolError::NetworkBoundary(
                Ipv4Addr::new(192, 168, 5, 0),
                pool.subnet()
            ))
        );
        assert_eq!(
            pool.set_last_addr(Some(Ipv4Addr::new(192, 168, 5, 255))),
            Err(PoolError::BroadcastBoundary(
                Ipv4Addr::new(192, 168, 5, 255),
                pool.subnet()
            ))
        );

        let mut pool = pool_over("10.1.0.1", Some("255.255.0.255"));
        assert_eq!(
            pool.set_last_addr(Some(Ipv4Addr::new(10, 1, 255, 1))),
            Err(PoolError::BroadcastBoundary(
                Ipv4Addr::new(10, 1, 255, 1),
                pool.subnet()
            ))
        );
    }

    #[test]
    fn bounds_must_stay_ordered() {
        let mut pool = pool_over("192.168.5.0/24", None);
        pool.set_first_addr(Some(Ipv4Addr::new(192, 168, 5, 100)))
            .unwrap();
        assert_eq!(
            pool.set_last_addr(Some(Ipv4Addr::new(192, 168, 5, 50))),
            Err(PoolError::BoundsOrder {
                first: 100,
                last: 50
            })
        );
        assert_eq!(
            pool.set_first_addr(Some(Ipv4Addr::new(192, 168, 5, 254))),
            Err(PoolError::BoundsOrder {
                first: 254,
                last: 254
            })
        );
    }

    #[test]
    fn bounded_construction() {
        let subnet: Ipv4Subnet = "192.168.5.0/24".parse().unwrap();
        let pool = Ipv4Pool::with_bounds(
            subnet,
            Some(Ipv4Addr::new(192, 168, 5, 10)),
            Some(Ipv4Addr::new(192, 168, 5, 20)),
        )
        .unwrap();
        assert_eq!(pool.len(), 11);
        assert_eq!(pool.first_addr(), Ipv4Addr::new(192, 168, 5, 10));
        assert_eq!(pool.last_addr(), Ipv4Addr::new(192, 168, 5, 20));

        // resetting a bound restores the default
        let mut pool = pool;
        pool.set_first_addr(None).unwrap();
        assert_eq!(pool.first_addr(), Ipv4Addr::new(192, 168, 5, 1));
        pool.set_last_addr(None).unwrap();
        assert_eq!(pool.last_addr(), Ipv4Addr::new(192, 168, 5, 254));
    }

    #[test]
    fn hostless_subnets_are_rejected() {
        for spec in ["10.0.0.0/31", "10.0.0.0/32"] {
            let subnet: Ipv4Subnet = spec.parse().unwrap();
            assert_eq!(
                Ipv4Pool::new(subnet),
                Err(PoolError::EmptyHostRange(subnet))
            );
        }
    }

    #[test]
    fn iteration_respects_bounds() {
        let subnet: Ipv4Subnet = "192.168.5.0/29".parse().unwrap();
        let pool = Ipv4Pool::new(subnet).unwrap();
        let addrs = pool.iter().collect::<Vec<_>>();
        assert_eq!(
            addrs,
            (1..=6)
                .map(|h| Ipv4Addr::new(192, 168, 5, h))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn cursor_is_plain_storage() {
        let mut pool = pool_over("192.168.5.0/24", None);
        assert_eq!(pool.cursor(), None);
        pool.set_cursor(Some(9999));
        assert_eq!(pool.cursor(), Some(9999));
        pool.set_cursor(None);
        assert_eq!(pool.cursor(), None);
    }
}
