//! Per-DNN UE IP pool.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Allocates from a CIDR range, network+1 upward, never the network or
/// broadcast address. Released addresses go onto a free list and are handed
/// out first (most recently released first), which keeps allocation O(1)
/// amortized.
#[derive(Debug)]
pub struct IpPool {
    network: u32,
    broadcast: u32,
    cursor: u32,
    allocated: HashSet<Ipv4Addr>,
    free: Vec<Ipv4Addr>,
}

impl IpPool {
    pub fn new(cidr: &str) -> Result<Self> {
        let (addr, prefix) = cidr
            .split_once('/')
            .ok_or_else(|| Error::InvalidInput(format!("invalid CIDR {cidr:?}")))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid CIDR address in {cidr:?}")))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid CIDR prefix in {cidr:?}")))?;
        if prefix > 30 {
            return Err(Error::InvalidInput(format!(
                "prefix /{prefix} leaves no usable addresses"
            )));
        }

        let mask = !0u32 << (32 - prefix);
        let network = u32::from(addr) & mask;
        let broadcast = network | !mask;
        Ok(IpPool {
            network,
            broadcast,
            cursor: network + 1,
            allocated: HashSet::new(),
            free: Vec::new(),
        })
    }

    pub fn allocate(&mut self) -> Result<Ipv4Addr> {
        if let Some(ip) = self.free.pop() {
            self.allocated.insert(ip);
            return Ok(ip);
        }
        while self.cursor < self.broadcast {
            let ip = Ipv4Addr::from(self.cursor);
            self.cursor += 1;
            if self.allocated.insert(ip) {
                return Ok(ip);
            }
        }
        Err(Error::PoolExhausted("UE IP"))
    }

    pub fn release(&mut self, ip: Ipv4Addr) {
        if self.allocated.remove(&ip) {
            self.free.push(ip);
        }
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    pub fn usable_size(&self) -> u64 {
        (self.broadcast - self.network).saturating_sub(1) as u64
    }

    /// Invariant check used by tests: allocations never include the network
    /// or broadcast address.
    pub fn contains_reserved(&self) -> bool {
        self.allocated.contains(&Ipv4Addr::from(self.network))
            || self.allocated.contains(&Ipv4Addr::from(self.broadcast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_allocation_is_network_plus_one() {
        let mut pool = IpPool::new("10.60.0.0/16").unwrap();
        assert_eq!(pool.allocate().unwrap(), "10.60.0.1".parse::<Ipv4Addr>().unwrap());
        assert_eq!(pool.allocate().unwrap(), "10.60.0.2".parse::<Ipv4Addr>().unwrap());
    }

    #[test]
    fn released_address_is_reused_next() {
        let mut pool = IpPool::new("10.60.0.0/16").unwrap();
        let first = pool.allocate().unwrap();
        pool.allocate().unwrap();
        pool.release(first);
        assert_eq!(pool.allocate().unwrap(), first);
    }

    #[test]
    fn allocate_release_returns_to_prior_state() {
        let mut pool = IpPool::new("10.60.0.0/24").unwrap();
        let before = pool.allocated_count();
        let ip = pool.allocate().unwrap();
        pool.release(ip);
        assert_eq!(pool.allocated_count(), before);
        assert!(!pool.contains_reserved());
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut pool = IpPool::new("10.0.0.0/30").unwrap();
        assert_eq!(pool.usable_size(), 2);
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        let err = pool.allocate().unwrap_err();
        assert!(matches!(err, Error::PoolExhausted(_)));
    }

    #[test]
    fn double_release_does_not_duplicate() {
        let mut pool = IpPool::new("10.0.0.0/30").unwrap();
        let ip = pool.allocate().unwrap();
        pool.release(ip);
        pool.release(ip);
        assert_eq!(pool.allocate().unwrap(), ip);
        // The second free-list entry must not exist.
        assert_ne!(pool.allocate().unwrap(), ip);
    }

    #[test]
    fn invalid_cidrs_are_rejected() {
        assert!(IpPool::new("10.60.0.0").is_err());
        assert!(IpPool::new("bogus/16").is_err());
        assert!(IpPool::new("10.60.0.0/31").is_err());
    }
}
