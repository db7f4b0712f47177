//! F-TEID IE.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Fully qualified tunnel endpoint: 32-bit TEID plus the owning node's
/// address. Flags: bit 0 V4, bit 1 V6 (only V4 is carried by this core).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fteid {
    pub teid: u32,
    pub ipv4_address: Option<Ipv4Addr>,
}

impl Fteid {
    pub fn new(teid: u32, ipv4_address: Option<Ipv4Addr>) -> Self {
        Fteid { teid, ipv4_address }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(9);
        data.push(if self.ipv4_address.is_some() { 0x01 } else { 0 });
        data.extend_from_slice(&self.teid.to_be_bytes());
        if let Some(addr) = self.ipv4_address {
            data.extend_from_slice(&addr.octets());
        }
        data
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        if payload.len() < 5 {
            return Err(Error::Protocol("F-TEID needs at least 5 bytes".into()));
        }
        let v4 = payload[0] & 0x01 != 0;
        let teid = u32::from_be_bytes(payload[1..5].try_into().unwrap());
        let ipv4_address = if v4 {
            if payload.len() < 9 {
                return Err(Error::Protocol("F-TEID IPv4 part truncated".into()));
            }
            Some(Ipv4Addr::new(payload[5], payload[6], payload[7], payload[8]))
        } else {
            None
        };
        Ok(Fteid { teid, ipv4_address })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Fteid, self.marshal())
    }
}
