//! F-SEID Information Element.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::pfcp::ie::{Ie, IeType};

/// Fully qualified SEID: the sender's session endpoint id plus its node
/// address. Flags: bit 0 V6, bit 1 V4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fseid {
    pub seid: u64,
    pub ipv4_address: Option<Ipv4Addr>,
}

impl Fseid {
    pub fn new(seid: u64, ipv4_address: Option<Ipv4Addr>) -> Self {
        Fseid { seid, ipv4_address }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(13);
        data.push(if self.ipv4_address.is_some() { 0b10 } else { 0 });
        data.extend_from_slice(&self.seid.to_be_bytes());
        if let Some(addr) = self.ipv4_address {
            data.extend_from_slice(&addr.octets());
        }
        data
    }

    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        if data.len() < 9 {
            return Err(Error::Protocol("F-SEID needs at least 9 bytes".into()));
        }
        let v4 = data[0] & 0b10 != 0;
        let seid = u64::from_be_bytes(data[1..9].try_into().unwrap());
        let ipv4_address = if v4 {
            if data.len() < 13 {
                return Err(Error::Protocol("F-SEID IPv4 part truncated".into()));
            }
            Some(Ipv4Addr::new(data[9], data[10], data[11], data[12]))
        } else {
            None
        };
        Ok(Fseid { seid, ipv4_address })
    }

    pub fn to_ie(&self) -> Ie {
        Ie::new(IeType::Fseid, self.marshal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_ipv4() {
        let fseid = Fseid::new(0xdeadbeef00112233, Some("10.20.0.5".parse().unwrap()));
        assert_eq!(Fseid::unmarshal(&fseid.marshal()).unwrap(), fseid);
    }

    #[test]
    fn roundtrip_seid_only() {
        let fseid = Fseid::new(42, None);
        let bytes = fseid.marshal();
        assert_eq!(bytes.len(), 9);
        assert_eq!(Fseid::unmarshal(&bytes).unwrap(), fseid);
    }

    #[test]
    fn truncated_ipv4_fails() {
        let fseid = Fseid::new(1, Some("1.2.3.4".parse().unwrap()));
        let bytes = fseid.marshal();
        assert!(Fseid::unmarshal(&bytes[..11]).is_err());
    }
}
